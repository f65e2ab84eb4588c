//! Scenario 3: adding the same value to a set twice in one tick is
//! idempotent at both the value layer (size stays 1) and the delta layer
//! (one `added` entry, not two).

use pretty_assertions::assert_eq;
use ts_core::ts::{new_cell, TsCellHandle};
use ts_core::typemeta::{builtin, register_set};
use ts_core::Value;

#[test]
fn adding_the_same_value_twice_records_one_delta() {
    let schema = register_set(builtin::i64_type());
    let cell = new_cell(&schema, 0);
    {
        let mut guard = cell.write_at(5).unwrap();
        let mut cursor = guard.cursor();
        cursor.set_add(Value::from_i64(7)).unwrap();
        cursor.set_add(Value::from_i64(7)).unwrap();
    }

    let guard = cell.read_at(5);
    let set = guard.cursor();
    assert_eq!(set.value().as_set().unwrap().size(), 1);
    assert_eq!(set.set_added(), &[Value::from_i64(7)]);
    assert!(set.set_contains(&Value::from_i64(7)));
}
