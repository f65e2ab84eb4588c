//! Scenario 2: a key removed and a different key added in the same tick
//! show up in that tick's `added`/`removed` delta buffers by value, not by
//! the `KeySet` slot index the removal may have just freed.

use pretty_assertions::assert_eq;
use ts_core::ts::{new_cell, TsCellHandle};
use ts_core::typemeta::{builtin, register_map};
use ts_core::Value;

#[test]
fn remove_a_and_add_b_in_the_same_tick() {
    let schema = register_map(builtin::string_type(), builtin::f64_type());
    let cell = new_cell(&schema, 0);
    {
        let mut guard = cell.write_at(10).unwrap();
        let mut cursor = guard.cursor();
        cursor
            .map_set_item(Value::from_string("a"), Some(Value::from_f64(1.0)))
            .unwrap();
    }
    {
        let mut guard = cell.write_at(11).unwrap();
        let mut cursor = guard.cursor();
        cursor.map_remove(&Value::from_string("a")).unwrap();
        cursor
            .map_set_item(Value::from_string("b"), Some(Value::from_f64(2.0)))
            .unwrap();
    }

    let guard = cell.read_at(11);
    let map = guard.cursor();
    assert_eq!(map.map_added(), &[Value::from_string("b")]);
    assert_eq!(map.map_removed(), &[Value::from_string("a")]);
    assert_eq!(map.value().as_map().unwrap().size(), 1);
    assert!(!map.value().as_map().unwrap().contains(&Value::from_string("a")));
    assert!(map.value().as_map().unwrap().contains(&Value::from_string("b")));
}
