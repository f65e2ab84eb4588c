//! Scenario 6: a capacity-3 window pushed four times evicts its oldest
//! sample on the fourth push; the view exposes both the current value and
//! this tick's eviction.

use pretty_assertions::assert_eq;
use ts_core::ts::{new_cell, TsCellHandle};
use ts_core::typemeta::{builtin, register_cyclic_buffer};
use ts_core::Value;

#[test]
fn fourth_push_evicts_the_oldest_sample() {
    let schema = register_cyclic_buffer(builtin::i64_type(), 3);
    let cell = new_cell(&schema, 0);
    for (tick, sample) in [(1, 10), (2, 20), (3, 30), (4, 40)] {
        let mut guard = cell.write_at(tick).unwrap();
        guard.cursor().window_push(Value::from_i64(sample)).unwrap();
    }

    let guard = cell.read_at(4);
    let view = guard.cursor();
    assert_eq!(view.window_value().and_then(|v| v.as_i64()), Some(40));
    assert_eq!(view.window_first_modified_time(), Some(2));
    assert!(view.has_removed_value());
    assert_eq!(view.removed_value().and_then(|v| v.as_i64()), Some(10));
}
