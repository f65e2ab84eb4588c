//! Scenario 5: pushing past a dynamic list's current backing capacity
//! preserves every previously pushed element - no element goes missing or
//! turns up invalid after the underlying `Vec` reallocates.

use pretty_assertions::assert_eq;
use ts_core::ts::{new_cell, TsCellHandle};
use ts_core::typemeta::{builtin, register_bundle, register_list};
use ts_core::Value;

#[test]
fn pushing_past_capacity_keeps_every_element_valid() {
    let element_schema = register_bundle("Named", vec![("name", builtin::string_type())]);
    let list_schema = register_list(element_schema.clone(), 0);
    let cell = new_cell(&list_schema, 0);

    {
        let mut guard = cell.write_at(1).unwrap();
        let mut cursor = guard.cursor();
        for name in ["a", "b", "c", "d"] {
            let mut element = Value::new(&element_schema);
            element.as_bundle_mut().unwrap().set_field("name", Some(Value::from_string(name))).unwrap();
            cursor.push(Some(element)).unwrap();
        }
    }

    let guard = cell.read_at(1);
    let view = guard.cursor();
    assert_eq!(view.list_len(), 4);
    for (i, expected) in ["a", "b", "c", "d"].into_iter().enumerate() {
        let element = view.element(i).unwrap();
        assert!(element.all_valid());
        assert_eq!(element.field("name").unwrap().as_str(), Some(expected));
    }
}
