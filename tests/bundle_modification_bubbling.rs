//! Scenario 1: a write to one bundle field stamps the field, the bundle
//! itself, and records exactly that field's slot in the tick's delta set -
//! while a sibling field that wasn't touched reports unmodified.

use pretty_assertions::assert_eq;
use ts_core::ts::{new_cell, TsCellHandle};
use ts_core::typemeta::{builtin, register_bundle};
use ts_core::Value;

#[test]
fn price_write_bubbles_without_touching_qty() {
    let schema = register_bundle(
        "Quote",
        vec![("price", builtin::f64_type()), ("qty", builtin::i64_type())],
    );
    let cell = new_cell(&schema, 0);
    {
        let mut guard = cell.write_at(0).unwrap();
        let mut cursor = guard.cursor();
        cursor.set_field("price", Some(Value::from_f64(1.0))).unwrap();
        cursor.set_field("qty", Some(Value::from_i64(10))).unwrap();
    }
    {
        let mut guard = cell.write_at(100).unwrap();
        let mut cursor = guard.cursor();
        cursor.set_field("price", Some(Value::from_f64(1.25))).unwrap();
    }

    let guard = cell.read_at(100);
    let bundle = guard.cursor();
    assert!(bundle.modified());
    assert!(bundle.field("price").unwrap().modified());
    assert!(!bundle.field("qty").unwrap().modified());
    assert_eq!(bundle.modified_fields(), &[0]);
}
