//! Scenario 4: rebinding a REF is itself a modification of the REF cell, so
//! a view reached through it reports `modified()` at the rebind tick even
//! though the retargeted cell's own contents were last written earlier.

use pretty_assertions::assert_eq;
use ts_core::ts::{new_cell, StoredPath, TsCellHandle};
use ts_core::typemeta::builtin;
use ts_core::Value;

#[test]
fn rebinding_a_ref_reports_modified_at_the_rebind_tick() {
    let scalar_schema = builtin::i64_type();
    let a = new_cell(&scalar_schema, 0);
    let b = new_cell(&scalar_schema, 0);
    {
        let mut guard = a.write_at(5).unwrap();
        guard.cursor().set_value(Value::from_i64(1)).unwrap();
    }
    {
        let mut guard = b.write_at(5).unwrap();
        guard.cursor().set_value(Value::from_i64(2)).unwrap();
    }
    assert!(!a.read_at(20).cursor().modified());
    assert!(!b.read_at(20).cursor().modified());

    let ref_schema = ts_core::typemeta::register_ref(scalar_schema.clone(), 0);
    let r = new_cell(&ref_schema, 0);
    {
        let mut guard = r.write_at(19).unwrap();
        guard.cursor().bind(&a, StoredPath::root()).unwrap();
    }
    {
        let mut guard = r.write_at(20).unwrap();
        guard.cursor().bind(&b, StoredPath::root()).unwrap();
    }

    let guard = r.read_at(20);
    let view = guard.cursor();
    let target = view.deref_ref().unwrap();
    let target_guard = view.sample_ref(&target);
    let target_view = target_guard.cursor();
    assert!(view.modified());
    assert_eq!(target_view.as_i64(), Some(2));
    // b's own contents haven't changed since tick 5, but r rebound to it at
    // tick 20 - sampling through the ref must still report modified=true.
    assert!(target_view.modified());
}
