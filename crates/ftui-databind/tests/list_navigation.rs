//! List managers: position, suspension, row edits and master/detail.

#![forbid(unsafe_code)]

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{Order, customers, people};
use ftui_databind::{
    Binding, BindingContext, BindingError, BindingManager, BindingOptions, Component, DataList,
    DataSource, DataSourceUpdateMode, ManagerKind, Value, ValueKind,
};
use pretty_assertions::assert_eq;

fn counter(notifier: &ftui_databind::Notifier) -> (Rc<Cell<u32>>, ftui_databind::Subscription) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let sub = notifier.subscribe(move |()| h.set(h.get() + 1));
    (hits, sub)
}

#[test]
fn list_source_yields_list_manager() {
    let ctx = BindingContext::new();
    let manager = ctx.get(&DataSource::list(people()));
    assert_eq!(manager.kind(), ManagerKind::List);
    assert_eq!(manager.count(), 3);
    assert_eq!(manager.position(), 0);
    assert_eq!(manager.get_value("Name"), Ok(Value::from("Ada")));
}

#[test]
fn set_position_clamps_and_seek_is_strict() {
    let manager = BindingManager::for_source(&DataSource::list(people()));
    manager.set_position(10);
    assert_eq!(manager.position(), 2);
    manager.set_position(-4);
    assert_eq!(manager.position(), 0);

    let err = manager.seek(3).unwrap_err();
    assert_eq!(err.param_name(), Some("value"));
    assert!(manager.seek(-2).is_err());
    manager.seek(1).unwrap();
    assert_eq!(manager.get_value("Name"), Ok(Value::from("Grace")));
}

#[test]
fn empty_list_sits_at_minus_one() {
    let table = Rc::new(common::person_schema().new_table());
    let manager = BindingManager::for_source(&DataSource::list(Rc::clone(&table)));
    assert_eq!(manager.position(), -1);
    assert!(manager.current().is_null());
    assert_eq!(manager.get_value("Name"), Ok(Value::Null));
    manager.seek(-1).unwrap();

    table.push(common::person_schema().new_record());
    assert_eq!(manager.position(), 0);
}

#[test]
fn suspend_batches_current_changed() {
    let manager = BindingManager::for_source(&DataSource::list(people()));
    let (current, _a) = counter(manager.current_changed());
    let (position, _b) = counter(manager.position_changed());

    manager.suspend_binding();
    manager.suspend_binding();
    assert!(!manager.is_binding());
    manager.set_position(1);
    manager.set_position(2);
    assert_eq!(current.get(), 0);
    assert_eq!(position.get(), 0);

    manager.resume_binding();
    assert_eq!(current.get(), 0);
    manager.resume_binding();
    assert!(manager.is_binding());
    assert_eq!(current.get(), 1);
    assert_eq!(position.get(), 1);

    // Unbalanced resumes are ignored.
    manager.resume_binding();
    assert_eq!(manager.suspend_depth(), 0);
    assert_eq!(current.get(), 1);
}

#[test]
fn property_manager_stays_binding_while_suspended() {
    let leaf = common::MockItem::new("x", 0);
    let manager = BindingManager::for_source(&DataSource::object(leaf));
    assert_eq!(manager.kind(), ManagerKind::Property);
    assert_eq!(manager.count(), 1);
    assert_eq!(manager.position(), 0);
    manager.suspend_binding();
    assert!(manager.is_binding());
    manager.resume_binding();
    assert_eq!(manager.suspend_depth(), 0);
}

#[test]
fn bound_control_follows_position() {
    let table = people();
    let form = Component::new("form").with_property("Text", ValueKind::Text, Value::Null);
    form.set_binding_context(Some(BindingContext::new())).unwrap();
    let binding = form
        .bindings()
        .bind("Text", DataSource::list(Rc::clone(&table)), "Name")
        .unwrap();
    let manager = binding.manager().unwrap();
    assert_eq!(form.get("Text"), Some(Value::from("Ada")));

    manager.set_position(2);
    assert_eq!(form.get("Text"), Some(Value::from("Linus")));

    // While suspended the control is left alone; resuming re-reads once.
    manager.suspend_binding();
    manager.set_position(1);
    assert_eq!(form.get("Text"), Some(Value::from("Linus")));
    assert!(!binding.is_binding());
    manager.resume_binding();
    assert_eq!(form.get("Text"), Some(Value::from("Grace")));
}

#[test]
fn master_detail_follows_the_master_row() {
    let source = DataSource::list(customers());
    let ctx = BindingContext::new();
    let master = ctx.get(&source);
    let detail = ctx.get_member(&source, "Orders").unwrap();
    assert_eq!(detail.kind(), ManagerKind::List);
    assert!(BindingManager::ptr_eq(&detail.parent().unwrap(), &master));
    assert_eq!(detail.count(), 2);
    assert_eq!(detail.get_value("Item"), Ok(Value::from("apple")));

    let (fired, _sub) = counter(detail.current_changed());
    master.set_position(1);
    assert_eq!(detail.count(), 1);
    assert_eq!(detail.position(), 0);
    assert_eq!(detail.get_value("Item"), Ok(Value::from("fig")));
    assert!(fired.get() >= 1);

    master.set_position(2);
    assert_eq!(detail.count(), 0);
    assert_eq!(detail.position(), -1);
    assert_eq!(detail.get_value("Item"), Ok(Value::Null));
}

#[test]
fn detail_binding_tracks_master_and_detail_positions() {
    let list = customers();
    let form = Component::new("form")
        .with_property("Name", ValueKind::Text, Value::Null)
        .with_property("Qty", ValueKind::Int, Value::Null);
    form.set_binding_context(Some(BindingContext::new())).unwrap();
    let source = DataSource::list(Rc::clone(&list));
    let name = form.bindings().bind("Name", source.clone(), "Name").unwrap();
    let qty = form.bindings().bind("Qty", source, "Orders.Qty").unwrap();
    assert_eq!(form.get("Qty"), Some(Value::Int(1)));

    qty.manager().unwrap().set_position(1);
    assert_eq!(form.get("Qty"), Some(Value::Int(2)));

    name.manager().unwrap().set_position(1);
    assert_eq!(form.get("Name"), Some(Value::from("Bob")));
    assert_eq!(form.get("Qty"), Some(Value::Int(5)));
}

#[test]
fn unknown_detail_member_is_rejected() {
    let source = DataSource::list(customers());
    let ctx = BindingContext::new();
    let err = ctx.get_member(&source, "Invoices.Total").unwrap_err();
    assert!(matches!(
        err,
        BindingError::InvalidMember { ref segment, ref member, .. }
            if segment == "Invoices" && member == "Invoices.Total"
    ));
}

#[test]
fn add_new_then_cancel_removes_the_row() {
    let table = people();
    let manager = BindingManager::for_source(&DataSource::list(Rc::clone(&table)));
    let index = manager.add_new().unwrap();
    assert_eq!(index, 3);
    assert_eq!(manager.position(), 3);
    assert_eq!(table.len(), 4);
    assert_eq!(table.pending_new(), Some(3));

    manager.cancel_edit();
    assert_eq!(table.len(), 3);
    assert_eq!(manager.position(), 2);
    assert_eq!(table.pending_new(), None);
}

#[test]
fn add_new_then_end_edit_keeps_the_row() {
    let table = people();
    let manager = BindingManager::for_source(&DataSource::list(Rc::clone(&table)));
    manager.add_new().unwrap();
    manager.set_value("Name", Value::from("Barbara")).unwrap();
    manager.end_edit();
    assert_eq!(table.len(), 4);
    assert_eq!(table.pending_new(), None);
    assert_eq!(table.item(3).unwrap().get("Name"), Some(Value::from("Barbara")));
}

#[test]
fn moving_commits_the_pending_row() {
    let table = people();
    let manager = BindingManager::for_source(&DataSource::list(Rc::clone(&table)));
    manager.add_new().unwrap();
    manager.set_position(0);
    assert_eq!(table.pending_new(), None);
    manager.cancel_edit();
    assert_eq!(table.len(), 4);
}

#[test]
fn cancel_edit_restores_the_row_and_rereads() {
    let table = people();
    let form = Component::new("form").with_property("Age", ValueKind::Text, Value::Null);
    form.set_binding_context(Some(BindingContext::new())).unwrap();
    let options =
        BindingOptions::default().data_source_update_mode(DataSourceUpdateMode::OnPropertyChanged);
    let binding = Binding::with_options(
        "Age",
        DataSource::list(Rc::clone(&table)),
        "Age",
        options,
    );
    form.bindings().add(binding.clone()).unwrap();
    let manager = binding.manager().unwrap();

    form.set("Age", Value::from("99")).unwrap();
    assert_eq!(table.item(0).unwrap().get("Age"), Some(Value::Int(99)));
    assert!(table.item(0).unwrap().is_editing());

    manager.cancel_edit();
    assert_eq!(table.item(0).unwrap().get("Age"), Some(Value::Int(36)));
    assert_eq!(form.get("Age"), Some(Value::from("36")));
}

#[test]
fn removing_the_row_being_edited_discards_the_edit() {
    let table = people();
    let form = Component::new("form").with_property("Age", ValueKind::Text, Value::Null);
    form.set_binding_context(Some(BindingContext::new())).unwrap();
    let options =
        BindingOptions::default().data_source_update_mode(DataSourceUpdateMode::OnPropertyChanged);
    let binding = Binding::with_options("Age", DataSource::list(Rc::clone(&table)), "Age", options);
    form.bindings().add(binding.clone()).unwrap();
    let manager = binding.manager().unwrap();

    let ada = table.item(0).unwrap();
    form.set("Age", Value::from("99")).unwrap();
    assert!(ada.is_editing());

    manager.remove_at(0).unwrap();
    assert!(!ada.is_editing());
    assert_eq!(ada.get("Age"), Some(Value::Int(36)));
    assert_eq!(table.len(), 2);
    assert_eq!(form.get("Age"), Some(Value::from("45")));
}

#[test]
fn removing_rows_shifts_or_reclamps() {
    let table = people();
    let manager = BindingManager::for_source(&DataSource::list(Rc::clone(&table)));
    manager.set_position(2);
    manager.remove_at(0).unwrap();
    assert_eq!(manager.position(), 1);
    assert_eq!(manager.get_value("Name"), Ok(Value::from("Linus")));

    manager.remove_at(1).unwrap();
    assert_eq!(manager.position(), 0);
    assert_eq!(manager.get_value("Name"), Ok(Value::from("Grace")));

    let err = manager.remove_at(5).unwrap_err();
    assert_eq!(err.param_name(), Some("index"));
}

#[test]
fn reset_reclamps_and_fires_once() {
    let table = people();
    let manager = BindingManager::for_source(&DataSource::list(Rc::clone(&table)));
    manager.set_position(2);
    let (fired, _sub) = counter(manager.current_changed());
    let first = table.item(0).unwrap();
    table.reset([first]);
    assert_eq!(manager.position(), 0);
    assert_eq!(fired.get(), 1);
}

#[test]
fn property_manager_rejects_list_operations() {
    let manager = BindingManager::for_source(&DataSource::object(Order::new("nut", 1)));
    assert!(matches!(manager.add_new(), Err(BindingError::Unsupported { .. })));
    assert!(matches!(manager.remove_at(0), Err(BindingError::Unsupported { .. })));
    manager.set_value("Qty", Value::Int(7)).unwrap();
    assert_eq!(manager.get_value("Qty"), Ok(Value::Int(7)));
    let err = manager.set_value("Item", Value::from("bolt")).unwrap_err();
    assert!(matches!(err, BindingError::ReadOnly { .. }));
}
