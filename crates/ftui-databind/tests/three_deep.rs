//! Bindings through a three-hop object path: `Two.Three.MockItem.Text`.
//!
//! Every hop is observable, so replacing any intermediate object must move
//! the binding onto the new leaf and stop observing the old one.

#![forbid(unsafe_code)]

mod common;

use std::rc::Rc;

use common::{MockItem, One, Three, Two, chain};
use ftui_databind::{
    Binding, BindingContext, BindingManager, BindingOptions, Component, DataSource,
    DataSourceUpdateMode, Value, ValueKind,
};
use pretty_assertions::assert_eq;

fn form() -> Component {
    let form = Component::new("form")
        .with_property("Text", ValueKind::Text, Value::from(""))
        .with_property("Value", ValueKind::Text, Value::from(""));
    form.set_binding_context(Some(BindingContext::new())).unwrap();
    form
}

#[test]
fn reads_through_every_hop() {
    let leaf = MockItem::new("deep", 3);
    let one = chain(&leaf);
    let form = form();
    form.bindings()
        .bind("Text", DataSource::object(one), "Two.Three.MockItem.Text")
        .unwrap();
    assert_eq!(form.get("Text"), Some(Value::from("deep")));

    leaf.set_text("changed");
    assert_eq!(form.get("Text"), Some(Value::from("changed")));
}

#[test]
fn replacing_an_intermediate_follows_the_new_leaf() {
    let old_leaf = MockItem::new("old", 1);
    let one = chain(&old_leaf);
    let form = form();
    form.bindings()
        .bind("Text", DataSource::object(Rc::clone(&one)), "Two.Three.MockItem.Text")
        .unwrap();

    let new_leaf = MockItem::new("new", 2);
    let two = one.two().unwrap();
    two.set_three(Some(Three::new(Some(Rc::clone(&new_leaf)))));
    assert_eq!(form.get("Text"), Some(Value::from("new")));

    old_leaf.set_text("stale");
    assert_eq!(form.get("Text"), Some(Value::from("new")));
    assert_eq!(old_leaf.text_subscribers(), 0);

    new_leaf.set_text("fresh");
    assert_eq!(form.get("Text"), Some(Value::from("fresh")));
}

#[test]
fn replacing_the_leaf_holder_follows_the_new_leaf() {
    let old_leaf = MockItem::new("a", 1);
    let one = chain(&old_leaf);
    let form = form();
    form.bindings()
        .bind("Text", DataSource::object(Rc::clone(&one)), "Two.Three.MockItem.Text")
        .unwrap();
    assert_eq!(old_leaf.text_subscribers(), 1);

    let new_leaf = MockItem::new("b", 2);
    let three = one.two().unwrap().three().unwrap();
    three.set_mock_item(Some(Rc::clone(&new_leaf)));
    assert_eq!(form.get("Text"), Some(Value::from("b")));
    assert_eq!(old_leaf.text_subscribers(), 0);
    assert_eq!(new_leaf.text_subscribers(), 1);

    new_leaf.set_text("c");
    assert_eq!(form.get("Text"), Some(Value::from("c")));
}

#[test]
fn replacing_the_top_hop_follows_the_new_chain() {
    let old_leaf = MockItem::new("a", 1);
    let one = chain(&old_leaf);
    let old_two = one.two().unwrap();
    let form = form();
    form.bindings()
        .bind("Text", DataSource::object(Rc::clone(&one)), "Two.Three.MockItem.Text")
        .unwrap();

    let new_leaf = MockItem::new("d", 4);
    one.set_two(Some(Two::new(Some(Three::new(Some(Rc::clone(&new_leaf)))))));
    assert_eq!(form.get("Text"), Some(Value::from("d")));
    assert_eq!(old_leaf.text_subscribers(), 0);
    assert_eq!(old_two.subscribers(), 0);

    old_leaf.set_text("stale");
    assert_eq!(form.get("Text"), Some(Value::from("d")));
    new_leaf.set_text("e");
    assert_eq!(form.get("Text"), Some(Value::from("e")));
}

#[test]
fn null_intermediate_shows_null_value_until_filled() {
    let one = One::new(Some(Two::new(None)));
    let form = form();
    let options = BindingOptions::default().null_value(Value::from("(none)"));
    let binding = Binding::with_options(
        "Text",
        DataSource::object(Rc::clone(&one)),
        "Two.Three.MockItem.Text",
        options,
    );
    form.bindings().add(binding).unwrap();
    assert_eq!(form.get("Text"), Some(Value::from("(none)")));

    let leaf = MockItem::new("arrived", 0);
    one.two()
        .unwrap()
        .set_three(Some(Three::new(Some(leaf))));
    assert_eq!(form.get("Text"), Some(Value::from("arrived")));
}

#[test]
fn writes_reach_the_leaf() {
    let leaf = MockItem::new("a", 10);
    let one = chain(&leaf);
    let form = form();
    let options =
        BindingOptions::default().data_source_update_mode(DataSourceUpdateMode::OnPropertyChanged);
    form.bindings()
        .add(Binding::with_options(
            "Value",
            DataSource::object(one),
            "Two.Three.MockItem.Value",
            options,
        ))
        .unwrap();
    assert_eq!(form.get("Value"), Some(Value::from("10")));

    form.set("Value", Value::from("42")).unwrap();
    assert_eq!(leaf.value(), 42);
    assert_eq!(form.get("Value"), Some(Value::from("42")));
}

#[test]
fn context_shares_one_manager_per_member() {
    let leaf = MockItem::new("x", 0);
    let source = DataSource::object(chain(&leaf));
    let ctx = BindingContext::new();
    let a = ctx.get_member(&source, "Two.Three.MockItem").unwrap();
    let b = ctx.get_member(&source, "  two.THREE.mockitem ").unwrap();
    assert!(BindingManager::ptr_eq(&a, &b));
    // The prefixes were created on the way.
    assert!(ctx.contains(&source, "Two"));
    assert!(ctx.contains(&source, "Two.Three"));
    assert_eq!(ctx.len(), 4);
    // One subscription per observable hop.
    assert_eq!(a.chain_subscription_count(), 3);
}

#[test]
fn bad_segment_names_the_whole_member() {
    let leaf = MockItem::new("x", 0);
    let form = form();
    let err = form
        .bindings()
        .bind("Text", DataSource::object(chain(&leaf)), "Two.Four.MockItem.Text")
        .unwrap_err();
    assert_eq!(err.param_name(), Some("dataMember"));
    let message = err.to_string();
    assert!(message.contains("Four"), "{message}");
    assert!(message.contains("Two.Four.MockItem.Text"), "{message}");
    assert!(form.bindings().is_empty());
}

#[test]
fn removing_the_binding_releases_leaf_subscriptions() {
    let leaf = MockItem::new("x", 0);
    let form = form();
    let binding = form
        .bindings()
        .bind("Text", DataSource::object(chain(&leaf)), "Two.Three.MockItem.Text")
        .unwrap();
    assert_eq!(leaf.text_subscribers(), 1);
    form.bindings().remove(&binding);
    assert_eq!(leaf.text_subscribers(), 0);
}
