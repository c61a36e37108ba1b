use state_tree_sync::{node::FeatureError, node_map::NodeMap, FeatureId, NodeChange, NodeId, Value};

mod common;

const NODE: NodeId = NodeId::from_raw(7);
const FEATURE: FeatureId = FeatureId::ElementProperties;

fn collect(map: &mut NodeMap) -> Vec<NodeChange> {
	let mut changes = Vec::new();
	map.collect_changes(NODE, FEATURE, &mut |change| changes.push(change));
	changes
}

fn put(key: &str, value: impl Into<Value>) -> NodeChange {
	NodeChange::MapPut {
		node: NODE,
		feature: FEATURE,
		key: key.to_owned(),
		value: value.into(),
	}
}

fn populated() -> NodeMap {
	let mut map = NodeMap::new();
	map.put("a", 1.into()).unwrap();
	map.put("b", "x".into()).unwrap();
	collect(&mut map);
	map
}

#[test]
fn never_populated_map_reports_empty_once() {
	common::init_tracing();
	let mut map = NodeMap::new();
	assert!(map.has_changes());
	assert_eq!(collect(&mut map), vec![NodeChange::Empty { node: NODE, feature: FEATURE }]);
	assert!(!map.has_changes());
	assert_eq!(collect(&mut map), vec![]);
}

#[test]
fn puts_are_reported_in_first_touch_order() {
	common::init_tracing();
	let mut map = NodeMap::new();
	map.put("b", 2.into()).unwrap();
	map.put("a", 1.into()).unwrap();
	map.put("b", 3.into()).unwrap();
	assert_eq!(collect(&mut map), vec![put("b", 3), put("a", 1)]);
}

#[test]
fn returning_to_flushed_value_cancels_out() {
	common::init_tracing();
	let mut map = populated();
	map.put("a", 2.into()).unwrap();
	map.put("a", 1.into()).unwrap();
	assert!(map.has_changes());
	assert_eq!(collect(&mut map), vec![]);
}

#[test]
fn put_then_remove_of_new_key_cancels_out() {
	common::init_tracing();
	let mut map = populated();
	map.put("c", true.into()).unwrap();
	assert_eq!(map.remove("c"), Some(Value::Bool(true)));
	assert_eq!(collect(&mut map), vec![]);
}

#[test]
fn remove_then_put_is_a_single_put() {
	common::init_tracing();
	let mut map = populated();
	map.remove("b");
	map.put("b", "y".into()).unwrap();
	assert_eq!(collect(&mut map), vec![put("b", "y")]);
}

#[test]
fn remove_then_put_of_the_flushed_value_is_no_change() {
	common::init_tracing();
	let mut map = populated();
	let flushed = map.remove("b").unwrap();
	map.put("b", flushed).unwrap();
	assert_eq!(collect(&mut map), vec![]);
}

#[test]
fn remove_is_reported() {
	common::init_tracing();
	let mut map = populated();
	assert_eq!(map.remove("a"), Some(Value::Int(1)));
	assert_eq!(map.remove("a"), None);
	assert_eq!(
		collect(&mut map),
		vec![NodeChange::MapRemove {
			node: NODE,
			feature: FEATURE,
			key: "a".to_owned()
		}]
	);
	assert!(!map.contains("a"));
}

#[test]
fn null_is_stored_and_reported() {
	common::init_tracing();
	let mut map = populated();
	map.put("a", Value::Null).unwrap();
	assert!(map.contains("a"));
	assert_eq!(collect(&mut map), vec![put("a", Value::Null)]);
}

#[test]
fn putting_equal_value_changes_nothing() {
	common::init_tracing();
	let mut map = populated();
	assert_eq!(map.put("a", 1.into()), Ok(Some(Value::Int(1))));
	assert!(!map.has_changes());
}

#[test]
fn non_finite_numbers_are_rejected() {
	common::init_tracing();
	let mut map = populated();
	for value in &[f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
		assert_eq!(map.put("d", Value::Double(*value)), Err(FeatureError::NonFinite { key: "d".to_owned() }));
	}
	assert!(!map.contains("d"));
	assert!(!map.has_changes());
}

#[test]
fn silent_put_is_not_reported_but_becomes_the_baseline() {
	common::init_tracing();
	let mut map = populated();
	map.put_with("a", 2.into(), false).unwrap();
	assert_eq!(collect(&mut map), vec![]);

	map.put("a", 1.into()).unwrap();
	assert_eq!(collect(&mut map), vec![put("a", 1)]);
}

#[test]
fn silent_put_after_tracked_put_drops_the_pending_change() {
	common::init_tracing();
	let mut map = populated();
	map.put("a", 3.into()).unwrap();
	map.put_with("a", 5.into(), false).unwrap();
	assert_eq!(map.get("a"), Some(&Value::Int(5)));
	assert_eq!(collect(&mut map), vec![]);
}

#[test]
fn clear_reports_every_key() {
	common::init_tracing();
	let mut map = populated();
	let cleared = map.clear();
	assert_eq!(cleared.len(), 2);
	assert!(map.is_empty());
	let changes = collect(&mut map);
	assert_eq!(changes.len(), 2);
	assert!(changes.iter().all(|change| matches!(change, NodeChange::MapRemove { .. })));
}

#[test]
fn generate_changes_from_empty_reports_the_full_content() {
	common::init_tracing();
	let mut map = populated();
	map.reset_changes();
	map.generate_changes_from_empty();
	assert_eq!(collect(&mut map), vec![put("a", 1), put("b", "x")]);
}

#[test]
fn defaults_apply_only_to_absent_keys() {
	common::init_tracing();
	let mut map = NodeMap::new();
	assert!(map.get_bool_or("flag", true));
	assert_eq!(map.get_int_or("count", 42), 42);
	assert_eq!(map.get_str_or("name", "none"), Some("none"));

	map.put("flag", Value::Null).unwrap();
	map.put("count", Value::Null).unwrap();
	map.put("name", Value::Null).unwrap();
	assert!(!map.get_bool_or("flag", true));
	assert_eq!(map.get_int_or("count", 42), 0);
	assert_eq!(map.get_str_or("name", "none"), None);

	map.put("count", 3.into()).unwrap();
	assert_eq!(map.get_int_or("count", 42), 3);
}

#[test]
#[should_panic]
fn wrong_type_for_default_accessor_panics() {
	let mut map = NodeMap::new();
	map.put("count", "three".into()).unwrap();
	let _ = map.get_int_or("count", 0);
}
