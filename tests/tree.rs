use state_tree_sync::{node::FeatureError, FeatureId, NodeChange, NodeId, StateTree, Value};
use std::{cell::RefCell, rc::Rc};

mod common;
use common::collect;

const CHILDREN: FeatureId = FeatureId::ElementChildren;
const PROPERTIES: FeatureId = FeatureId::ElementProperties;

fn tree() -> StateTree {
	let mut tree = StateTree::with_root_features(&[CHILDREN]);
	collect(&mut tree);
	tree
}

fn container(tree: &mut StateTree) -> NodeId {
	tree.create_node(&[CHILDREN, PROPERTIES])
}

fn attach(tree: &mut StateTree, node: NodeId) {
	let root = tree.root();
	tree.list_mut(root, CHILDREN).push(node).unwrap();
}

#[test]
fn first_collection_reports_root() {
	common::init_tracing();
	let mut tree = StateTree::with_root_features(&[CHILDREN, PROPERTIES]);
	let root = tree.root();
	assert_eq!(
		collect(&mut tree),
		vec![
			NodeChange::Attach { node: root },
			NodeChange::Empty { node: root, feature: PROPERTIES },
			NodeChange::Empty { node: root, feature: CHILDREN },
		]
	);
	assert_eq!(collect(&mut tree), vec![]);
}

#[test]
fn attached_node_reports_attach_and_full_state() {
	common::init_tracing();
	let mut tree = tree();
	let root = tree.root();
	let child = container(&mut tree);
	tree.map_mut(child, PROPERTIES).put("title", "Hello").unwrap();
	tree.map_mut(child, PROPERTIES).put("title", "Hello again").unwrap();
	assert!(!tree.is_attached(child));

	attach(&mut tree, child);
	assert!(tree.is_attached(child));
	assert_eq!(tree.parent(child), Some(root));

	assert_eq!(
		collect(&mut tree),
		vec![
			NodeChange::Attach { node: child },
			NodeChange::MapPut {
				node: child,
				feature: PROPERTIES,
				key: "title".to_owned(),
				value: "Hello again".into(),
			},
			NodeChange::Empty { node: child, feature: CHILDREN },
			NodeChange::ListAdd {
				node: root,
				feature: CHILDREN,
				index: 0,
				items: vec![Value::Node(child)],
			},
		]
	);
}

#[test]
fn detached_node_keeps_its_changes_until_reattached() {
	common::init_tracing();
	let mut tree = tree();
	let root = tree.root();
	let child = container(&mut tree);
	attach(&mut tree, child);
	collect(&mut tree);

	tree.list_mut(root, CHILDREN).remove(0).unwrap();
	assert!(!tree.is_attached(child));
	assert_eq!(tree.parent(child), None);
	tree.map_mut(child, PROPERTIES).put("hidden", true).unwrap();
	assert_eq!(
		collect(&mut tree),
		vec![
			NodeChange::Detach { node: child },
			NodeChange::ListRemove {
				node: root,
				feature: CHILDREN,
				index: 0,
				removed: Value::Node(child),
			},
		]
	);

	tree.map_mut(child, PROPERTIES).put("late", 1).unwrap();
	assert_eq!(collect(&mut tree), vec![]);

	attach(&mut tree, child);
	let changes = collect(&mut tree);
	assert_eq!(changes.first(), Some(&NodeChange::Attach { node: child }));
	assert_eq!(
		changes.last(),
		Some(&NodeChange::ListAdd {
			node: root,
			feature: CHILDREN,
			index: 0,
			items: vec![Value::Node(child)],
		})
	);
	assert_eq!(changes.len(), 5);
	assert!(changes.iter().any(|change| matches!(change, NodeChange::MapPut { key, .. } if key == "hidden")));
	assert!(changes.iter().any(|change| matches!(change, NodeChange::MapPut { key, .. } if key == "late")));
}

#[test]
fn transient_detach_is_invisible() {
	common::init_tracing();
	let mut tree = tree();
	let root = tree.root();
	let child = container(&mut tree);
	attach(&mut tree, child);
	collect(&mut tree);

	tree.list_mut(root, CHILDREN).remove(0).unwrap();
	attach(&mut tree, child);
	tree.map_mut(child, PROPERTIES).put("x", 1).unwrap();

	let changes = collect(&mut tree);
	assert!(!changes.iter().any(|change| matches!(change, NodeChange::Attach { .. } | NodeChange::Detach { .. })));
	assert!(changes.contains(&NodeChange::MapPut {
		node: child,
		feature: PROPERTIES,
		key: "x".to_owned(),
		value: 1.into(),
	}));
}

#[test]
fn nodes_move_between_holders() {
	common::init_tracing();
	let mut tree = tree();
	let a = container(&mut tree);
	let b = container(&mut tree);
	let child = container(&mut tree);
	attach(&mut tree, a);
	attach(&mut tree, b);

	tree.list_mut(a, CHILDREN).push(child).unwrap();
	assert_eq!(tree.parent(child), Some(a));

	tree.map_mut(b, PROPERTIES).put("slot", child).unwrap();
	assert_eq!(tree.parent(child), Some(b));
	assert!(tree.list(a, CHILDREN).is_empty());
	assert_eq!(tree.children(b), vec![child]);
}

#[test]
fn overwritten_and_removed_nodes_lose_their_parent() {
	common::init_tracing();
	let mut tree = tree();
	let holder = container(&mut tree);
	let first = container(&mut tree);
	let second = container(&mut tree);
	attach(&mut tree, holder);

	tree.map_mut(holder, PROPERTIES).put("slot", first).unwrap();
	tree.map_mut(holder, PROPERTIES).put("slot", second).unwrap();
	assert_eq!(tree.parent(first), None);
	assert!(!tree.is_attached(first));
	assert_eq!(tree.parent(second), Some(holder));

	tree.map_mut(holder, PROPERTIES).remove("slot");
	assert_eq!(tree.parent(second), None);
}

#[test]
fn moving_within_one_list_keeps_the_requested_position() {
	common::init_tracing();
	let mut tree = tree();
	let holder = container(&mut tree);
	let nodes: Vec<NodeId> = (0..3).map(|_| container(&mut tree)).collect();
	for &node in &nodes {
		tree.list_mut(holder, CHILDREN).push(node).unwrap();
	}

	tree.list_mut(holder, CHILDREN).add(3, nodes[0]).unwrap();
	assert_eq!(tree.children(holder), vec![nodes[1], nodes[2], nodes[0]]);
}

#[test]
fn cycles_are_rejected() {
	common::init_tracing();
	let mut tree = tree();
	let root = tree.root();
	let a = container(&mut tree);
	let b = container(&mut tree);
	tree.list_mut(a, CHILDREN).push(b).unwrap();

	assert_eq!(tree.list_mut(b, CHILDREN).push(a), Err(FeatureError::CyclicParent { parent: b, child: a }));
	assert_eq!(tree.map_mut(a, PROPERTIES).put("self", a), Err(FeatureError::CyclicParent { parent: a, child: a }));
	assert_eq!(tree.list_mut(a, CHILDREN).push(root), Err(FeatureError::RootAsChild { parent: a }));
	assert_eq!(tree.parent(a), None);
	assert_eq!(tree.parent(b), Some(a));
}

#[test]
fn hooks_fire_when_attached_state_flips() {
	common::init_tracing();
	let mut tree = tree();
	let root = tree.root();
	let parent = container(&mut tree);
	let child = container(&mut tree);
	tree.list_mut(parent, CHILDREN).push(child).unwrap();

	let log = Rc::new(RefCell::new(Vec::new()));
	let attach_hook = tree.add_attach_hook(child, {
		let log = Rc::clone(&log);
		move |node| log.borrow_mut().push(("attach", node))
	});
	tree.add_detach_hook(child, {
		let log = Rc::clone(&log);
		move |node| log.borrow_mut().push(("detach", node))
	});

	attach(&mut tree, parent);
	tree.list_mut(root, CHILDREN).remove(0).unwrap();
	assert_eq!(*log.borrow(), vec![("attach", child), ("detach", child)]);

	assert!(tree.remove_hook(child, attach_hook));
	assert!(!tree.remove_hook(child, attach_hook));
	attach(&mut tree, parent);
	assert_eq!(log.borrow().len(), 2);
}

#[test]
fn deep_trees_do_not_overflow() {
	common::init_tracing();
	let mut tree = tree();
	let top = container(&mut tree);
	let mut bottom = top;
	for _ in 0..5000 {
		let next = container(&mut tree);
		tree.list_mut(bottom, CHILDREN).push(next).unwrap();
		bottom = next;
	}

	attach(&mut tree, top);
	assert!(tree.is_attached(bottom));

	let mut count = 0;
	tree.visit_subtree(top, |_| count += 1);
	assert_eq!(count, 5001);

	let attached = collect(&mut tree).iter().filter(|change| matches!(change, NodeChange::Attach { .. })).count();
	assert_eq!(attached, 5001);

	let root = tree.root();
	tree.list_mut(root, CHILDREN).remove(0).unwrap();
	assert!(!tree.is_attached(bottom));
	assert_eq!(tree.destroy(top).map(|destroyed| destroyed.len()), Ok(5001));
	assert!(!tree.contains(bottom));
}

#[test]
fn destroy_requires_a_detached_subtree() {
	common::init_tracing();
	let mut tree = tree();
	let root = tree.root();
	let node = container(&mut tree);
	attach(&mut tree, node);
	assert_eq!(tree.destroy(node), Err(FeatureError::HasParent(node)));
	assert_eq!(tree.destroy(root), Err(FeatureError::HasParent(root)));
	assert!(tree.contains(node));
}

#[test]
fn destroying_a_known_node_still_reports_its_detach() {
	common::init_tracing();
	let mut tree = tree();
	let root = tree.root();
	let node = container(&mut tree);
	let child = container(&mut tree);
	tree.list_mut(node, CHILDREN).push(child).unwrap();
	attach(&mut tree, node);
	collect(&mut tree);

	tree.list_mut(root, CHILDREN).remove(0).unwrap();
	assert_eq!(tree.destroy(node), Ok(vec![node, child]));

	let changes = collect(&mut tree);
	assert!(changes.contains(&NodeChange::Detach { node }));
	assert!(changes.contains(&NodeChange::Detach { node: child }));
	assert!(changes.contains(&NodeChange::ListRemove {
		node: root,
		feature: CHILDREN,
		index: 0,
		removed: Value::Node(node),
	}));
	assert_eq!(changes.len(), 3);
	assert_eq!(collect(&mut tree), vec![]);
}

#[test]
fn destroying_a_node_the_client_never_saw_reports_nothing() {
	common::init_tracing();
	let mut tree = tree();
	let root = tree.root();
	let node = container(&mut tree);
	attach(&mut tree, node);
	tree.list_mut(root, CHILDREN).remove(0).unwrap();
	tree.destroy(node).unwrap();
	assert_eq!(collect(&mut tree), vec![]);
}

#[test]
fn a_node_is_inserted_at_most_once_per_call() {
	common::init_tracing();
	let mut tree = tree();
	let parent = container(&mut tree);
	let child = container(&mut tree);
	attach(&mut tree, parent);
	collect(&mut tree);

	assert_eq!(
		tree.list_mut(parent, CHILDREN).add_all(vec![Value::Node(child), Value::Node(child)]),
		Err(FeatureError::DuplicateChild { child })
	);
	assert!(tree.list(parent, CHILDREN).is_empty());
	assert_eq!(tree.parent(child), None);
	assert!(!tree.is_attached(child));
	assert_eq!(collect(&mut tree), vec![]);
}

#[test]
fn enabled_state_is_inherited() {
	common::init_tracing();
	let mut tree = tree();
	let parent = container(&mut tree);
	let child = container(&mut tree);
	tree.list_mut(parent, CHILDREN).push(child).unwrap();

	assert!(tree.is_enabled(child));
	tree.set_enabled(parent, false);
	assert!(!tree.is_enabled(child));
	assert!(tree.node(child).is_enabled_self());
	tree.set_enabled(parent, true);
	assert!(tree.is_enabled(child));
}

#[test]
fn inert_state_is_inherited_unless_ignored() {
	common::init_tracing();
	let mut tree = tree();
	let parent = container(&mut tree);
	let child = container(&mut tree);
	let grandchild = container(&mut tree);
	tree.list_mut(parent, CHILDREN).push(child).unwrap();
	tree.list_mut(child, CHILDREN).push(grandchild).unwrap();

	tree.set_inert(parent, true);
	assert!(tree.is_inert(grandchild));

	tree.set_ignore_parent_inert(child, true);
	assert!(!tree.is_inert(child));
	assert!(!tree.is_inert(grandchild));

	tree.set_inert(child, true);
	assert!(tree.is_inert(grandchild));
}

#[test]
fn class_list_is_a_validated_set() {
	common::init_tracing();
	let mut tree = StateTree::new();
	let root = tree.root();
	let element = tree.create_element("div");
	tree.list_mut(root, CHILDREN).push(element).unwrap();
	assert_eq!(tree.tag(element), Some("div"));

	let mut classes = tree.class_list(element);
	assert_eq!(classes.add("primary"), Ok(true));
	assert_eq!(classes.add("primary"), Ok(false));
	assert!(matches!(classes.add("two words"), Err(FeatureError::Rejected { .. })));
	assert!(matches!(classes.add(""), Err(FeatureError::Rejected { .. })));
	assert!(matches!(classes.add(3), Err(FeatureError::Rejected { .. })));
	assert_eq!(classes.len(), 1);
	assert!(classes.remove(&"primary".into()));
	assert!(!classes.remove(&"primary".into()));
	assert!(classes.is_empty());
}

#[test]
fn changes_are_collected_in_first_touch_order() {
	common::init_tracing();
	let mut tree = tree();
	let a = container(&mut tree);
	let b = container(&mut tree);
	attach(&mut tree, a);
	attach(&mut tree, b);
	collect(&mut tree);

	tree.map_mut(b, PROPERTIES).put("k", 1).unwrap();
	tree.map_mut(a, PROPERTIES).put("k", 2).unwrap();
	tree.map_mut(b, PROPERTIES).put("k", 3).unwrap();

	let nodes: Vec<NodeId> = collect(&mut tree).iter().map(NodeChange::node).collect();
	assert_eq!(nodes, vec![b, a]);
}
