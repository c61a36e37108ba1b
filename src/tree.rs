use crate::{
	change::{FeatureId, NodeChange},
	node::{DisabledUpdateMode, Feature, FeatureError, HookId, StateNode},
	node_list::NodeList,
	node_map::NodeMap,
	value::{NodeId, Value},
};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexSet;
use tracing::{debug, instrument, trace, trace_span};

/// Key of the tag name in [`FeatureId::ElementData`].
pub const TAG_KEY: &str = "tag";

/// Checks a value before a [`ListSetView`] stores it.
pub type Validator = fn(&Value) -> Result<(), String>;

/// Arena of [`StateNode`]s below one root.
///
/// Every node is created detached and becomes attached once it is stored, directly or transitively, in a feature of the root.
/// Only attached nodes are visible to the client: they report their changes on [`collect_changes`](`StateTree::collect_changes`)
/// and are addressable by incoming RPC.
#[derive(Debug)]
pub struct StateTree {
	nodes: HashMap<NodeId, StateNode>,
	root: NodeId,
	next_node: u32,
	next_hook: u32,
	/// Nodes with potential changes, in the order they were first touched.
	dirty: IndexSet<NodeId>,
	/// Destroyed nodes the client still has to be told were detached.
	tombstones: HashSet<NodeId>,
}
impl Default for StateTree {
	fn default() -> Self {
		Self::new()
	}
}
impl StateTree {
	/// Creates a tree whose root carries all element features.
	#[must_use]
	pub fn new() -> Self {
		Self::with_root_features(&FeatureId::ELEMENT)
	}

	#[must_use]
	#[instrument]
	pub fn with_root_features(features: &[FeatureId]) -> Self {
		let root = NodeId(1);
		let mut root_node = StateNode::new(root, features);
		root_node.attached = true;

		let mut nodes = HashMap::new();
		nodes.insert(root, root_node);
		let mut dirty = IndexSet::new();
		dirty.insert(root);

		Self {
			nodes,
			root,
			next_node: root.0 + 1,
			next_hook: 0,
			dirty,
			tombstones: HashSet::new(),
		}
	}

	#[must_use]
	pub fn root(&self) -> NodeId {
		self.root
	}

	/// Creates a detached node with the given features.
	pub fn create_node(&mut self, features: &[FeatureId]) -> NodeId {
		let id = NodeId(self.next_node);
		self.next_node += 1;
		self.nodes.insert(id, StateNode::new(id, features));
		trace!(node = %id, ?features, "Created node.");
		id
	}

	/// Creates a detached element node with the given tag name.
	pub fn create_element(&mut self, tag: &str) -> NodeId {
		let id = self.create_node(&FeatureId::ELEMENT);
		let stored = self.node_mut(id).map_mut(FeatureId::ElementData).put(TAG_KEY, Value::from(tag));
		debug_assert!(stored.is_ok());
		id
	}

	/// Whether `node` was created by this tree and not destroyed since.
	#[must_use]
	pub fn contains(&self, node: NodeId) -> bool {
		self.nodes.contains_key(&node)
	}

	#[must_use]
	pub fn try_node(&self, node: NodeId) -> Option<&StateNode> {
		self.nodes.get(&node)
	}

	/// # Panics
	///
	/// Iff `node` is not part of this tree.
	#[must_use]
	#[track_caller]
	pub fn node(&self, node: NodeId) -> &StateNode {
		self.nodes.get(&node).unwrap_or_else(|| panic!("{} is not a node of this tree.", node))
	}

	#[track_caller]
	fn node_mut(&mut self, node: NodeId) -> &mut StateNode {
		self.nodes.get_mut(&node).unwrap_or_else(|| panic!("{} is not a node of this tree.", node))
	}

	/// `false` for unknown nodes.
	#[must_use]
	pub fn is_attached(&self, node: NodeId) -> bool {
		self.nodes.get(&node).map_or(false, |node| node.attached)
	}

	#[must_use]
	#[track_caller]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.node(node).parent
	}

	/// The tag name stored in the node's element data, if any.
	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		self.nodes
			.get(&node)?
			.feature(FeatureId::ElementData)?
			.as_map()?
			.get(TAG_KEY)?
			.as_str()
	}

	/// # Panics
	///
	/// Iff the node or the map feature doesn't exist.
	#[must_use]
	#[track_caller]
	pub fn map(&self, node: NodeId, feature: FeatureId) -> &NodeMap {
		self.node(node).map(feature)
	}

	/// # Panics
	///
	/// Iff the node or the list feature doesn't exist.
	#[must_use]
	#[track_caller]
	pub fn list(&self, node: NodeId, feature: FeatureId) -> &NodeList {
		self.node(node).list(feature)
	}

	/// # Panics
	///
	/// Iff the node or the map feature doesn't exist.
	#[track_caller]
	pub fn map_mut(&mut self, node: NodeId, feature: FeatureId) -> MapAccess<'_> {
		let _ = self.node(node).map(feature);
		MapAccess { tree: self, node, feature }
	}

	/// # Panics
	///
	/// Iff the node or the list feature doesn't exist.
	#[track_caller]
	pub fn list_mut(&mut self, node: NodeId, feature: FeatureId) -> ListAccess<'_> {
		let _ = self.node(node).list(feature);
		ListAccess { tree: self, node, feature }
	}

	/// A set view of a list feature.
	///
	/// # Panics
	///
	/// Iff the node or the list feature doesn't exist.
	#[track_caller]
	pub fn set_view(&mut self, node: NodeId, feature: FeatureId, validator: Option<Validator>) -> ListSetView<'_> {
		ListSetView {
			list: self.list_mut(node, feature),
			validator,
		}
	}

	/// The node's CSS classes.
	#[track_caller]
	pub fn class_list(&mut self, node: NodeId) -> ListSetView<'_> {
		self.set_view(node, FeatureId::ClassList, Some(validate_class_name))
	}

	pub fn set_enabled(&mut self, node: NodeId, enabled: bool) {
		self.node_mut(node).enabled = enabled;
	}

	/// Whether the node and all of its ancestors are enabled.
	#[must_use]
	pub fn is_enabled(&self, node: NodeId) -> bool {
		let mut current = self.nodes.get(&node);
		while let Some(node) = current {
			if !node.enabled {
				return false;
			}
			current = node.parent.and_then(|parent| self.nodes.get(&parent));
		}
		true
	}

	pub fn set_inert(&mut self, node: NodeId, inert: bool) {
		self.node_mut(node).inert = inert;
	}

	/// Stops the node from inheriting inertness from its parent.
	pub fn set_ignore_parent_inert(&mut self, node: NodeId, ignore: bool) {
		self.node_mut(node).ignore_parent_inert = ignore;
	}

	/// Whether the node is inert itself, or inherits inertness from an ancestor.
	#[must_use]
	pub fn is_inert(&self, node: NodeId) -> bool {
		let mut current = self.nodes.get(&node);
		while let Some(node) = current {
			if node.inert {
				return true;
			}
			if node.ignore_parent_inert {
				return false;
			}
			current = node.parent.and_then(|parent| self.nodes.get(&parent));
		}
		false
	}

	/// Allows the client to update `property` of `node`.
	///
	/// Registering the same property again keeps the more permissive mode.
	pub fn synchronize_property(&mut self, node: NodeId, property: &str, mode: DisabledUpdateMode) {
		let properties = &mut self.node_mut(node).synchronized_properties;
		let mode = properties.get(property).map_or(mode, |&existing| existing.most_permissive(mode));
		properties.insert(property.to_owned(), mode);
	}

	/// The mode under which the client may update `property`, or [`None`] if it may not.
	#[must_use]
	pub fn client_update_mode(&self, node: NodeId, property: &str) -> Option<DisabledUpdateMode> {
		self.nodes.get(&node)?.synchronized_properties.get(property).copied()
	}

	/// Runs `hook` each time the node becomes attached.
	pub fn add_attach_hook(&mut self, node: NodeId, hook: impl FnMut(NodeId) + 'static) -> HookId {
		let id = self.next_hook_id();
		self.node_mut(node).attach_hooks.push((id, Box::new(hook)));
		id
	}

	/// Runs `hook` each time the node becomes detached.
	pub fn add_detach_hook(&mut self, node: NodeId, hook: impl FnMut(NodeId) + 'static) -> HookId {
		let id = self.next_hook_id();
		self.node_mut(node).detach_hooks.push((id, Box::new(hook)));
		id
	}

	/// Returns `false` if the hook wasn't registered on `node`.
	pub fn remove_hook(&mut self, node: NodeId, hook: HookId) -> bool {
		let node = self.node_mut(node);
		let before = node.attach_hooks.len() + node.detach_hooks.len();
		node.attach_hooks.retain(|(id, _)| *id != hook);
		node.detach_hooks.retain(|(id, _)| *id != hook);
		node.attach_hooks.len() + node.detach_hooks.len() != before
	}

	fn next_hook_id(&mut self) -> HookId {
		let id = HookId(self.next_hook);
		self.next_hook += 1;
		id
	}

	pub fn mark_dirty(&mut self, node: NodeId) {
		self.dirty.insert(node);
	}

	/// All direct children of `node`, feature children in feature order first.
	#[must_use]
	#[track_caller]
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		let mut children = Vec::new();
		self.node(node).push_children(&mut children);
		children
	}

	/// Visits `node` and its descendants in pre-order.
	///
	/// The traversal is iterative, so arbitrarily deep trees are fine.
	#[track_caller]
	pub fn visit_subtree(&self, node: NodeId, mut visitor: impl FnMut(&StateNode)) {
		let mut stack = vec![node];
		let mut children = Vec::new();
		while let Some(current) = stack.pop() {
			let current = self.node(current);
			visitor(current);

			current.push_children(&mut children);
			stack.extend(children.drain(..).rev());
		}
	}

	/// Drops a parentless node and its whole subtree from the arena.
	///
	/// Returns the dropped nodes.
	/// Those that were attached at the last collection still report a detach on the next one.
	///
	/// # Errors
	///
	/// Iff `node` still has a parent or is the root.
	#[instrument(skip(self))]
	pub fn destroy(&mut self, node: NodeId) -> Result<Vec<NodeId>, FeatureError> {
		if node == self.root {
			return Err(FeatureError::HasParent(node));
		}
		if self.node(node).parent.is_some() {
			return Err(FeatureError::HasParent(node));
		}

		let mut destroyed = Vec::new();
		self.visit_subtree(node, |node| destroyed.push(node.id));
		for id in &destroyed {
			match self.nodes.remove(id) {
				Some(node) if node.was_attached => {
					self.dirty.insert(*id);
					self.tombstones.insert(*id);
				}
				_ => {
					self.dirty.shift_remove(id);
				}
			}
		}
		debug!(count = destroyed.len(), "Destroyed detached subtree.");
		Ok(destroyed)
	}

	/// Hands the changes of all dirty nodes to `collector`, in the order the nodes were first marked.
	#[instrument(skip(self, collector))]
	pub fn collect_changes(&mut self, mut collector: impl FnMut(NodeChange)) {
		let dirty: Vec<NodeId> = self.dirty.drain(..).collect();
		trace!(dirty = dirty.len(), "Collecting changes.");
		for node in dirty {
			self.collect_node_changes_inner(node, &mut collector);
		}
	}

	/// Hands the changes of one node to `collector`.
	///
	/// A node that is attached for the first time since the last collection reports an attach followed by its complete state.
	/// A detached node reports only that it was detached, and keeps its pending changes for when it is attached again.
	pub fn collect_node_changes(&mut self, node: NodeId, mut collector: impl FnMut(NodeChange)) {
		self.dirty.shift_remove(&node);
		self.collect_node_changes_inner(node, &mut collector);
	}

	fn collect_node_changes_inner(&mut self, id: NodeId, collector: &mut dyn FnMut(NodeChange)) {
		let node = match self.nodes.get_mut(&id) {
			Some(node) => node,
			None => {
				if self.tombstones.remove(&id) {
					collector(NodeChange::Detach { node: id });
				}
				return;
			}
		};

		if node.attached != node.was_attached {
			if node.attached {
				collector(NodeChange::Attach { node: id });
				for (_, feature) in node.features_mut() {
					feature.reset_changes();
					feature.generate_changes_from_empty();
				}
			} else {
				collector(NodeChange::Detach { node: id });
			}
			node.was_attached = node.attached;
		}

		if !node.attached {
			return;
		}
		for (feature_id, feature) in node.features_mut() {
			feature.collect_changes(id, feature_id, collector);
		}
	}

	/// Fails if `child` may not become a child of `parent`.
	fn check_adoptable(&self, parent: NodeId, child: NodeId) -> Result<(), FeatureError> {
		if child == self.root {
			return Err(FeatureError::RootAsChild { parent });
		}
		let _ = self.node(child);

		let mut current = Some(parent);
		while let Some(ancestor) = current {
			if ancestor == child {
				return Err(FeatureError::CyclicParent { parent, child });
			}
			current = self.node(ancestor).parent;
		}
		Ok(())
	}

	/// Takes `child` out of whatever holds it now, leaving it parentless.
	fn release(&mut self, child: NodeId) {
		let holder = match self.node(child).parent {
			Some(holder) => holder,
			None => return,
		};
		let span = trace_span!("release", child = %child, holder = %holder);
		let _enter = span.enter();

		let reference = Value::Node(child);
		let node = self.node_mut(holder);
		let mut found = false;
		for (_, feature) in node.features_mut() {
			match feature {
				Feature::Map(map) => {
					let key = map.iter().find(|(_, value)| **value == reference).map(|(key, _)| key.to_owned());
					if let Some(key) = key {
						map.remove(&key);
						found = true;
						break;
					}
				}
				Feature::List(list) => {
					if let Some(index) = list.index_of(&reference) {
						found = list.remove(index).is_ok();
						break;
					}
				}
			}
		}
		if found {
			self.mark_dirty(holder);
		} else {
			node.bookkept_children.retain(|&bookkept| bookkept != child);
		}
		self.set_parent(child, None);
	}

	/// Updates the parent link and the attached state of the whole subtree, firing hooks where it flips.
	fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) {
		let attached_before = self.node(child).attached;
		let attached_after = parent.map_or(false, |parent| self.node(parent).attached);
		self.node_mut(child).parent = parent;

		if attached_before != attached_after {
			self.propagate_attached(child, attached_after);
		}
	}

	fn propagate_attached(&mut self, top: NodeId, attached: bool) {
		let span = trace_span!("propagate_attached", top = %top, attached);
		let _enter = span.enter();

		let mut stack = vec![top];
		while let Some(id) = stack.pop() {
			self.dirty.insert(id);
			let node = self.node_mut(id);
			node.attached = attached;
			let hooks = if attached { &mut node.attach_hooks } else { &mut node.detach_hooks };
			for (_, hook) in hooks.iter_mut() {
				hook(id);
			}
			node.push_children(&mut stack);
		}
	}

	/// Makes `parent` the parent of `child` without storing `child` in a feature.
	///
	/// Such children are attached and detached along with `parent` but are not sent to the client as part of it.
	pub(crate) fn adopt_bookkept(&mut self, parent: NodeId, child: NodeId) -> Result<(), FeatureError> {
		self.check_adoptable(parent, child)?;
		self.release(child);
		self.node_mut(parent).bookkept_children.push(child);
		self.set_parent(child, Some(parent));
		Ok(())
	}

	/// Undoes [`adopt_bookkept`](`StateTree::adopt_bookkept`). Does nothing if `child` is held some other way now.
	pub(crate) fn release_bookkept(&mut self, parent: NodeId, child: NodeId) {
		let bookkept = &mut self.node_mut(parent).bookkept_children;
		if let Some(index) = bookkept.iter().position(|&bookkept| bookkept == child) {
			bookkept.remove(index);
			self.set_parent(child, None);
		}
	}
}

/// Rejects anything that isn't a single CSS class name.
///
/// # Errors
///
/// Iff `value` is not a non-empty string without whitespace.
pub fn validate_class_name(value: &Value) -> Result<(), String> {
	match value.as_str() {
		Some("") => Err("class names can't be empty".to_owned()),
		Some(name) if name.chars().any(char::is_whitespace) => Err("class names can't contain whitespace".to_owned()),
		Some(_) => Ok(()),
		None => Err(format!("class names must be strings, not {}", value.kind())),
	}
}

/// Mutable access to one map feature, keeping parent links and dirty marks in sync.
pub struct MapAccess<'a> {
	tree: &'a mut StateTree,
	node: NodeId,
	feature: FeatureId,
}
impl<'a> MapAccess<'a> {
	#[must_use]
	pub fn as_map(&self) -> &NodeMap {
		self.tree.node(self.node).map(self.feature)
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.as_map().get(key)
	}

	/// Stores `value` under `key`. See [`NodeMap::put`].
	///
	/// A [`Value::Node`] is first taken from its previous holder. A node that is overwritten loses its parent.
	///
	/// # Errors
	///
	/// Iff `value` is a non-finite number, or a node that can't become a child here.
	pub fn put(&mut self, key: &str, value: impl Into<Value>) -> Result<Option<Value>, FeatureError> {
		self.put_with(key, value.into(), true)
	}

	/// Like [`put`](`MapAccess::put`), but see [`NodeMap::put_with`] for `emit_change`.
	///
	/// # Errors
	///
	/// Iff `value` is a non-finite number, or a node that can't become a child here.
	pub fn put_with(&mut self, key: &str, value: Value, emit_change: bool) -> Result<Option<Value>, FeatureError> {
		if !value.is_finite() {
			return Err(FeatureError::NonFinite { key: key.to_owned() });
		}
		if self.get(key) == Some(&value) {
			return Ok(Some(value));
		}

		let child = value.as_node();
		if let Some(child) = child {
			self.tree.check_adoptable(self.node, child)?;
			self.tree.release(child);
		}

		let previous = self.tree.node_mut(self.node).map_mut(self.feature).put_with(key, value, emit_change)?;
		if let Some(child) = child {
			self.tree.set_parent(child, Some(self.node));
		}
		if let Some(orphan) = previous.as_ref().and_then(Value::as_node) {
			self.tree.set_parent(orphan, None);
		}
		self.tree.mark_dirty(self.node);
		Ok(previous)
	}

	/// Removes `key`. A removed node loses its parent.
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		let previous = self.tree.node_mut(self.node).map_mut(self.feature).remove(key)?;
		if let Some(orphan) = previous.as_node() {
			self.tree.set_parent(orphan, None);
		}
		self.tree.mark_dirty(self.node);
		Some(previous)
	}
}

/// Mutable access to one list feature, keeping parent links and dirty marks in sync.
pub struct ListAccess<'a> {
	tree: &'a mut StateTree,
	node: NodeId,
	feature: FeatureId,
}
impl<'a> ListAccess<'a> {
	#[must_use]
	pub fn as_list(&self) -> &NodeList {
		self.tree.node(self.node).list(self.feature)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.as_list().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.as_list().is_empty()
	}

	#[must_use]
	pub fn get(&self, index: usize) -> Option<&Value> {
		self.as_list().get(index)
	}

	#[must_use]
	pub fn index_of(&self, value: &Value) -> Option<usize> {
		self.as_list().index_of(value)
	}

	/// # Errors
	///
	/// See [`insert_all`](`ListAccess::insert_all`).
	pub fn push(&mut self, value: impl Into<Value>) -> Result<(), FeatureError> {
		let len = self.len();
		self.insert_all(len, vec![value.into()])
	}

	/// # Errors
	///
	/// See [`insert_all`](`ListAccess::insert_all`).
	pub fn add(&mut self, index: usize, value: impl Into<Value>) -> Result<(), FeatureError> {
		self.insert_all(index, vec![value.into()])
	}

	/// # Errors
	///
	/// See [`insert_all`](`ListAccess::insert_all`).
	pub fn add_all(&mut self, items: Vec<Value>) -> Result<(), FeatureError> {
		let len = self.len();
		self.insert_all(len, items)
	}

	/// Inserts `items` before `index` as a single change.
	///
	/// Nodes among `items` are first taken from their previous holders.
	/// If that is this list, `index` refers to the list as it was before they were taken out.
	///
	/// # Errors
	///
	/// Iff `index` is out of bounds, an item is a non-finite number or a node that can't become a child here,
	/// or the same node appears twice among `items`. Nothing is changed in that case.
	pub fn insert_all(&mut self, index: usize, items: Vec<Value>) -> Result<(), FeatureError> {
		let len = self.len();
		if index > len {
			return Err(FeatureError::IndexOutOfBounds { index, len });
		}
		if let Some(position) = items.iter().position(|item| !item.is_finite()) {
			return Err(FeatureError::NonFinite { key: format!("[{}]", index + position) });
		}
		let children: Vec<NodeId> = items.iter().filter_map(Value::as_node).collect();
		let mut seen = HashSet::with_capacity(children.len());
		for &child in &children {
			if !seen.insert(child) {
				return Err(FeatureError::DuplicateChild { child });
			}
			self.tree.check_adoptable(self.node, child)?;
		}

		let mut index = index;
		for &child in &children {
			if self.tree.node(child).parent == Some(self.node) {
				if let Some(position) = self.index_of(&Value::Node(child)) {
					if position < index {
						index -= 1;
					}
				}
			}
			self.tree.release(child);
		}

		self.tree.node_mut(self.node).list_mut(self.feature).insert_all(index, items)?;
		for child in children {
			self.tree.set_parent(child, Some(self.node));
		}
		self.tree.mark_dirty(self.node);
		Ok(())
	}

	/// Removes the item at `index`. A removed node loses its parent.
	///
	/// # Errors
	///
	/// Iff `index` is out of bounds.
	pub fn remove(&mut self, index: usize) -> Result<Value, FeatureError> {
		let removed = self.tree.node_mut(self.node).list_mut(self.feature).remove(index)?;
		if let Some(orphan) = removed.as_node() {
			self.tree.set_parent(orphan, None);
		}
		self.tree.mark_dirty(self.node);
		Ok(removed)
	}

	/// Replaces the item at `index`, recorded as a remove followed by an add.
	///
	/// # Errors
	///
	/// Iff `index` is out of bounds, or `value` can't be stored (see [`insert_all`](`ListAccess::insert_all`)).
	/// The list is unchanged in that case.
	pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value, FeatureError> {
		let value = value.into();
		let len = self.len();
		if index >= len {
			return Err(FeatureError::IndexOutOfBounds { index, len });
		}
		if !value.is_finite() {
			return Err(FeatureError::NonFinite { key: format!("[{}]", index) });
		}
		if let Some(child) = value.as_node() {
			self.tree.check_adoptable(self.node, child)?;
		}

		let previous = self.remove(index)?;
		self.add(index, value)?;
		Ok(previous)
	}

	/// Removes every item. Removed nodes lose their parent.
	pub fn clear(&mut self) -> Vec<Value> {
		let removed = self.tree.node_mut(self.node).list_mut(self.feature).clear();
		for orphan in removed.iter().filter_map(Value::as_node) {
			self.tree.set_parent(orphan, None);
		}
		self.tree.mark_dirty(self.node);
		removed
	}
}

/// Set semantics over a list feature: no duplicates, insertion order, optional validation.
pub struct ListSetView<'a> {
	list: ListAccess<'a>,
	validator: Option<Validator>,
}
impl<'a> ListSetView<'a> {
	#[must_use]
	pub fn contains(&self, value: &Value) -> bool {
		self.list.index_of(value).is_some()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.list.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.list.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Value> {
		self.list.as_list().iter()
	}

	/// Returns `false` if `value` is already present.
	///
	/// # Errors
	///
	/// Iff the validator rejects `value`, in which case nothing is added.
	pub fn add(&mut self, value: impl Into<Value>) -> Result<bool, FeatureError> {
		let value = value.into();
		if self.contains(&value) {
			return Ok(false);
		}
		if let Some(validator) = self.validator {
			validator(&value).map_err(|reason| FeatureError::Rejected { reason })?;
		}
		self.list.push(value).map(|()| true)
	}

	/// Returns `false` if `value` wasn't present.
	pub fn remove(&mut self, value: &Value) -> bool {
		match self.list.index_of(value) {
			Some(index) => self.list.remove(index).is_ok(),
			None => false,
		}
	}

	pub fn clear(&mut self) {
		self.list.clear();
	}
}
