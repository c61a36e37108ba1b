#![allow(dead_code)]

use state_tree_sync::{NodeChange, StateTree};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Routes log records to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
	TRACING.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::from_default_env())
			.with_test_writer()
			.try_init();
	});
}

pub fn collect(tree: &mut StateTree) -> Vec<NodeChange> {
	let mut changes = Vec::new();
	tree.collect_changes(|change| changes.push(change));
	changes
}
