#![doc(html_root_url = "https://docs.rs/state-tree-sync/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A server-side UI state tree that records changes as a minimal diff for the client,
//! and applies the client's messages back to it.
//!
//! - [`tree::StateTree`] owns all [`node::StateNode`]s. Their map and list features coalesce mutations until
//!   [`collect_changes`](`tree::StateTree::collect_changes`) drains them as [`change::NodeChange`]s.
//! - [`decode::DecoderRegistry`] converts untyped wire values into typed method arguments.
//! - [`ui::Ui`] ties a tree to components, listeners, return channels and attach requests,
//!   and handles incoming [`rpc::RpcInvocation`]s.
//!
//! Everything here is single-threaded. Callers serialize access to a [`ui::Ui`] themselves.
//!
//! # Features
//!
//! ## `"dangerous-logging"`
//!
//! Writes wire values and decoded arguments into log records.
//! These may contain personal information, so by default only their shape is logged.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attach;
pub mod change;
pub mod decode;
pub mod dispatch;
pub mod listeners;
pub mod node;
pub mod node_list;
pub mod node_map;
pub mod rc_hash_map;
pub mod rpc;
pub mod tracker;
pub mod tree;
pub mod ui;
pub mod value;

pub use change::{FeatureId, NodeChange};
pub use tree::StateTree;
pub use ui::Ui;
pub use value::{NodeId, Value};
