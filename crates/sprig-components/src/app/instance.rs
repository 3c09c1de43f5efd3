//! Instance records and identifiers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sprig_core::{MethodCall, Scope};

use crate::definition::ComponentDefinition;
use crate::template::{Node, SlotBinding};
use crate::view::View;

/// Unique identifier of a mounted component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
	pub(crate) fn next() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(1);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for InstanceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Identifier of a rendered event handler, passed to [`App::trigger`](super::App::trigger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
	pub(crate) fn next() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(1);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for HandlerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "h{}", self.0)
	}
}

/// A bound handler: the method to run on `owner`, and the local frames
/// (loop variables, slot data) visible where it was bound.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Listener {
	pub owner: InstanceId,
	pub call: MethodCall,
	pub captured: Vec<Scope>,
}

/// Slot content a parent supplied to a child.
#[derive(Debug, Clone)]
pub(crate) struct SlotContent {
	/// The instance whose template the fragment was written in.
	pub owner: InstanceId,
	pub body: Arc<Node>,
	pub binding: SlotBinding,
	pub captured: Vec<Scope>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum PathSegment {
	Index(usize),
	Key(String),
}

/// Identity of a child across re-renders of the instance that renders it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ChildKey {
	/// Instance whose template contains the component site.
	pub origin: InstanceId,
	pub site: usize,
	pub path: Vec<PathSegment>,
}

pub(crate) struct InstanceRecord {
	pub definition: Arc<ComponentDefinition>,
	/// `None` while one of the instance's methods is running.
	pub state: Option<Scope>,
	/// Props as the parent supplied them, before resolution.
	pub supplied: Scope,
	pub props: Scope,
	pub computed: Scope,
	pub parent: Option<InstanceId>,
	pub children: Vec<InstanceId>,
	pub child_keys: HashMap<ChildKey, InstanceId>,
	/// Listeners the parent registered on this instance, by event name.
	pub listeners: HashMap<String, Listener>,
	pub slots: HashMap<String, SlotContent>,
	pub view: View,
	pub handler_ids: Vec<HandlerId>,
	pub dirty: bool,
	pub dirty_descendant: bool,
	pub render_count: usize,
	pub slot_renders: HashMap<String, usize>,
	/// Mount target, for roots.
	pub target: Option<String>,
	/// Set once mounted hooks have run.
	pub mounted: bool,
}

impl InstanceRecord {
	pub fn new(
		definition: Arc<ComponentDefinition>,
		parent: Option<InstanceId>,
		supplied: Scope,
		props: Scope,
	) -> Self {
		let state = definition.initial_state();
		Self {
			definition,
			state: Some(state),
			supplied,
			props,
			computed: Scope::new(),
			parent,
			children: Vec::new(),
			child_keys: HashMap::new(),
			listeners: HashMap::new(),
			slots: HashMap::new(),
			view: View::Empty,
			handler_ids: Vec::new(),
			dirty: true,
			dirty_descendant: false,
			render_count: 0,
			slot_renders: HashMap::new(),
			target: None,
			mounted: false,
		}
	}

	pub fn name(&self) -> &str {
		self.definition.name()
	}
}
