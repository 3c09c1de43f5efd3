//! Component definitions.
//!
//! A [`ComponentDefinition`] is the immutable blueprint an instance is created
//! from: its template, declared props, a state factory, methods, computed
//! values and lifecycle hooks.
//!
//! ```
//! use sprig_components::{ComponentDefinition, PropDescriptor, PropType};
//! use sprig_components::template::{el, interp};
//! use sprig_core::{Value, scope};
//!
//! let counter = ComponentDefinition::new()
//! 	.template(el("button").on("click", "increment").child(interp("count")))
//! 	.prop(PropDescriptor::new("step", PropType::Int).default_value(1))
//! 	.state(|| scope! { "count" => 0 })
//! 	.method("increment", |ctx, _args| {
//! 		let step = ctx.prop("step").and_then(Value::as_i64).unwrap_or(1);
//! 		ctx.update("count", |count| *count = Value::Int(count.as_i64().unwrap_or(0) + step))
//! 	});
//! assert!(counter.has_method("increment"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sprig_core::{Scope, ScopeChain, Value};

use crate::app::MethodContext;
use crate::callback::{Callback, LifecycleEvent, LifecycleHook};
use crate::error::ComponentResult;
use crate::props::{PropDescriptor, PropSchema};
use crate::template::Node;

/// A component method. Receives the instance context and the call arguments.
pub type MethodFn =
	Arc<dyn Fn(&mut MethodContext<'_>, &[Value]) -> ComponentResult<()> + Send + Sync>;

/// A computed value, derived from `[state, props]` on every render.
pub type ComputedFn = Arc<dyn Fn(&ScopeChain<'_>) -> Value + Send + Sync>;

/// Produces the initial state of each new instance.
pub type StateFactory = Arc<dyn Fn() -> Scope + Send + Sync>;

#[derive(Clone)]
pub struct ComponentDefinition {
	pub(crate) name: String,
	pub(crate) template: Node,
	pub(crate) props: PropSchema,
	pub(crate) state: StateFactory,
	pub(crate) methods: HashMap<String, MethodFn>,
	pub(crate) computed: Vec<(String, ComputedFn)>,
	pub(crate) on_mounted: Vec<LifecycleHook>,
	pub(crate) on_unmounted: Vec<LifecycleHook>,
}

impl ComponentDefinition {
	pub fn new() -> Self {
		Self {
			name: String::new(),
			template: Node::Fragment(Vec::new()),
			props: PropSchema::new(),
			state: Arc::new(Scope::new),
			methods: HashMap::new(),
			computed: Vec::new(),
			on_mounted: Vec::new(),
			on_unmounted: Vec::new(),
		}
	}

	pub fn template(mut self, root: impl Into<Node>) -> Self {
		self.template = root.into();
		self
	}

	pub fn prop(mut self, descriptor: PropDescriptor) -> Self {
		self.props.insert(descriptor);
		self
	}

	/// Sets the state factory. It runs once per instance, so instances never
	/// share a state object.
	pub fn state<F>(mut self, factory: F) -> Self
	where
		F: Fn() -> Scope + Send + Sync + 'static,
	{
		self.state = Arc::new(factory);
		self
	}

	pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
	where
		F: Fn(&mut MethodContext<'_>, &[Value]) -> ComponentResult<()> + Send + Sync + 'static,
	{
		self.methods.insert(name.into(), Arc::new(method));
		self
	}

	pub fn computed<F>(mut self, name: impl Into<String>, compute: F) -> Self
	where
		F: Fn(&ScopeChain<'_>) -> Value + Send + Sync + 'static,
	{
		self.computed.push((name.into(), Arc::new(compute)));
		self
	}

	/// Runs after the instance and its subtree have been built.
	pub fn on_mounted(mut self, hook: impl Into<Callback<LifecycleEvent>>) -> Self {
		self.on_mounted.push(hook.into());
		self
	}

	/// Runs when the instance is destroyed, after its children.
	pub fn on_unmounted(mut self, hook: impl Into<Callback<LifecycleEvent>>) -> Self {
		self.on_unmounted.push(hook.into());
		self
	}

	/// The registered name; empty until the definition is registered.
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn props(&self) -> &PropSchema {
		&self.props
	}

	pub fn root(&self) -> &Node {
		&self.template
	}

	pub fn has_method(&self, name: &str) -> bool {
		self.methods.contains_key(name)
	}

	pub(crate) fn method_fn(&self, name: &str) -> Option<MethodFn> {
		self.methods.get(name).cloned()
	}

	pub(crate) fn initial_state(&self) -> Scope {
		(self.state)()
	}
}

impl Default for ComponentDefinition {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ComponentDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut methods: Vec<_> = self.methods.keys().collect();
		methods.sort();
		f.debug_struct("ComponentDefinition")
			.field("name", &self.name)
			.field("props", &self.props)
			.field("methods", &methods)
			.field(
				"computed",
				&self.computed.iter().map(|(name, _)| name).collect::<Vec<_>>(),
			)
			.finish_non_exhaustive()
	}
}
