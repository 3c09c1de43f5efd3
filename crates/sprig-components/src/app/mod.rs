//! The instance tree.
//!
//! An [`App`] owns a frozen [`ComponentRegistry`], a [`MountHost`] and every
//! live instance. Instances are created top-down when a root is mounted; each
//! one renders its template, which asks for children, which are created and
//! rendered in turn.
//!
//! Interaction goes through [`App::invoke`] (call a method directly) or
//! [`App::trigger`] (fire a rendered event handler). Both run the method,
//! which may `emit` to its parent synchronously, and then flush: dirty
//! instances re-render from the roots down, and instances whose inputs did not
//! change are skipped.
//!
//! ```
//! use sprig_components::{App, ComponentDefinition, ComponentRegistry, MountHost};
//! use sprig_components::template::{el, interp};
//! use sprig_core::{Value, scope};
//!
//! let mut registry = ComponentRegistry::new();
//! registry
//! 	.register(
//! 		"Counter",
//! 		ComponentDefinition::new()
//! 			.template(el("span").child(interp("count")))
//! 			.state(|| scope! { "count" => 0 })
//! 			.method("increment", |ctx, _| {
//! 				ctx.update("count", |n| *n = Value::Int(n.as_i64().unwrap_or(0) + 1))
//! 			}),
//! 	)
//! 	.unwrap();
//!
//! let mut app = App::new(registry, MountHost::new().with_target("app"));
//! let counter = app.mount("Counter", "app").unwrap();
//! app.invoke(counter, "increment", &[]).unwrap();
//!
//! assert_eq!(app.html("app").unwrap(), "<span>1</span>");
//! ```

mod events;
mod host;
mod instance;
mod render;

use std::collections::HashMap;
use std::sync::Arc;

use sprig_core::{Scope, Value};

use crate::callback::LifecycleEvent;
use crate::definition::ComponentDefinition;
use crate::error::{ComponentError, ComponentResult, Diagnostic, Severity};
use crate::registry::ComponentRegistry;
use crate::settings::RuntimeSettings;
use crate::view::{ElementView, HtmlWriter, View};

pub use events::MethodContext;
pub use host::MountHost;
pub use instance::{HandlerId, InstanceId};

use instance::{InstanceRecord, Listener, SlotContent};
use render::{ChildRequest, RenderOutput, Renderer};

pub struct App {
	registry: Arc<ComponentRegistry>,
	settings: RuntimeSettings,
	host: MountHost,
	instances: HashMap<InstanceId, InstanceRecord>,
	roots: Vec<InstanceId>,
	/// Handlers from the current views, by id.
	handlers: HashMap<HandlerId, Listener>,
	diagnostics: Vec<Diagnostic>,
	dispatch_depth: usize,
	/// Nesting of `create_subtree` calls in progress.
	building: usize,
	/// Built instances whose mounted hooks wait for the outermost build.
	pending_mounts: Vec<InstanceId>,
}

impl App {
	pub fn new(registry: impl Into<Arc<ComponentRegistry>>, host: MountHost) -> Self {
		Self {
			registry: registry.into(),
			settings: RuntimeSettings::default(),
			host,
			instances: HashMap::new(),
			roots: Vec::new(),
			handlers: HashMap::new(),
			diagnostics: Vec::new(),
			dispatch_depth: 0,
			building: 0,
			pending_mounts: Vec::new(),
		}
	}

	pub fn with_settings(mut self, settings: RuntimeSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn settings(&self) -> &RuntimeSettings {
		&self.settings
	}

	pub fn registry(&self) -> &ComponentRegistry {
		&self.registry
	}

	pub fn host(&self) -> &MountHost {
		&self.host
	}

	// ========================================================================
	// Mounting
	// ========================================================================

	/// Mounts `component` at `target` and builds its whole subtree.
	///
	/// # Errors
	///
	/// - [`ComponentError::MountTargetNotFound`] / [`ComponentError::MountTargetOccupied`]
	/// - [`ComponentError::UnknownComponent`] for the root or any component in
	///   the initial tree; nothing stays mounted in that case
	pub fn mount(&mut self, component: &str, target: &str) -> ComponentResult<InstanceId> {
		self.mount_with_props(component, target, Scope::new())
	}

	/// Like [`mount`](Self::mount), passing `props` to the root.
	pub fn mount_with_props(
		&mut self,
		component: &str,
		target: &str,
		props: Scope,
	) -> ComponentResult<InstanceId> {
		if !self.host.has_target(target) {
			return Err(ComponentError::MountTargetNotFound(target.to_string()));
		}
		if let Some(instance) = self.host.occupant(target) {
			return Err(ComponentError::MountTargetOccupied {
				target: target.to_string(),
				instance,
			});
		}

		let definition = self.registry.resolve(component)?;
		let id = self.create_subtree(
			InstanceId::next(),
			definition,
			None,
			props,
			HashMap::new(),
			HashMap::new(),
		)?;

		if let Some(record) = self.instances.get_mut(&id) {
			record.target = Some(target.to_string());
		}
		self.host.occupy(target, id);
		self.roots.push(id);
		tracing::debug!(instance = %id, component, target, "mounted root");
		Ok(id)
	}

	/// Destroys `id` and its subtree, children before parents, and detaches it
	/// from its parent or mount target.
	pub fn unmount(&mut self, id: InstanceId) -> ComponentResult<()> {
		let record = self.record(id)?;
		let parent = record.parent;
		let target = record.target.clone();

		self.destroy(id);

		match parent {
			Some(parent) => {
				if let Some(record) = self.instances.get_mut(&parent) {
					record.children.retain(|child| *child != id);
					record.child_keys.retain(|_, child| *child != id);
				}
			}
			None => {
				self.roots.retain(|root| *root != id);
				if let Some(target) = target {
					self.host.release(&target);
				}
			}
		}
		Ok(())
	}

	// ========================================================================
	// Updates
	// ========================================================================

	/// Re-renders `id`, then every descendant whose inputs changed.
	pub fn update(&mut self, id: InstanceId) -> ComponentResult<()> {
		self.record(id)?;
		self.mark_dirty(id);
		self.update_instance(id)
	}

	/// Brings every mounted root up to date.
	pub fn flush(&mut self) -> ComponentResult<()> {
		let mut result = Ok(());
		for root in self.roots.clone() {
			let outcome = self.update_instance(root);
			if result.is_ok() {
				result = outcome;
			}
		}
		result
	}

	// ========================================================================
	// Interaction
	// ========================================================================

	/// Runs `method` on `id` with `args`, then flushes.
	pub fn invoke(&mut self, id: InstanceId, method: &str, args: &[Value]) -> ComponentResult<()> {
		let result = self.call_method(id, method, args);
		let flushed = self.flush();
		result.and(flushed)
	}

	/// Fires a rendered event handler with `payload` bound to `$event`, then
	/// flushes.
	pub fn trigger(&mut self, handler: HandlerId, payload: impl Into<Value>) -> ComponentResult<()> {
		let listener = self
			.handlers
			.get(&handler)
			.cloned()
			.ok_or(ComponentError::HandlerNotFound(handler))?;
		let result = self.dispatch(&listener, payload.into());
		let flushed = self.flush();
		result.and(flushed)
	}

	/// Emits `event` as if from `id`, then flushes. Does nothing if `id` is
	/// not mounted or its parent does not listen.
	pub fn emit(&mut self, id: InstanceId, event: &str, payload: impl Into<Value>) -> ComponentResult<()> {
		if !self.instances.contains_key(&id) {
			tracing::trace!(instance = %id, event, "emit from detached instance ignored");
			return Ok(());
		}
		let result = self.emit_from(id, event, payload.into());
		let flushed = self.flush();
		result.and(flushed)
	}

	// ========================================================================
	// Introspection
	// ========================================================================

	pub fn is_mounted(&self, id: InstanceId) -> bool {
		self.instances.contains_key(&id)
	}

	pub fn instance_count(&self) -> usize {
		self.instances.len()
	}

	pub fn roots(&self) -> &[InstanceId] {
		&self.roots
	}

	/// The instance's state; `None` if it is not mounted or a method is running.
	pub fn state(&self, id: InstanceId) -> Option<&Scope> {
		self.instances.get(&id).and_then(|r| r.state.as_ref())
	}

	pub fn props(&self, id: InstanceId) -> Option<&Scope> {
		self.instances.get(&id).map(|r| &r.props)
	}

	pub fn computed(&self, id: InstanceId) -> Option<&Scope> {
		self.instances.get(&id).map(|r| &r.computed)
	}

	pub fn children(&self, id: InstanceId) -> &[InstanceId] {
		self.instances
			.get(&id)
			.map(|r| r.children.as_slice())
			.unwrap_or(&[])
	}

	pub fn parent(&self, id: InstanceId) -> Option<InstanceId> {
		self.instances.get(&id).and_then(|r| r.parent)
	}

	pub fn component_name(&self, id: InstanceId) -> Option<&str> {
		self.instances.get(&id).map(InstanceRecord::name)
	}

	pub fn render_count(&self, id: InstanceId) -> usize {
		self.instances.get(&id).map_or(0, |r| r.render_count)
	}

	/// How many times the last render of `id` rendered slot `slot`.
	pub fn slot_render_count(&self, id: InstanceId, slot: &str) -> usize {
		self.instances
			.get(&id)
			.and_then(|r| r.slot_renders.get(slot).copied())
			.unwrap_or(0)
	}

	pub fn view(&self, id: InstanceId) -> Option<&View> {
		self.instances.get(&id).map(|r| &r.view)
	}

	pub fn diagnostics(&self) -> &[Diagnostic] {
		&self.diagnostics
	}

	pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
		std::mem::take(&mut self.diagnostics)
	}

	/// Renders `id` and its subtree as HTML.
	pub fn render_to_string(&self, id: InstanceId) -> ComponentResult<String> {
		let record = self.record(id)?;
		let mut out = String::new();
		HtmlWriter {
			resolve: |child: InstanceId| self.instances.get(&child).map(|r| &r.view),
			error_comments: self.settings.render_error_comments,
			out: &mut out,
		}
		.write(&record.view);
		Ok(out)
	}

	/// HTML of whatever is mounted at `target`; empty if nothing is.
	pub fn html(&self, target: &str) -> ComponentResult<String> {
		if !self.host.has_target(target) {
			return Err(ComponentError::MountTargetNotFound(target.to_string()));
		}
		match self.host.occupant(target) {
			Some(root) => self.render_to_string(root),
			None => Ok(String::new()),
		}
	}

	/// Every element rendered in the subtree of `root`, in document order.
	pub fn elements(&self, root: InstanceId) -> Vec<&ElementView> {
		let mut elements = Vec::new();
		if let Some(record) = self.instances.get(&root) {
			self.collect_elements(&record.view, &mut elements);
		}
		elements
	}

	/// The first handler for `event` on an element in the subtree of `root`
	/// that satisfies `predicate`.
	pub fn find_handler<P>(&self, root: InstanceId, event: &str, predicate: P) -> Option<HandlerId>
	where
		P: Fn(&ElementView) -> bool,
	{
		self.elements(root)
			.into_iter()
			.filter(|element| predicate(element))
			.find_map(|element| element.handler(event))
	}

	fn collect_elements<'a>(&'a self, view: &'a View, out: &mut Vec<&'a ElementView>) {
		match view {
			View::Element(element) => {
				out.push(element);
				for child in &element.children {
					self.collect_elements(child, out);
				}
			}
			View::Fragment(children) => {
				for child in children {
					self.collect_elements(child, out);
				}
			}
			View::Instance(id) => {
				if let Some(record) = self.instances.get(id) {
					self.collect_elements(&record.view, out);
				}
			}
			View::Text(_) | View::Failed(_) | View::Empty => {}
		}
	}

	// ========================================================================
	// Tree maintenance
	// ========================================================================

	fn record(&self, id: InstanceId) -> ComponentResult<&InstanceRecord> {
		self.instances
			.get(&id)
			.ok_or(ComponentError::InstanceNotFound(id))
	}

	fn record_mut(&mut self, id: InstanceId) -> ComponentResult<&mut InstanceRecord> {
		self.instances
			.get_mut(&id)
			.ok_or(ComponentError::InstanceNotFound(id))
	}

	/// Marks `id` for re-render and flags its ancestors so the update pass
	/// descends to it.
	fn mark_dirty(&mut self, id: InstanceId) {
		let mut parent = match self.instances.get_mut(&id) {
			Some(record) => {
				record.dirty = true;
				record.parent
			}
			None => return,
		};
		while let Some(ancestor) = parent {
			let Some(record) = self.instances.get_mut(&ancestor) else {
				break;
			};
			record.dirty_descendant = true;
			parent = record.parent;
		}
	}

	fn update_instance(&mut self, id: InstanceId) -> ComponentResult<()> {
		let force = !self.settings.incremental_updates;
		let Some(record) = self.instances.get(&id) else {
			return Ok(());
		};

		let mut result = Ok(());
		if record.dirty || force {
			result = self.render_instance(id);
		} else {
			tracing::debug!(instance = %id, "instance unchanged, skipping render");
		}

		let children = match self.instances.get(&id) {
			Some(record) if record.dirty_descendant || force => record.children.clone(),
			_ => return result,
		};
		for child in children {
			let outcome = self.update_instance(child);
			if result.is_ok() {
				result = outcome;
			}
		}
		// Rebinding children flags this instance again; every one was visited.
		if let Some(record) = self.instances.get_mut(&id) {
			record.dirty_descendant = false;
		}
		result
	}

	/// Creates an instance and renders its subtree. Mounted hooks run, children
	/// first, once the outermost build succeeds. On failure the partial subtree
	/// is destroyed without running any hook.
	fn create_subtree(
		&mut self,
		id: InstanceId,
		definition: Arc<ComponentDefinition>,
		parent: Option<InstanceId>,
		supplied: Scope,
		listeners: HashMap<String, Listener>,
		slots: HashMap<String, SlotContent>,
	) -> ComponentResult<InstanceId> {
		self.building += 1;
		let mark = self.pending_mounts.len();
		let result = self.build_subtree(id, definition, parent, supplied, listeners, slots);
		self.building -= 1;

		match result {
			Ok(()) => {
				self.pending_mounts.push(id);
				if self.building == 0 {
					self.run_mounted_hooks();
				}
				Ok(id)
			}
			Err(err) => {
				self.pending_mounts.truncate(mark);
				Err(err)
			}
		}
	}

	fn build_subtree(
		&mut self,
		id: InstanceId,
		definition: Arc<ComponentDefinition>,
		parent: Option<InstanceId>,
		supplied: Scope,
		listeners: HashMap<String, Listener>,
		slots: HashMap<String, SlotContent>,
	) -> ComponentResult<()> {
		let name = definition.name().to_string();
		let resolved = definition
			.props()
			.resolve(&name, &supplied, self.settings.warn_unknown_props);

		let mut record = InstanceRecord::new(definition, parent, supplied, resolved.values);
		record.listeners = listeners;
		record.slots = slots;
		self.instances.insert(id, record);
		tracing::debug!(instance = %id, component = %name, "created instance");
		self.report(id, &name, resolved.problems);

		if let Err(err) = self.render_instance(id) {
			self.destroy(id);
			return Err(err);
		}
		Ok(())
	}

	fn run_mounted_hooks(&mut self) {
		for id in std::mem::take(&mut self.pending_mounts) {
			let Some(record) = self.instances.get_mut(&id) else {
				continue;
			};
			record.mounted = true;
			let hooks = record.definition.on_mounted.clone();
			let event = LifecycleEvent {
				instance: id,
				component: record.name().to_string(),
			};
			for hook in hooks {
				hook.call(event.clone());
			}
		}
	}

	/// Renders `id` and applies the result. Expression errors fail only this
	/// instance's view; structural errors are also returned.
	fn render_instance(&mut self, id: InstanceId) -> ComponentResult<()> {
		let result = Renderer::new(self, id)?.render();
		match result {
			Ok(output) => self.apply_render(id, output),
			Err(err) => {
				let structural = err.is_structural();
				self.fail_render(id, err.clone());
				if structural { Err(err) } else { Ok(()) }
			}
		}
	}

	fn apply_render(&mut self, id: InstanceId, output: RenderOutput) -> ComponentResult<()> {
		let RenderOutput {
			view,
			computed,
			children,
			handlers,
			slot_renders,
		} = output;

		let record = self.record_mut(id)?;
		record.view = view;
		record.computed = computed;
		record.slot_renders = slot_renders;
		record.render_count += 1;
		record.dirty = false;
		let stale_handlers = std::mem::replace(
			&mut record.handler_ids,
			handlers.iter().map(|(handler, _)| *handler).collect(),
		);
		tracing::debug!(
			instance = %id,
			component = record.name(),
			renders = record.render_count,
			"rendered instance"
		);

		for handler in stale_handlers {
			self.handlers.remove(&handler);
		}
		self.handlers.extend(handlers);
		self.reconcile(id, children)
	}

	fn fail_render(&mut self, id: InstanceId, error: ComponentError) {
		if let Some(record) = self.instances.get_mut(&id) {
			record.render_count += 1;
			record.dirty = false;
		}
		self.fail_view(id, error);
	}

	/// Replaces the view of `id` with a failure and records the error.
	fn fail_view(&mut self, id: InstanceId, error: ComponentError) {
		let Some(record) = self.instances.get_mut(&id) else {
			return;
		};
		record.view = View::Failed(error.to_string());
		let stale_handlers = std::mem::take(&mut record.handler_ids);
		let name = record.name().to_string();

		for handler in stale_handlers {
			self.handlers.remove(&handler);
		}
		tracing::warn!(instance = %id, component = %name, error = %error, "render failed");
		self.diagnostics.push(Diagnostic {
			instance: id,
			component: name,
			severity: Severity::Error,
			error,
		});
	}

	/// Matches the children a render asked for against the existing ones:
	/// reuses and rebinds matches, creates the rest and destroys the leftovers.
	fn reconcile(&mut self, id: InstanceId, requests: Vec<ChildRequest>) -> ComponentResult<()> {
		let mut children = Vec::with_capacity(requests.len());
		let mut child_keys = HashMap::with_capacity(requests.len());
		let mut result = Ok(());

		for request in requests {
			let ChildRequest {
				key,
				id: child,
				existing,
				definition,
				supplied,
				listeners,
				slots,
			} = request;

			if existing && self.instances.contains_key(&child) {
				self.rebind(child, supplied, listeners, slots);
			} else if let Err(err) =
				self.create_subtree(child, definition, Some(id), supplied, listeners, slots)
			{
				if result.is_ok() {
					result = Err(err);
				}
				continue;
			}
			children.push(child);
			child_keys.insert(key, child);
		}

		let record = self.record_mut(id)?;
		let previous = std::mem::replace(&mut record.children, children);
		record.child_keys = child_keys;
		let stale: Vec<InstanceId> = previous
			.into_iter()
			.filter(|child| !record.children.contains(child))
			.collect();
		let mounted = record.mounted;
		for child in stale {
			self.destroy(child);
		}

		// Mounted parents stay in the tree with a failed view.
		if let Err(err) = &result {
			if mounted {
				self.fail_view(id, err.clone());
			}
		}
		result
	}

	/// Hands new props, listeners and slot content to an existing child.
	fn rebind(
		&mut self,
		id: InstanceId,
		supplied: Scope,
		listeners: HashMap<String, Listener>,
		slots: HashMap<String, SlotContent>,
	) {
		let warn_unknown = self.settings.warn_unknown_props;
		let Some(record) = self.instances.get_mut(&id) else {
			return;
		};
		let name = record.name().to_string();

		// Slot content may read anything from the parent, so it always
		// re-renders with it.
		let mut dirty = !record.slots.is_empty() || !slots.is_empty();
		record.listeners = listeners;
		record.slots = slots;

		let mut problems = Vec::new();
		if record.supplied != supplied {
			let resolved = record
				.definition
				.props()
				.resolve(&name, &supplied, warn_unknown);
			dirty |= resolved.values != record.props;
			record.props = resolved.values;
			record.supplied = supplied;
			problems = resolved.problems;
		}

		self.report(id, &name, problems);
		if dirty {
			self.mark_dirty(id);
		}
	}

	/// Removes `id` and its subtree, children first.
	fn destroy(&mut self, id: InstanceId) {
		let children = match self.instances.get(&id) {
			Some(record) => record.children.clone(),
			None => return,
		};
		for child in children {
			self.destroy(child);
		}

		let Some(record) = self.instances.remove(&id) else {
			return;
		};
		for handler in &record.handler_ids {
			self.handlers.remove(handler);
		}
		tracing::debug!(instance = %id, component = record.name(), "unmounted instance");

		if record.mounted {
			let event = LifecycleEvent {
				instance: id,
				component: record.name().to_string(),
			};
			for hook in &record.definition.on_unmounted {
				hook.call(event.clone());
			}
		}
	}

	fn report(&mut self, id: InstanceId, component: &str, problems: Vec<ComponentError>) {
		for error in problems {
			tracing::warn!(instance = %id, component, error = %error, "prop diagnostic");
			self.diagnostics.push(Diagnostic {
				instance: id,
				component: component.to_string(),
				severity: Severity::Warning,
				error,
			});
		}
	}
}

impl std::fmt::Debug for App {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("App")
			.field("settings", &self.settings)
			.field("host", &self.host)
			.field("roots", &self.roots)
			.field("instances", &self.instances.len())
			.field("diagnostics", &self.diagnostics.len())
			.finish_non_exhaustive()
	}
}
