//! Method invocation and the event channel.
//!
//! Events travel exactly one hop: `emit` looks up the listener the parent
//! registered on the emitting instance and runs the parent's method before
//! returning. There is no bubbling and no global bus; an event nobody listens
//! to is dropped.

use std::sync::Arc;

use sprig_core::{Scope, Value, scope};

use super::App;
use super::instance::{InstanceId, Listener};
use super::render::base_chain;
use crate::definition::ComponentDefinition;
use crate::error::{ComponentError, ComponentResult};
use crate::settings::RuntimeSettings;

/// Access to an instance from inside one of its methods.
///
/// State writes go through [`set`](Self::set) and [`update`](Self::update),
/// which refuse to touch declared props.
pub struct MethodContext<'a> {
	app: &'a mut App,
	instance: InstanceId,
	definition: &'a ComponentDefinition,
	state: &'a mut Scope,
	props: &'a Scope,
	mutated: bool,
}

impl MethodContext<'_> {
	pub fn instance(&self) -> InstanceId {
		self.instance
	}

	pub fn component(&self) -> &str {
		self.definition.name()
	}

	/// Reads a state value, falling back to props.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.state.get(name).or_else(|| self.props.get(name))
	}

	pub fn state(&self) -> &Scope {
		&*self.state
	}

	pub fn prop(&self, name: &str) -> Option<&Value> {
		self.props.get(name)
	}

	pub fn props(&self) -> &Scope {
		self.props
	}

	pub fn settings(&self) -> &RuntimeSettings {
		&self.app.settings
	}

	/// Writes a state value.
	///
	/// # Errors
	///
	/// [`ComponentError::PropMutation`] if `name` is a declared prop.
	pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ComponentResult<()> {
		self.ensure_writable(name)?;
		self.state.insert(name, value);
		self.mutated = true;
		Ok(())
	}

	/// Updates a state value in place. A missing value starts as `undefined`.
	pub fn update<F>(&mut self, name: &str, f: F) -> ComponentResult<()>
	where
		F: FnOnce(&mut Value),
	{
		self.ensure_writable(name)?;
		if !self.state.contains(name) {
			self.state.insert(name, Value::Undefined);
		}
		if let Some(value) = self.state.get_mut(name) {
			f(value);
		}
		self.mutated = true;
		Ok(())
	}

	/// Emits `event` to the listener the parent registered on this instance.
	///
	/// The listener runs synchronously; its effects on the parent are visible
	/// when this returns. Without a listener this does nothing.
	pub fn emit(&mut self, event: &str, payload: impl Into<Value>) -> ComponentResult<()> {
		self.app.emit_from(self.instance, event, payload.into())
	}

	fn ensure_writable(&self, name: &str) -> ComponentResult<()> {
		if self.definition.props().contains(name) {
			tracing::warn!(
				instance = %self.instance,
				component = self.definition.name(),
				prop = name,
				"method attempted to write a prop"
			);
			return Err(ComponentError::PropMutation {
				component: self.definition.name().to_string(),
				prop: name.to_string(),
			});
		}
		Ok(())
	}
}

impl App {
	pub(crate) fn emit_from(
		&mut self,
		source: InstanceId,
		event: &str,
		payload: Value,
	) -> ComponentResult<()> {
		let Some(record) = self.instances.get(&source) else {
			tracing::trace!(instance = %source, event, "emit from detached instance ignored");
			return Ok(());
		};
		let Some(listener) = record.listeners.get(event).cloned() else {
			tracing::trace!(instance = %source, event, "no listener for event");
			return Ok(());
		};
		if !self.instances.contains_key(&listener.owner) {
			tracing::trace!(instance = %source, event, "listener owner is gone");
			return Ok(());
		}

		tracing::trace!(
			instance = %source,
			owner = %listener.owner,
			event,
			method = %listener.call.method,
			"dispatching event"
		);
		self.dispatch(&listener, payload)
	}

	/// Runs a bound handler with `payload` as `$event`.
	pub(crate) fn dispatch(&mut self, listener: &Listener, payload: Value) -> ComponentResult<()> {
		let args = match &listener.call.args {
			None => vec![payload],
			Some(exprs) => {
				let owner = self.record(listener.owner)?;
				let mut chain = base_chain(owner);
				for frame in &listener.captured {
					chain.push(frame);
				}
				chain.push_owned(scope! { "$event" => payload });
				exprs
					.iter()
					.map(|expr| expr.eval(&chain))
					.collect::<Result<Vec<_>, _>>()
					.map_err(|err| ComponentError::from_eval(owner.name(), err))?
			}
		};
		self.call_method(listener.owner, &listener.call.method, &args)
	}

	/// Runs `method` on `id` without flushing.
	pub(crate) fn call_method(
		&mut self,
		id: InstanceId,
		method: &str,
		args: &[Value],
	) -> ComponentResult<()> {
		let max_depth = self.settings.max_dispatch_depth;
		if self.dispatch_depth >= max_depth {
			return Err(ComponentError::DispatchDepthExceeded(max_depth));
		}

		let record = self.record_mut(id)?;
		let definition = Arc::clone(&record.definition);
		let method_fn =
			definition
				.method_fn(method)
				.ok_or_else(|| ComponentError::UnknownMethod {
					component: definition.name().to_string(),
					method: method.to_string(),
				})?;
		let mut state = record.state.take().ok_or(ComponentError::InstanceBusy(id))?;
		let props = record.props.clone();

		tracing::debug!(instance = %id, component = definition.name(), method, "invoking method");
		self.dispatch_depth += 1;
		let (result, mutated) = {
			let mut ctx = MethodContext {
				app: &mut *self,
				instance: id,
				definition: &definition,
				state: &mut state,
				props: &props,
				mutated: false,
			};
			let result = method_fn(&mut ctx, args);
			(result, ctx.mutated)
		};
		self.dispatch_depth -= 1;

		if let Some(record) = self.instances.get_mut(&id) {
			record.state = Some(state);
		}
		if mutated {
			self.mark_dirty(id);
		}
		result
	}
}
