//! Error types for the component runtime.

use std::fmt;

use sprig_core::{EvalError, ExprError};
use thiserror::Error;

use crate::app::{HandlerId, InstanceId};

/// Errors raised by the registry, the instance tree and the event channel.
///
/// Structural errors (unknown components, missing mount targets, duplicate
/// registrations) are returned to the caller. Prop and render errors are
/// recorded as [`Diagnostic`]s on the [`App`](crate::App) instead.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ComponentError {
	/// A component with the same (normalized) name is already registered.
	#[error("component already registered: {0}")]
	DuplicateName(String),

	/// No component is registered under the name.
	#[error("unknown component: {0}")]
	UnknownComponent(String),

	/// The name is empty, does not start with a letter or contains characters
	/// other than ASCII alphanumerics, `-` and `_`.
	#[error("invalid component name: {0:?}")]
	InvalidName(String),

	/// An expression in the component's template failed to parse.
	#[error("invalid template for component {component}: {source}")]
	InvalidTemplate {
		component: String,
		#[source]
		source: ExprError,
	},

	/// The mount host has no target with this name.
	#[error("mount target not found: {0}")]
	MountTargetNotFound(String),

	/// The mount target already holds a root instance.
	#[error("mount target {target} is occupied by instance {instance}")]
	MountTargetOccupied { target: String, instance: InstanceId },

	/// A supplied prop value does not match the declared type.
	#[error("prop `{prop}` of {component} expects {expected}, got {actual}")]
	PropTypeMismatch {
		component: String,
		prop: String,
		expected: String,
		actual: &'static str,
	},

	/// A required prop was not supplied and has no default.
	#[error("missing required prop `{prop}` of {component}")]
	MissingProp { component: String, prop: String },

	/// A prop was supplied that the component does not declare.
	#[error("unknown prop `{prop}` passed to {component}")]
	UnknownProp { component: String, prop: String },

	/// A method tried to write to one of its instance's props.
	#[error("prop `{prop}` of {component} is read-only")]
	PropMutation { component: String, prop: String },

	/// A template expression referenced a name that no frame defines.
	#[error("unresolved binding `{0}`")]
	UnresolvedBinding(String),

	/// A template expression failed to evaluate.
	#[error("render error in {component}: {source}")]
	Render {
		component: String,
		#[source]
		source: EvalError,
	},

	/// The instance id does not refer to a mounted instance.
	#[error("instance {0} is not mounted")]
	InstanceNotFound(InstanceId),

	/// The component declares no method with this name.
	#[error("component {component} has no method `{method}`")]
	UnknownMethod { component: String, method: String },

	/// A method was invoked on an instance that is already running one.
	#[error("instance {0} is already executing a method")]
	InstanceBusy(InstanceId),

	/// Event dispatch nested deeper than the configured limit.
	#[error("event dispatch exceeded the maximum depth of {0}")]
	DispatchDepthExceeded(usize),

	/// No rendered handler with this id exists.
	#[error("no rendered handler with id {0}")]
	HandlerNotFound(HandlerId),

	/// A method reported a failure of its own.
	#[error("method `{method}` failed: {message}")]
	Method { method: String, message: String },
}

impl ComponentError {
	/// Maps an evaluation error raised while rendering `component`.
	pub(crate) fn from_eval(component: &str, err: EvalError) -> Self {
		match err {
			EvalError::UnresolvedBinding(name) => Self::UnresolvedBinding(name),
			source => Self::Render {
				component: component.to_string(),
				source,
			},
		}
	}

	/// Errors that abort building a subtree instead of failing a single view.
	pub(crate) fn is_structural(&self) -> bool {
		matches!(self, Self::UnknownComponent(_))
	}

	/// Builds a [`ComponentError::Method`] from inside a method body.
	pub fn method(method: impl Into<String>, message: impl fmt::Display) -> Self {
		Self::Method {
			method: method.into(),
			message: message.to_string(),
		}
	}
}

/// Result alias for component operations.
pub type ComponentResult<T> = Result<T, ComponentError>;

/// How serious a recorded diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	Warning,
	Error,
}

/// A non-fatal error recorded while mounting or rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
	pub instance: InstanceId,
	pub component: String,
	pub severity: Severity,
	pub error: ComponentError,
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let level = match self.severity {
			Severity::Warning => "warning",
			Severity::Error => "error",
		};
		write!(f, "{level} [{} {}]: {}", self.component, self.instance, self.error)
	}
}
