//! Prop schemas and prop resolution.
//!
//! A parent binds props at each child site; the child resolves them against its
//! declared schema. Resolution never fails: type mismatches, missing required
//! props and undeclared props are reported alongside the resolved values so the
//! runtime can record them as diagnostics.

use std::fmt;

use sprig_core::{Scope, Value};

use crate::error::ComponentError;

/// Declared type of a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropType {
	/// Accepts any value, including `null`.
	#[default]
	Any,
	Bool,
	Int,
	/// Integers and floats.
	Number,
	String,
	List,
	Object,
}

impl PropType {
	pub fn accepts(self, value: &Value) -> bool {
		match self {
			Self::Any => true,
			Self::Bool => matches!(value, Value::Bool(_)),
			Self::Int => matches!(value, Value::Int(_)),
			Self::Number => matches!(value, Value::Int(_) | Value::Float(_)),
			Self::String => matches!(value, Value::String(_)),
			Self::List => matches!(value, Value::List(_)),
			Self::Object => matches!(value, Value::Object(_)),
		}
	}
}

impl fmt::Display for PropType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Any => "any",
			Self::Bool => "boolean",
			Self::Int => "int",
			Self::Number => "number",
			Self::String => "string",
			Self::List => "list",
			Self::Object => "object",
		})
	}
}

/// One declared prop.
#[derive(Debug, Clone, PartialEq)]
pub struct PropDescriptor {
	pub name: String,
	pub ty: PropType,
	pub required: bool,
	/// Cloned into every instance that does not receive the prop.
	pub default: Option<Value>,
}

impl PropDescriptor {
	pub fn new(name: impl Into<String>, ty: PropType) -> Self {
		Self {
			name: name.into(),
			ty,
			required: false,
			default: None,
		}
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn default_value(mut self, value: impl Into<Value>) -> Self {
		self.default = Some(value.into());
		self
	}
}

/// The ordered set of props a component declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropSchema {
	props: Vec<PropDescriptor>,
}

impl PropSchema {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a descriptor.
	pub fn insert(&mut self, descriptor: PropDescriptor) {
		match self.props.iter_mut().find(|p| p.name == descriptor.name) {
			Some(existing) => *existing = descriptor,
			None => self.props.push(descriptor),
		}
	}

	pub fn get(&self, name: &str) -> Option<&PropDescriptor> {
		self.props.iter().find(|p| p.name == name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	pub fn iter(&self) -> impl Iterator<Item = &PropDescriptor> {
		self.props.iter()
	}

	pub fn len(&self) -> usize {
		self.props.len()
	}

	pub fn is_empty(&self) -> bool {
		self.props.is_empty()
	}

	/// Resolves the values a parent supplied against this schema.
	///
	/// An `undefined` value counts as not supplied. A value of the wrong type
	/// is reported and replaced by the declared default, or `undefined`.
	pub fn resolve(&self, component: &str, supplied: &Scope, warn_unknown: bool) -> ResolvedProps {
		let mut resolved = ResolvedProps::default();

		for descriptor in &self.props {
			let value = match supplied.get(&descriptor.name).filter(|v| !v.is_undefined()) {
				Some(value) if descriptor.ty.accepts(value) => value.clone(),
				Some(value) => {
					resolved.problems.push(ComponentError::PropTypeMismatch {
						component: component.to_string(),
						prop: descriptor.name.clone(),
						expected: descriptor.ty.to_string(),
						actual: value.type_name(),
					});
					descriptor.default.clone().unwrap_or_default()
				}
				None => match &descriptor.default {
					Some(default) => default.clone(),
					None => {
						if descriptor.required {
							resolved.problems.push(ComponentError::MissingProp {
								component: component.to_string(),
								prop: descriptor.name.clone(),
							});
						}
						Value::Undefined
					}
				},
			};
			resolved.values.insert(descriptor.name.clone(), value);
		}

		if warn_unknown {
			for name in supplied.keys().filter(|name| !self.contains(name)) {
				resolved.problems.push(ComponentError::UnknownProp {
					component: component.to_string(),
					prop: name.to_string(),
				});
			}
		}

		resolved
	}
}

impl FromIterator<PropDescriptor> for PropSchema {
	fn from_iter<I: IntoIterator<Item = PropDescriptor>>(iter: I) -> Self {
		let mut schema = Self::new();
		for descriptor in iter {
			schema.insert(descriptor);
		}
		schema
	}
}

/// Outcome of [`PropSchema::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProps {
	/// One entry per declared prop.
	pub values: Scope,
	/// Non-fatal problems found while resolving.
	pub problems: Vec<ComponentError>,
}
