//! Component registry.
//!
//! Maps names to [`ComponentDefinition`]s. Names are matched exactly first and
//! then by their kebab-case form, so a component registered as `TodoList` can
//! be placed in a template as `todo-list`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::ComponentDefinition;
use crate::error::{ComponentError, ComponentResult};

#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
	components: HashMap<String, Arc<ComponentDefinition>>,
	/// kebab-case name -> registered name
	normalized: HashMap<String, String>,
}

impl ComponentRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `definition` under `name`.
	///
	/// # Errors
	///
	/// - [`ComponentError::InvalidName`] for an empty or malformed name
	/// - [`ComponentError::DuplicateName`] if the name, or its kebab-case form,
	///   is already taken
	/// - [`ComponentError::InvalidTemplate`] if an expression in the template
	///   does not parse
	pub fn register(
		&mut self,
		name: impl Into<String>,
		mut definition: ComponentDefinition,
	) -> ComponentResult<()> {
		let name = name.into();
		validate_name(&name)?;

		let normalized = to_kebab_case(&name);
		if self.components.contains_key(&name) || self.normalized.contains_key(&normalized) {
			return Err(ComponentError::DuplicateName(name));
		}

		definition
			.template
			.validate()
			.map_err(|source| ComponentError::InvalidTemplate {
				component: name.clone(),
				source,
			})?;

		tracing::debug!(component = %name, "registered component");
		definition.name = name.clone();
		self.normalized.insert(normalized, name.clone());
		self.components.insert(name, Arc::new(definition));
		Ok(())
	}

	/// Builder-style [`register`](Self::register).
	pub fn with(mut self, name: impl Into<String>, definition: ComponentDefinition) -> ComponentResult<Self> {
		self.register(name, definition)?;
		Ok(self)
	}

	pub fn resolve(&self, name: &str) -> ComponentResult<Arc<ComponentDefinition>> {
		self.components
			.get(name)
			.or_else(|| {
				self.normalized
					.get(&to_kebab_case(name))
					.and_then(|registered| self.components.get(registered))
			})
			.cloned()
			.ok_or_else(|| ComponentError::UnknownComponent(name.to_string()))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.resolve(name).is_ok()
	}

	/// Registered names, sorted.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	pub fn len(&self) -> usize {
		self.components.len()
	}

	pub fn is_empty(&self) -> bool {
		self.components.is_empty()
	}
}

fn validate_name(name: &str) -> ComponentResult<()> {
	let mut chars = name.chars();
	let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
	if valid {
		Ok(())
	} else {
		Err(ComponentError::InvalidName(name.to_string()))
	}
}

/// `TodoList`, `todoList` and `todo_list` all become `todo-list`.
pub(crate) fn to_kebab_case(name: &str) -> String {
	let mut out = String::with_capacity(name.len() + 4);
	let mut previous_lower = false;
	for c in name.chars() {
		if c == '_' || c == '-' {
			out.push('-');
			previous_lower = false;
		} else if c.is_ascii_uppercase() {
			if previous_lower {
				out.push('-');
			}
			out.push(c.to_ascii_lowercase());
			previous_lower = false;
		} else {
			out.push(c);
			previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::template::{el, interp};
	use rstest::{fixture, rstest};

	#[fixture]
	fn registry() -> ComponentRegistry {
		ComponentRegistry::new()
			.with("TodoList", ComponentDefinition::new())
			.unwrap()
	}

	#[rstest]
	#[case("TodoList", "todo-list")]
	#[case("todoList", "todo-list")]
	#[case("todo_list", "todo-list")]
	#[case("todo-list", "todo-list")]
	#[case("Item2Row", "item2-row")]
	#[case("HTMLView", "htmlview")]
	fn test_kebab_case(#[case] name: &str, #[case] expected: &str) {
		assert_eq!(to_kebab_case(name), expected);
	}

	#[rstest]
	#[case("TodoList")]
	#[case("todo-list")]
	#[case("todo_list")]
	fn test_resolve_by_normalized_name(registry: ComponentRegistry, #[case] name: &str) {
		let definition = registry.resolve(name).unwrap();
		assert_eq!(definition.name(), "TodoList");
	}

	#[rstest]
	fn test_duplicate_normalized_name(mut registry: ComponentRegistry) {
		assert_eq!(
			registry.register("todo-list", ComponentDefinition::new()),
			Err(ComponentError::DuplicateName("todo-list".into()))
		);
		assert_eq!(registry.len(), 1);
	}

	#[rstest]
	fn test_unknown_component(registry: ComponentRegistry) {
		assert_eq!(
			registry.resolve("Missing").unwrap_err(),
			ComponentError::UnknownComponent("Missing".into())
		);
	}

	#[rstest]
	#[case("")]
	#[case("1st")]
	#[case("-item")]
	#[case("todo list")]
	#[case("todo.list")]
	fn test_invalid_names(mut registry: ComponentRegistry, #[case] name: &str) {
		assert_eq!(
			registry.register(name, ComponentDefinition::new()),
			Err(ComponentError::InvalidName(name.into()))
		);
	}

	#[rstest]
	fn test_invalid_template_is_rejected(mut registry: ComponentRegistry) {
		let result = registry.register(
			"Broken",
			ComponentDefinition::new().template(el("p").child(interp("count +"))),
		);
		assert!(matches!(
			result,
			Err(ComponentError::InvalidTemplate { ref component, .. }) if component == "Broken"
		));
		assert!(!registry.contains("Broken"));
	}

	#[rstest]
	fn test_names_are_sorted(mut registry: ComponentRegistry) {
		registry.register("Counter", ComponentDefinition::new()).unwrap();
		assert_eq!(registry.names(), vec!["Counter", "TodoList"]);
	}
}
