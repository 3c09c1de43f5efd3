//! # Sprig
//!
//! A small component model: components are registered by name, mounted into
//! a tree of instances, fed props by their parents, report back through
//! one-hop events and let parents fill their slots with templates that see
//! the child's slot data.
//!
//! This crate re-exports the two workspace crates:
//!
//! - [`core`]: values, scopes and the binding expression language
//! - [`components`]: registry, instance tree, props, events and slots
//!
//! ## Example
//!
//! ```
//! use sprig::prelude::*;
//! use sprig::components::template::{el, interp};
//!
//! let registry = ComponentRegistry::new()
//! 	.with(
//! 		"Greeting",
//! 		ComponentDefinition::new()
//! 			.prop(PropDescriptor::new("name", PropType::String).default_value("world"))
//! 			.template(el("p").child("Hello, ").child(interp("name"))),
//! 	)
//! 	.unwrap();
//!
//! let mut app = App::new(registry, MountHost::new().with_target("main"));
//! app.mount("Greeting", "main").unwrap();
//! assert_eq!(app.html("main").unwrap(), "<p>Hello, world</p>");
//! ```

pub use sprig_components as components;
pub use sprig_core as core;

pub mod prelude {
	// Values and scopes
	pub use sprig_core::{Scope, Value, scope};

	// Component model
	pub use sprig_components::{
		App, ComponentDefinition, ComponentError, ComponentRegistry, ComponentResult, HandlerId,
		InstanceId, MethodContext, MountHost, PropDescriptor, PropType, RuntimeSettings,
	};
}
