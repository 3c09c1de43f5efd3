//! # Sprig Components
//!
//! The component model of sprig: a registry of named component definitions,
//! a tree of live instances, one-way prop binding from parent to child,
//! one-hop events from child to parent, and scoped slots.
//!
//! ## Modules
//!
//! - [`registry`]: [`ComponentRegistry`], name to definition
//! - [`definition`]: [`ComponentDefinition`] builder
//! - [`template`]: template nodes and constructors
//! - [`props`]: prop declarations and validation
//! - [`app`]: [`App`], the instance tree and its update cycle
//! - [`view`]: rendered output and HTML serialization
//! - [`settings`]: [`RuntimeSettings`] loaded from TOML and the environment
//!
//! ## Quick Start
//!
//! ```
//! use sprig_components::template::{component, el, for_each, interp};
//! use sprig_components::{
//! 	App, ComponentDefinition, ComponentRegistry, MountHost, PropDescriptor, PropType,
//! };
//! use sprig_core::scope;
//!
//! let mut registry = ComponentRegistry::new();
//! registry
//! 	.register(
//! 		"Item",
//! 		ComponentDefinition::new()
//! 			.prop(PropDescriptor::new("label", PropType::String).required())
//! 			.template(el("li").child(interp("label"))),
//! 	)
//! 	.unwrap();
//! registry
//! 	.register(
//! 		"List",
//! 		ComponentDefinition::new()
//! 			.state(|| scope! { "items" => vec!["a", "b"] })
//! 			.template(el("ul").child(for_each(
//! 				"item in items",
//! 				component("Item").prop("label", "item"),
//! 			))),
//! 	)
//! 	.unwrap();
//!
//! let mut app = App::new(registry, MountHost::new().with_target("app"));
//! let list = app.mount("List", "app").unwrap();
//!
//! assert_eq!(app.children(list).len(), 2);
//! assert_eq!(app.html("app").unwrap(), "<ul><li>a</li><li>b</li></ul>");
//! ```

pub mod app;
pub mod callback;
pub mod definition;
pub mod error;
pub mod props;
pub mod registry;
pub mod settings;
pub mod template;
pub mod view;

pub use app::{App, HandlerId, InstanceId, MethodContext, MountHost};
pub use callback::{Callback, LifecycleEvent, LifecycleHook};
pub use definition::ComponentDefinition;
pub use error::{ComponentError, ComponentResult, Diagnostic, Severity};
pub use props::{PropDescriptor, PropSchema, PropType, ResolvedProps};
pub use registry::ComponentRegistry;
pub use settings::{RuntimeSettings, SettingsError};
pub use view::{ElementView, View};
