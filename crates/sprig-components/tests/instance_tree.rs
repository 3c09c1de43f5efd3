//! Instance Tree Behavior Tests
//!
//! # Test Categories
//!
//! - Mounting: targets, unknown components and teardown
//! - Props: type mismatches and read-only props
//! - Events: no-op emits, synchronous dispatch, detached instances, depth limit
//! - Slots: shadowing and unresolved names
//! - Updates: incremental and full re-rendering
//! - Lifecycle: hook order on mount and unmount

use std::sync::Arc;

use parking_lot::Mutex;
use rstest::*;
use sprig_components::template::{
	Node, component, el, for_each, fragment, if_, interp, slot, template_slot, text,
};
use sprig_components::{
	App, ComponentDefinition, ComponentError, ComponentRegistry, InstanceId, LifecycleEvent,
	MountHost, PropDescriptor, PropType, RuntimeSettings, Severity,
};
use sprig_core::{EvalError, Resolve, Value, scope};

type Log = Arc<Mutex<Vec<String>>>;

// =============================================================================
// Fixtures
// =============================================================================

#[fixture]
fn log() -> Log {
	Arc::new(Mutex::new(Vec::new()))
}

fn counter() -> ComponentDefinition {
	ComponentDefinition::new()
		.state(|| scope! { "count" => 0 })
		.computed("doubled", |chain| {
			chain
				.lookup("count")
				.and_then(Value::as_i64)
				.map(|n| Value::Int(n * 2))
				.unwrap_or_default()
		})
		.template(el("span").child(interp("count")).child("/").child(interp("doubled")))
		.method("increment", |ctx, _args| {
			ctx.update("count", |count| *count = Value::Int(count.as_i64().unwrap_or(0) + 1))?;
			let count = ctx.get("count").cloned().unwrap_or_default();
			ctx.emit("change", count)
		})
}

fn pair() -> ComponentDefinition {
	ComponentDefinition::new()
		.state(|| scope! { "total" => 0 })
		.template(
			el("div")
				.child(component("Counter").on("change", "add($event)"))
				.child(component("Counter").on("change", "add($event)")),
		)
		.method("add", |ctx, args| {
			let amount = args.first().and_then(Value::as_i64).unwrap_or(0);
			ctx.update("total", |total| *total = Value::Int(total.as_i64().unwrap_or(0) + amount))
		})
}

fn registry_with(extra: Vec<(&str, ComponentDefinition)>) -> ComponentRegistry {
	let mut registry = ComponentRegistry::new();
	registry.register("Counter", counter()).unwrap();
	registry.register("Pair", pair()).unwrap();
	for (name, definition) in extra {
		registry.register(name, definition).unwrap();
	}
	registry
}

fn host() -> MountHost {
	MountHost::new().with_target("app").with_target("aside")
}

fn total(app: &App, id: InstanceId) -> Option<&Value> {
	app.state(id).and_then(|state| state.get("total"))
}

// =============================================================================
// Mounting
// =============================================================================

#[rstest]
fn test_mount_target_errors() {
	let mut app = App::new(registry_with(vec![]), host());

	assert_eq!(
		app.mount("Counter", "missing"),
		Err(ComponentError::MountTargetNotFound("missing".into()))
	);

	let first = app.mount("Counter", "app").unwrap();
	assert_eq!(
		app.mount("Counter", "app"),
		Err(ComponentError::MountTargetOccupied {
			target: "app".into(),
			instance: first,
		})
	);
	assert_eq!(app.host().occupant("app"), Some(first));
}

#[rstest]
fn test_unknown_component_tears_down_partial_tree(log: Log) {
	let broken = ComponentDefinition::new()
		.template(el("div").child(component("Counter")).child(component("Missing")));
	let nested = ComponentDefinition::new()
		.template(el("div").child(component("Leaf")).child(component("Wrapper")));
	let mut app = App::new(
		registry_with(vec![
			("Broken", broken),
			("Nested", nested),
			("Wrapper", wrapper()),
			("Leaf", logged(&log, el("i"))),
		]),
		host(),
	);

	assert_eq!(
		app.mount("Broken", "app"),
		Err(ComponentError::UnknownComponent("Missing".into()))
	);
	assert_eq!(app.instance_count(), 0);
	assert!(app.roots().is_empty());
	assert_eq!(app.host().occupant("app"), None);
	assert_eq!(app.html("app").unwrap(), "");

	assert_eq!(
		app.mount("Unregistered", "app"),
		Err(ComponentError::UnknownComponent("Unregistered".into()))
	);

	// A sibling built before the failure is discarded without running hooks.
	assert_eq!(
		app.mount("Nested", "app"),
		Err(ComponentError::UnknownComponent("Missing".into()))
	);
	assert_eq!(app.instance_count(), 0);
	assert_eq!(app.host().occupant("app"), None);
	assert!(log.lock().is_empty());
}

fn wrapper() -> ComponentDefinition {
	ComponentDefinition::new().template(el("p").child(component("Missing")))
}

#[rstest]
fn test_unknown_component_during_update_fails_parent_view() {
	let switcher = ComponentDefinition::new()
		.state(|| scope! { "show" => false })
		.template(el("div").child(text("x")).child(if_("show", component("Wrapper"))))
		.method("reveal", |ctx, _args| ctx.set("show", true));
	let mut app = App::new(
		registry_with(vec![("Switcher", switcher), ("Wrapper", wrapper())]),
		host(),
	);
	let root = app.mount("Switcher", "app").unwrap();
	assert_eq!(app.html("app").unwrap(), "<div>x</div>");

	assert_eq!(
		app.invoke(root, "reveal", &[]),
		Err(ComponentError::UnknownComponent("Missing".into()))
	);

	assert!(app.is_mounted(root));
	assert!(app.children(root).is_empty());
	assert_eq!(app.instance_count(), 1);
	assert_eq!(
		app.html("app").unwrap(),
		"<!-- render failed: unknown component: Missing -->"
	);
	let last = app.diagnostics().last().unwrap();
	assert_eq!(last.instance, root);
	assert_eq!(last.severity, Severity::Error);
	assert_eq!(last.error, ComponentError::UnknownComponent("Missing".into()));
}

#[rstest]
fn test_roots_at_separate_targets_have_distinct_state() {
	let mut app = App::new(registry_with(vec![]), host());
	let first = app.mount("Counter", "app").unwrap();
	let second = app.mount("Counter", "aside").unwrap();

	app.invoke(first, "increment", &[]).unwrap();

	assert_eq!(app.state(first).and_then(|s| s.get("count")), Some(&Value::Int(1)));
	assert_eq!(app.state(second).and_then(|s| s.get("count")), Some(&Value::Int(0)));
	assert_eq!(app.html("app").unwrap(), "<span>1/2</span>");
	assert_eq!(app.html("aside").unwrap(), "<span>0/0</span>");
	assert_eq!(app.computed(first).and_then(|c| c.get("doubled")), Some(&Value::Int(2)));
}

#[rstest]
fn test_mount_with_props_resolves_against_schema() {
	let badge = ComponentDefinition::new()
		.prop(PropDescriptor::new("label", PropType::String).required())
		.template(el("b").child(interp("label")));
	let mut app = App::new(registry_with(vec![("Badge", badge)]), host());

	let id = app
		.mount_with_props("Badge", "app", scope! { "label" => "new" })
		.unwrap();

	assert_eq!(app.html("app").unwrap(), "<b>new</b>");
	assert_eq!(app.component_name(id), Some("Badge"));
}

// =============================================================================
// Props
// =============================================================================

#[rstest]
fn test_prop_type_mismatch_is_a_diagnostic() {
	let badge = ComponentDefinition::new()
		.prop(PropDescriptor::new("count", PropType::Int).default_value(0))
		.template(el("b").child(interp("count")));
	let shelf = ComponentDefinition::new().template(component("Badge").prop_value("count", "many"));
	let mut app = App::new(registry_with(vec![("Badge", badge), ("Shelf", shelf)]), host());

	let shelf = app.mount("Shelf", "app").unwrap();
	let badge = app.children(shelf)[0];

	assert_eq!(app.props(badge).and_then(|p| p.get("count")), Some(&Value::Int(0)));
	assert_eq!(app.html("app").unwrap(), "<b>0</b>");

	let diagnostics = app.take_diagnostics();
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].instance, badge);
	assert_eq!(diagnostics[0].severity, Severity::Warning);
	assert_eq!(
		diagnostics[0].error,
		ComponentError::PropTypeMismatch {
			component: "Badge".into(),
			prop: "count".into(),
			expected: "int".into(),
			actual: "string",
		}
	);
	assert!(app.diagnostics().is_empty());
}

#[rstest]
fn test_prop_type_mismatch_on_update_is_a_diagnostic() {
	let badge = ComponentDefinition::new()
		.prop(PropDescriptor::new("count", PropType::Int).default_value(0))
		.template(el("b").child(interp("count")));
	let shelf = ComponentDefinition::new()
		.state(|| scope! { "stock" => 3 })
		.template(component("Badge").prop("count", "stock"))
		.method("spoil", |ctx, _args| ctx.set("stock", "many"));
	let mut app = App::new(registry_with(vec![("Badge", badge), ("Shelf", shelf)]), host());

	let shelf = app.mount("Shelf", "app").unwrap();
	let badge = app.children(shelf)[0];
	assert_eq!(app.html("app").unwrap(), "<b>3</b>");
	assert!(app.diagnostics().is_empty());

	app.invoke(shelf, "spoil", &[]).unwrap();
	app.update(shelf).unwrap();

	assert_eq!(app.children(shelf).to_vec(), vec![badge]);
	assert_eq!(app.props(badge).and_then(|p| p.get("count")), Some(&Value::Int(0)));
	assert_eq!(app.html("app").unwrap(), "<b>0</b>");

	let diagnostics = app.take_diagnostics();
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].instance, badge);
	assert_eq!(diagnostics[0].severity, Severity::Warning);
	assert_eq!(
		diagnostics[0].error,
		ComponentError::PropTypeMismatch {
			component: "Badge".into(),
			prop: "count".into(),
			expected: "int".into(),
			actual: "string",
		}
	);
}

#[rstest]
fn test_writing_a_prop_is_rejected() {
	let label = ComponentDefinition::new()
		.prop(PropDescriptor::new("text", PropType::String).default_value("x"))
		.state(|| scope! { "clicks" => 0 })
		.template(el("span").child(interp("text")))
		.method("overwrite", |ctx, _args| ctx.set("text", "y"));
	let mut app = App::new(registry_with(vec![("Label", label)]), host());
	let id = app.mount("Label", "app").unwrap();

	let result = app.invoke(id, "overwrite", &[]);

	assert_eq!(
		result,
		Err(ComponentError::PropMutation {
			component: "Label".into(),
			prop: "text".into(),
		})
	);
	assert_eq!(app.props(id).and_then(|p| p.get("text")), Some(&Value::from("x")));
	assert_eq!(app.state(id), Some(&scope! { "clicks" => 0 }));
	assert_eq!(app.html("app").unwrap(), "<span>x</span>");
}

// =============================================================================
// Events
// =============================================================================

#[rstest]
fn test_emit_without_listener_is_a_noop() {
	let mut app = App::new(registry_with(vec![]), host());
	let id = app.mount("Counter", "app").unwrap();

	app.emit(id, "change", 5).unwrap();
	assert_eq!(app.state(id).and_then(|s| s.get("count")), Some(&Value::Int(0)));
	assert_eq!(app.render_count(id), 1);

	// The method's own emit finds no listener either.
	app.invoke(id, "increment", &[]).unwrap();
	assert_eq!(app.state(id).and_then(|s| s.get("count")), Some(&Value::Int(1)));
}

#[rstest]
fn test_emit_runs_listener_before_returning(log: Log) {
	let child_log = Arc::clone(&log);
	let child = ComponentDefinition::new().method("ping", move |ctx, _args| {
		child_log.lock().push("child:before".into());
		ctx.emit("ping", "hello")?;
		child_log.lock().push("child:after".into());
		Ok(())
	});

	let parent_log = Arc::clone(&log);
	let parent = ComponentDefinition::new()
		.template(component("Child").on("ping", "received"))
		.method("received", move |ctx, args| {
			let payload = args.first().cloned().unwrap_or_default();
			parent_log.lock().push(format!("parent:{payload}"));
			ctx.set("last", payload)
		});

	let mut app = App::new(registry_with(vec![("Child", child), ("Parent", parent)]), host());
	let parent = app.mount("Parent", "app").unwrap();
	let child = app.children(parent)[0];

	app.invoke(child, "ping", &[]).unwrap();

	assert_eq!(*log.lock(), vec!["child:before", "parent:hello", "child:after"]);
	assert_eq!(app.state(parent).and_then(|s| s.get("last")), Some(&Value::from("hello")));
}

#[rstest]
fn test_listener_arguments_see_event_payload() {
	let mut app = App::new(registry_with(vec![]), host());
	let pair = app.mount("Pair", "app").unwrap();
	let counter = app.children(pair)[1];

	app.emit(counter, "change", 10).unwrap();

	assert_eq!(total(&app, pair), Some(&Value::Int(10)));
}

#[rstest]
fn test_emit_after_detach_is_a_noop() {
	let mut app = App::new(registry_with(vec![]), host());
	let pair = app.mount("Pair", "app").unwrap();
	let counter = app.children(pair)[0];

	app.unmount(counter).unwrap();

	assert!(!app.is_mounted(counter));
	assert_eq!(app.children(pair).len(), 1);
	app.emit(counter, "change", 1).unwrap();
	assert_eq!(total(&app, pair), Some(&Value::Int(0)));
	assert_eq!(
		app.invoke(counter, "increment", &[]),
		Err(ComponentError::InstanceNotFound(counter))
	);
}

#[rstest]
fn test_dispatch_depth_is_limited() {
	let settings = RuntimeSettings {
		max_dispatch_depth: 1,
		..RuntimeSettings::default()
	};
	let mut app = App::new(registry_with(vec![]), host()).with_settings(settings);
	let pair = app.mount("Pair", "app").unwrap();
	let counter = app.children(pair)[0];

	assert_eq!(
		app.invoke(counter, "increment", &[]),
		Err(ComponentError::DispatchDepthExceeded(1))
	);
	assert_eq!(total(&app, pair), Some(&Value::Int(0)));
}

#[rstest]
fn test_unknown_method() {
	let mut app = App::new(registry_with(vec![]), host());
	let id = app.mount("Counter", "app").unwrap();

	assert_eq!(
		app.invoke(id, "reset", &[]),
		Err(ComponentError::UnknownMethod {
			component: "Counter".into(),
			method: "reset".into(),
		})
	);
}

// =============================================================================
// Slots
// =============================================================================

fn card() -> ComponentDefinition {
	ComponentDefinition::new()
		.state(|| scope! { "title" => "card", "secret" => "hidden" })
		.template(el("section").child(slot("default").bind("title", "title").fallback(text("empty"))))
}

#[rstest]
fn test_slot_data_shadows_parent_names() {
	let page = ComponentDefinition::new()
		.state(|| scope! { "title" => "page", "subtitle" => "sub" })
		.template(el("div").children([
			component("Card").slot_content(template_slot(
				"default",
				fragment([interp("title"), text("/"), interp("subtitle")]),
			)),
			component("Card"),
		]));
	let mut app = App::new(registry_with(vec![("Card", card()), ("Page", page)]), host());

	app.mount("Page", "app").unwrap();

	assert_eq!(
		app.html("app").unwrap(),
		"<div><section>card/sub</section><section>empty</section></div>"
	);
}

#[rstest]
fn test_unresolved_slot_name_fails_only_that_instance() {
	let page = ComponentDefinition::new().template(el("div").children([
		component("Card").slot_content(template_slot("default", interp("secret"))),
		component("Card").slot_content(template_slot("default", interp("title"))),
	]));
	let mut app = App::new(registry_with(vec![("Card", card()), ("Page", page)]), host());

	let page = app.mount("Page", "app").unwrap();
	let cards = app.children(page).to_vec();

	assert_eq!(
		app.html("app").unwrap(),
		"<div><!-- render failed: unresolved binding `secret` --><section>card</section></div>"
	);
	let diagnostics = app.diagnostics();
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].instance, cards[0]);
	assert_eq!(diagnostics[0].severity, Severity::Error);
	assert_eq!(
		diagnostics[0].error,
		ComponentError::UnresolvedBinding("secret".into())
	);
}

#[rstest]
fn test_failed_render_comment_can_be_disabled() {
	let broken = ComponentDefinition::new().template(el("p").child(interp("nothing")));
	let settings = RuntimeSettings {
		render_error_comments: false,
		..RuntimeSettings::default()
	};
	let mut app = App::new(registry_with(vec![("Broken", broken)]), host()).with_settings(settings);

	app.mount("Broken", "app").unwrap();

	assert_eq!(app.html("app").unwrap(), "");
	assert_eq!(app.diagnostics().len(), 1);
}

// =============================================================================
// Updates
// =============================================================================

#[rstest]
#[case(true, [1, 2, 1])]
#[case(false, [2, 2, 2])]
fn test_update_skips_unchanged_siblings(#[case] incremental: bool, #[case] expected: [usize; 3]) {
	let settings = RuntimeSettings {
		incremental_updates: incremental,
		..RuntimeSettings::default()
	};
	let plain = ComponentDefinition::new().template(el("div").children([
		component("Counter"),
		component("Counter"),
	]));
	let mut app =
		App::new(registry_with(vec![("Plain", plain)]), host()).with_settings(settings);
	let root = app.mount("Plain", "app").unwrap();
	let counters = app.children(root).to_vec();

	app.invoke(counters[0], "increment", &[]).unwrap();

	assert_eq!(
		[
			app.render_count(root),
			app.render_count(counters[0]),
			app.render_count(counters[1]),
		],
		expected
	);
}

#[rstest]
fn test_range_loop_is_limited() {
	let ranges = ComponentDefinition::new()
		.state(|| scope! { "n" => 3 })
		.template(el("ol").child(for_each("i in n", el("li").child(interp("i")))))
		.method("grow", |ctx, _args| ctx.set("n", 6));
	let settings = RuntimeSettings {
		max_loop_range: 5,
		..RuntimeSettings::default()
	};
	let mut app =
		App::new(registry_with(vec![("Ranges", ranges)]), host()).with_settings(settings);
	let root = app.mount("Ranges", "app").unwrap();
	assert_eq!(app.html("app").unwrap(), "<ol><li>1</li><li>2</li><li>3</li></ol>");

	app.invoke(root, "grow", &[]).unwrap();

	assert_eq!(
		app.html("app").unwrap(),
		"<!-- render failed: render error in Ranges: cannot loop over a range of 6: the limit is 5 -->"
	);
	let diagnostics = app.diagnostics();
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].severity, Severity::Error);
	assert_eq!(
		diagnostics[0].error,
		ComponentError::Render {
			component: "Ranges".into(),
			source: EvalError::RangeTooLarge { len: 6, limit: 5 },
		}
	);
}

#[rstest]
fn test_explicit_update_rerenders_instance() {
	let mut app = App::new(registry_with(vec![]), host());
	let id = app.mount("Counter", "app").unwrap();

	app.update(id).unwrap();
	assert_eq!(app.render_count(id), 2);

	app.unmount(id).unwrap();
	assert_eq!(app.update(id), Err(ComponentError::InstanceNotFound(id)));
}

// =============================================================================
// Lifecycle
// =============================================================================

fn logged(log: &Log, root: impl Into<Node>) -> ComponentDefinition {
	let mounted = Arc::clone(log);
	let unmounted = Arc::clone(log);
	ComponentDefinition::new()
		.on_mounted(move |event: LifecycleEvent| {
			mounted.lock().push(format!("mounted {}", event.component));
		})
		.on_unmounted(move |event: LifecycleEvent| {
			unmounted.lock().push(format!("unmounted {}", event.component));
		})
		.template(root)
}

#[rstest]
fn test_hooks_run_children_first(log: Log) {
	let registry = registry_with(vec![
		("Outer", logged(&log, el("div").child(component("Inner")))),
		("Inner", logged(&log, el("span"))),
	]);
	let mut app = App::new(registry, host());

	let outer = app.mount("Outer", "app").unwrap();
	app.unmount(outer).unwrap();

	assert_eq!(
		*log.lock(),
		vec!["mounted Inner", "mounted Outer", "unmounted Inner", "unmounted Outer"]
	);
	assert_eq!(app.instance_count(), 0);
	assert_eq!(app.host().occupant("app"), None);
	assert_eq!(app.html("app").unwrap(), "");
}
