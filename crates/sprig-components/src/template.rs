//! Template model and builder functions.
//!
//! Templates are built in code:
//!
//! ```
//! use sprig_components::template::{component, el, for_each, interp, slot, template_slot};
//!
//! // Child: renders one `item` slot per entry of its `items` prop.
//! let list = el("ul").child(for_each(
//! 	"item in items",
//! 	el("li").child(slot("item").bind("item", "item").fallback(interp("item.name"))),
//! ));
//!
//! // Parent: supplies the fragment, reading the slot data as `props.item`.
//! let app = el("div").child(
//! 	component("todo-list")
//! 		.prop("items", "todos")
//! 		.slot_content(template_slot("item", interp("props.item.name")).named("props")),
//! );
//! # let _ = (list, app);
//! ```
//!
//! Expressions are parsed when the node is built. Parse errors are kept on the
//! node and reported when the owning component is registered.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sprig_core::{Expr, ExprError, LoopHeader, MethodCall, Value};

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
	source: String,
	parsed: Result<Expr, ExprError>,
}

impl Binding {
	pub fn new(source: impl Into<String>) -> Self {
		let source = source.into();
		let parsed = Expr::parse(&source);
		Self { source, parsed }
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn expr(&self) -> Result<&Expr, &ExprError> {
		self.parsed.as_ref()
	}
}

/// An event handler: a method name or a method call.
#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
	source: String,
	parsed: Result<MethodCall, ExprError>,
}

impl Handler {
	pub fn new(source: impl Into<String>) -> Self {
		let source = source.into();
		let parsed = MethodCall::parse(&source);
		Self { source, parsed }
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn call(&self) -> Result<&MethodCall, &ExprError> {
		self.parsed.as_ref()
	}
}

/// A template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	Element(Element),
	Text(String),
	/// `{{ expr }}`
	Interpolation(Binding),
	Fragment(Vec<Node>),
	If(Conditional),
	For(Repeat),
	Component(ComponentSite),
	/// A slot outlet in a child's template.
	Slot(SlotOutlet),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	pub tag: String,
	pub attrs: Vec<(String, String)>,
	pub bindings: Vec<(String, Binding)>,
	pub handlers: Vec<(String, Handler)>,
	pub children: Vec<Node>,
}

impl Element {
	/// Static attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attrs.push((name.into(), value.into()));
		self
	}

	/// Attribute bound to an expression.
	pub fn bind(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
		self.bindings.push((name.into(), Binding::new(expr)));
		self
	}

	/// DOM-style event handler, calling a method on the instance that authored
	/// this element.
	pub fn on(mut self, event: impl Into<String>, handler: impl Into<String>) -> Self {
		self.handlers.push((event.into(), Handler::new(handler)));
		self
	}

	pub fn child(mut self, node: impl Into<Node>) -> Self {
		self.children.push(node.into());
		self
	}

	pub fn children<I>(mut self, nodes: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Node>,
	{
		self.children.extend(nodes.into_iter().map(Into::into));
		self
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
	pub condition: Binding,
	pub then: Box<Node>,
	pub otherwise: Option<Box<Node>>,
}

impl Conditional {
	pub fn otherwise(mut self, node: impl Into<Node>) -> Self {
		self.otherwise = Some(Box::new(node.into()));
		self
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Repeat {
	pub source: String,
	pub header: Result<LoopHeader, ExprError>,
	pub body: Box<Node>,
}

/// How a parent binds a child's prop.
#[derive(Debug, Clone, PartialEq)]
pub enum PropBinding {
	Static(Value),
	Dynamic(Binding),
}

/// A component placed in a template.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSite {
	/// Process-unique site number, assigned when the node is built.
	pub site: usize,
	pub name: String,
	pub props: Vec<(String, PropBinding)>,
	pub listeners: Vec<(String, Handler)>,
	pub key: Option<Binding>,
	pub slots: Vec<SlotTemplate>,
}

impl ComponentSite {
	/// Binds a prop to an expression evaluated in the parent's scope.
	pub fn prop(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
		self.props
			.push((name.into(), PropBinding::Dynamic(Binding::new(expr))));
		self
	}

	/// Binds a prop to a constant.
	pub fn prop_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.props
			.push((name.into(), PropBinding::Static(value.into())));
		self
	}

	/// Registers a listener for a custom event emitted by the child.
	pub fn on(mut self, event: impl Into<String>, handler: impl Into<String>) -> Self {
		self.listeners.push((event.into(), Handler::new(handler)));
		self
	}

	/// Identity of the child across re-renders, instead of its loop position.
	pub fn key(mut self, expr: impl Into<String>) -> Self {
		self.key = Some(Binding::new(expr));
		self
	}

	pub fn slot_content(mut self, slot: SlotTemplate) -> Self {
		self.slots.push(slot);
		self
	}
}

/// How slot data is exposed to a parent-authored fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotBinding {
	/// Every slot data key is visible by name.
	Spread,
	/// Slot data is visible as one object under this name.
	Named(String),
}

/// Parent-authored content for a child's slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotTemplate {
	pub name: String,
	pub binding: SlotBinding,
	pub body: Arc<Node>,
}

impl SlotTemplate {
	pub fn spread(mut self) -> Self {
		self.binding = SlotBinding::Spread;
		self
	}

	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.binding = SlotBinding::Named(name.into());
		self
	}
}

/// A slot outlet declared by a child.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotOutlet {
	pub name: String,
	pub bindings: Vec<(String, Binding)>,
	pub fallback: Option<Box<Node>>,
}

impl SlotOutlet {
	/// Exposes `expr`, evaluated in the child's scope, as slot data `name`.
	pub fn bind(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
		self.bindings.push((name.into(), Binding::new(expr)));
		self
	}

	/// Rendered in the child's scope when the parent supplies no content.
	pub fn fallback(mut self, node: impl Into<Node>) -> Self {
		self.fallback = Some(Box::new(node.into()));
		self
	}
}

macro_rules! impl_into_node {
	($($ty:ident => $variant:ident),+ $(,)?) => {
		$(impl From<$ty> for Node {
			fn from(value: $ty) -> Self {
				Node::$variant(value)
			}
		})+
	};
}

impl_into_node! {
	Element => Element,
	Conditional => If,
	Repeat => For,
	ComponentSite => Component,
	SlotOutlet => Slot,
}

impl From<&str> for Node {
	fn from(value: &str) -> Self {
		Node::Text(value.to_string())
	}
}

impl From<String> for Node {
	fn from(value: String) -> Self {
		Node::Text(value)
	}
}

impl From<Vec<Node>> for Node {
	fn from(nodes: Vec<Node>) -> Self {
		Node::Fragment(nodes)
	}
}

static NEXT_SITE: AtomicUsize = AtomicUsize::new(1);

pub fn el(tag: impl Into<String>) -> Element {
	Element {
		tag: tag.into(),
		attrs: Vec::new(),
		bindings: Vec::new(),
		handlers: Vec::new(),
		children: Vec::new(),
	}
}

pub fn text(content: impl Into<String>) -> Node {
	Node::Text(content.into())
}

pub fn interp(expr: impl Into<String>) -> Node {
	Node::Interpolation(Binding::new(expr))
}

pub fn fragment<I>(nodes: I) -> Node
where
	I: IntoIterator,
	I::Item: Into<Node>,
{
	Node::Fragment(nodes.into_iter().map(Into::into).collect())
}

pub fn if_(condition: impl Into<String>, then: impl Into<Node>) -> Conditional {
	Conditional {
		condition: Binding::new(condition),
		then: Box::new(then.into()),
		otherwise: None,
	}
}

/// Repeats `body` per entry of a list (or object, string, or `1..=n`).
pub fn for_each(header: impl Into<String>, body: impl Into<Node>) -> Repeat {
	let source = header.into();
	let header = LoopHeader::parse(&source);
	Repeat {
		source,
		header,
		body: Box::new(body.into()),
	}
}

pub fn component(name: impl Into<String>) -> ComponentSite {
	ComponentSite {
		site: NEXT_SITE.fetch_add(1, Ordering::Relaxed),
		name: name.into(),
		props: Vec::new(),
		listeners: Vec::new(),
		key: None,
		slots: Vec::new(),
	}
}

pub fn slot(name: impl Into<String>) -> SlotOutlet {
	SlotOutlet {
		name: name.into(),
		bindings: Vec::new(),
		fallback: None,
	}
}

/// Content for the child's slot `name`. Slot data is spread into scope unless
/// [`SlotTemplate::named`] is used.
pub fn template_slot(name: impl Into<String>, body: impl Into<Node>) -> SlotTemplate {
	SlotTemplate {
		name: name.into(),
		binding: SlotBinding::Spread,
		body: Arc::new(body.into()),
	}
}

impl Node {
	/// Returns the first parse error in this subtree, if any.
	pub fn validate(&self) -> Result<(), ExprError> {
		match self {
			Node::Text(_) => Ok(()),
			Node::Interpolation(binding) => check(binding),
			Node::Fragment(nodes) => nodes.iter().try_for_each(Node::validate),
			Node::Element(element) => {
				element.bindings.iter().try_for_each(|(_, b)| check(b))?;
				element.handlers.iter().try_for_each(|(_, h)| check_handler(h))?;
				element.children.iter().try_for_each(Node::validate)
			}
			Node::If(conditional) => {
				check(&conditional.condition)?;
				conditional.then.validate()?;
				conditional.otherwise.as_deref().map_or(Ok(()), Node::validate)
			}
			Node::For(repeat) => {
				repeat.header.as_ref().map_err(Clone::clone)?;
				repeat.body.validate()
			}
			Node::Component(site) => {
				site.props.iter().try_for_each(|(_, prop)| match prop {
					PropBinding::Static(_) => Ok(()),
					PropBinding::Dynamic(binding) => check(binding),
				})?;
				site.listeners.iter().try_for_each(|(_, h)| check_handler(h))?;
				site.key.as_ref().map_or(Ok(()), check)?;
				site.slots.iter().try_for_each(|slot| slot.body.validate())
			}
			Node::Slot(outlet) => {
				outlet.bindings.iter().try_for_each(|(_, b)| check(b))?;
				outlet.fallback.as_deref().map_or(Ok(()), Node::validate)
			}
		}
	}
}

fn check(binding: &Binding) -> Result<(), ExprError> {
	binding.expr().map(drop).map_err(Clone::clone)
}

fn check_handler(handler: &Handler) -> Result<(), ExprError> {
	handler.call().map(drop).map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_sites_are_numbered_uniquely() {
		let first = component("counter");
		let second = component("counter");
		assert_ne!(first.site, second.site);
	}

	#[rstest]
	fn test_valid_template() {
		let node: Node = el("div")
			.bind("title", "label")
			.on("click", "select(item.id)")
			.child(for_each("(item, i) in items", interp("i + 1")))
			.child(if_("open", text("open")).otherwise(text("closed")))
			.into();
		assert_eq!(node.validate(), Ok(()));
	}

	#[rstest]
	fn test_invalid_handler_is_reported() {
		let node: Node = el("button").on("click", "count + 1").into();
		assert_eq!(
			node.validate(),
			Err(ExprError::InvalidHandler("count + 1".to_string()))
		);
	}

	#[rstest]
	fn test_error_inside_slot_content_is_reported() {
		let node: Node = component("list")
			.slot_content(template_slot("item", interp("item.")))
			.into();
		assert!(matches!(node.validate(), Err(ExprError::Syntax { .. })));
	}

	#[rstest]
	fn test_invalid_loop_is_reported() {
		let node: Node = for_each("items", text("x")).into();
		assert_eq!(
			node.validate(),
			Err(ExprError::InvalidLoop("items".to_string()))
		);
	}

	#[rstest]
	fn test_template_slot_binding_modes() {
		let spread = template_slot("item", text("x"));
		assert_eq!(spread.binding, SlotBinding::Spread);
		assert_eq!(
			spread.named("props").binding,
			SlotBinding::Named("props".to_string())
		);
	}
}
