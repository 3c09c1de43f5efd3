//! Rendering one instance.
//!
//! A [`Renderer`] walks an instance's template against its scope chain and
//! produces the instance's [`View`] plus everything the tree needs to apply
//! the render: the children the template asks for (with their props,
//! listeners and slot contents), the bound event handlers and the slot render
//! counts. It only reads the [`App`]; applying the output is
//! [`App::render_instance`]'s job.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sprig_core::{EvalError, ExprError, Scope, ScopeChain, Value};

use super::App;
use super::instance::{
	ChildKey, HandlerId, InstanceId, InstanceRecord, Listener, PathSegment, SlotContent,
};
use crate::definition::ComponentDefinition;
use crate::error::{ComponentError, ComponentResult};
use crate::template::{
	Binding, ComponentSite, Element, Node, PropBinding, Repeat, SlotBinding, SlotOutlet,
};
use crate::view::{ElementView, View};

/// Stands in for the state of an instance whose method is running.
pub(crate) static EMPTY_SCOPE: Scope = Scope::new();

/// `[state, props, computed]`, outermost first.
pub(crate) fn base_chain(record: &InstanceRecord) -> ScopeChain<'_> {
	let mut chain = ScopeChain::new();
	chain.push(record.state.as_ref().unwrap_or(&EMPTY_SCOPE));
	chain.push(&record.props);
	chain.push(&record.computed);
	chain
}

/// A child the template asked for.
pub(crate) struct ChildRequest {
	pub key: ChildKey,
	pub id: InstanceId,
	/// The id was taken from the previous render.
	pub existing: bool,
	pub definition: Arc<ComponentDefinition>,
	pub supplied: Scope,
	pub listeners: HashMap<String, Listener>,
	pub slots: HashMap<String, SlotContent>,
}

pub(crate) struct RenderOutput {
	pub view: View,
	pub computed: Scope,
	pub children: Vec<ChildRequest>,
	pub handlers: Vec<(HandlerId, Listener)>,
	pub slot_renders: HashMap<String, usize>,
}

pub(crate) struct Renderer<'a> {
	app: &'a App,
	id: InstanceId,
	record: &'a InstanceRecord,
	/// Loop positions from the root of the template to the current node.
	path: Vec<PathSegment>,
	seen: HashSet<ChildKey>,
	children: Vec<ChildRequest>,
	handlers: Vec<(HandlerId, Listener)>,
	slot_renders: HashMap<String, usize>,
}

impl<'a> Renderer<'a> {
	pub fn new(app: &'a App, id: InstanceId) -> ComponentResult<Self> {
		Ok(Self {
			app,
			id,
			record: app.record(id)?,
			path: Vec::new(),
			seen: HashSet::new(),
			children: Vec::new(),
			handlers: Vec::new(),
			slot_renders: HashMap::new(),
		})
	}

	pub fn render(mut self) -> ComponentResult<RenderOutput> {
		let record = self.record;
		let state = record.state.as_ref().unwrap_or(&EMPTY_SCOPE);

		let computed = {
			let mut chain = ScopeChain::new();
			chain.push(state);
			chain.push(&record.props);
			record
				.definition
				.computed
				.iter()
				.map(|(name, compute)| (name.clone(), compute(&chain)))
				.collect::<Scope>()
		};

		let view = {
			let mut chain = ScopeChain::new();
			chain.push(state);
			chain.push(&record.props);
			chain.push(&computed);
			self.render_node(record.definition.root(), self.id, &chain)?
		};

		Ok(RenderOutput {
			view,
			computed,
			children: self.children,
			handlers: self.handlers,
			slot_renders: self.slot_renders,
		})
	}

	/// Renders `node`. `author` is the instance whose template the node was
	/// written in: the current instance, or the parent for slot content.
	fn render_node(
		&mut self,
		node: &Node,
		author: InstanceId,
		chain: &ScopeChain<'_>,
	) -> ComponentResult<View> {
		match node {
			Node::Text(text) => Ok(View::Text(text.clone())),
			Node::Interpolation(binding) => {
				Ok(View::Text(self.eval(binding, chain)?.to_display_string()))
			}
			Node::Fragment(nodes) => nodes
				.iter()
				.map(|node| self.render_node(node, author, chain))
				.collect::<ComponentResult<Vec<_>>>()
				.map(View::Fragment),
			Node::Element(element) => self.render_element(element, author, chain),
			Node::If(conditional) => {
				if self.eval(&conditional.condition, chain)?.is_truthy() {
					self.render_node(&conditional.then, author, chain)
				} else {
					self.render_optional(conditional.otherwise.as_deref(), author, chain)
				}
			}
			Node::For(repeat) => self.render_repeat(repeat, author, chain),
			Node::Component(site) => self.render_site(site, author, chain),
			Node::Slot(outlet) => self.render_outlet(outlet, author, chain),
		}
	}

	fn render_optional(
		&mut self,
		node: Option<&Node>,
		author: InstanceId,
		chain: &ScopeChain<'_>,
	) -> ComponentResult<View> {
		match node {
			Some(node) => self.render_node(node, author, chain),
			None => Ok(View::Empty),
		}
	}

	fn render_element(
		&mut self,
		element: &Element,
		author: InstanceId,
		chain: &ScopeChain<'_>,
	) -> ComponentResult<View> {
		let mut view = ElementView::new(element.tag.clone());

		for (name, value) in &element.attrs {
			view.set_attr(name, Some(value.clone()));
		}
		for (name, binding) in &element.bindings {
			match self.eval(binding, chain)? {
				Value::Bool(false) | Value::Null | Value::Undefined => view.remove_attr(name),
				Value::Bool(true) => view.set_attr(name, None),
				value => view.set_attr(name, Some(value.to_display_string())),
			}
		}

		if !element.handlers.is_empty() {
			let captured = chain.owned_frames();
			for (event, handler) in &element.handlers {
				let call = handler
					.call()
					.map_err(|source| self.invalid_template(source))?
					.clone();
				let id = HandlerId::next();
				self.handlers.push((
					id,
					Listener {
						owner: author,
						call,
						captured: captured.clone(),
					},
				));
				view.handlers.push((event.clone(), id));
			}
		}

		for child in &element.children {
			view.children.push(self.render_node(child, author, chain)?);
		}
		Ok(View::Element(view))
	}

	fn render_repeat(
		&mut self,
		repeat: &Repeat,
		author: InstanceId,
		chain: &ScopeChain<'_>,
	) -> ComponentResult<View> {
		let header = repeat
			.header
			.as_ref()
			.map_err(|source| self.invalid_template(source))?;
		let source = header
			.source
			.eval(chain)
			.map_err(|err| ComponentError::from_eval(self.record.name(), err))?;

		let limit = self.app.settings.max_loop_range;
		let entries: Vec<(Value, Value)> = match source {
			Value::List(items) => items
				.into_iter()
				.enumerate()
				.map(|(i, item)| (item, Value::from(i)))
				.collect(),
			Value::Object(map) => map
				.into_iter()
				.map(|(key, value)| (value, Value::String(key)))
				.collect(),
			Value::String(text) => text
				.chars()
				.enumerate()
				.map(|(i, c)| (Value::String(c.to_string()), Value::from(i)))
				.collect(),
			Value::Int(n) if usize::try_from(n).is_ok_and(|len| len > limit) => {
				return Err(ComponentError::Render {
					component: self.record.name().to_string(),
					source: EvalError::RangeTooLarge { len: n, limit },
				});
			}
			Value::Int(n) => (1..=n.max(0))
				.enumerate()
				.map(|(i, n)| (Value::Int(n), Value::from(i)))
				.collect(),
			Value::Undefined | Value::Null => Vec::new(),
			other => {
				return Err(ComponentError::Render {
					component: self.record.name().to_string(),
					source: EvalError::InvalidOperand {
						op: "in",
						operand: other.type_name(),
					},
				});
			}
		};

		let mut views = Vec::with_capacity(entries.len());
		for (position, (item, index)) in entries.into_iter().enumerate() {
			let mut frame = Scope::new();
			frame.insert(header.item.clone(), item);
			if let Some(name) = &header.index {
				frame.insert(name.clone(), index);
			}

			self.path.push(PathSegment::Index(position));
			let view = self.render_node(&repeat.body, author, &chain.with_frame(frame));
			self.path.pop();
			views.push(view?);
		}
		Ok(View::Fragment(views))
	}

	fn render_site(
		&mut self,
		site: &ComponentSite,
		author: InstanceId,
		chain: &ScopeChain<'_>,
	) -> ComponentResult<View> {
		let definition = self.app.registry.resolve(&site.name)?;

		// Each bound prop is evaluated once per render of this instance.
		let mut supplied = Scope::new();
		for (name, prop) in &site.props {
			let value = match prop {
				PropBinding::Static(value) => value.clone(),
				PropBinding::Dynamic(binding) => self.eval(binding, chain)?,
			};
			supplied.insert(name.clone(), value);
		}

		let path = match &site.key {
			Some(key) => vec![PathSegment::Key(self.eval(key, chain)?.to_display_string())],
			None => self.path.clone(),
		};
		let mut key = ChildKey {
			origin: author,
			site: site.site,
			path,
		};
		let mut duplicate = 0;
		while self.seen.contains(&key) {
			key.path.push(PathSegment::Index(duplicate));
			duplicate += 1;
		}
		self.seen.insert(key.clone());

		let existing = self.record.child_keys.get(&key).copied();
		let id = existing.unwrap_or_else(InstanceId::next);
		let captured = chain.owned_frames();

		let mut listeners = HashMap::with_capacity(site.listeners.len());
		for (event, handler) in &site.listeners {
			let call = handler
				.call()
				.map_err(|source| self.invalid_template(source))?
				.clone();
			listeners.insert(
				event.clone(),
				Listener {
					owner: author,
					call,
					captured: captured.clone(),
				},
			);
		}

		let slots = site
			.slots
			.iter()
			.map(|slot| {
				let content = SlotContent {
					owner: author,
					body: Arc::clone(&slot.body),
					binding: slot.binding.clone(),
					captured: captured.clone(),
				};
				(slot.name.clone(), content)
			})
			.collect();

		self.children.push(ChildRequest {
			key,
			id,
			existing: existing.is_some(),
			definition,
			supplied,
			listeners,
			slots,
		});
		Ok(View::Instance(id))
	}

	fn render_outlet(
		&mut self,
		outlet: &SlotOutlet,
		author: InstanceId,
		chain: &ScopeChain<'_>,
	) -> ComponentResult<View> {
		*self.slot_renders.entry(outlet.name.clone()).or_default() += 1;

		let mut data = Scope::new();
		for (name, binding) in &outlet.bindings {
			data.insert(name.clone(), self.eval(binding, chain)?);
		}

		// An outlet inside slot content forwards the author's own slot.
		let app = self.app;
		let holder = if author == self.id {
			Some(self.record)
		} else {
			app.instances.get(&author)
		};
		let content = holder.and_then(|record| record.slots.get(&outlet.name));
		let Some((content, owner)) =
			content.and_then(|content| Some((content, app.instances.get(&content.owner)?)))
		else {
			return self.render_optional(outlet.fallback.as_deref(), author, chain);
		};

		let mut slot_chain = base_chain(owner);
		for frame in &content.captured {
			slot_chain.push_owned(frame.clone());
		}
		let frame = match &content.binding {
			SlotBinding::Spread => data,
			SlotBinding::Named(name) => {
				let mut frame = Scope::new();
				frame.insert(name.clone(), data.into_value());
				frame
			}
		};
		slot_chain.push_owned(frame);

		self.render_node(&content.body, content.owner, &slot_chain)
	}

	fn eval(&self, binding: &Binding, chain: &ScopeChain<'_>) -> ComponentResult<Value> {
		let expr = binding
			.expr()
			.map_err(|source| self.invalid_template(source))?;
		expr.eval(chain)
			.map_err(|err| ComponentError::from_eval(self.record.name(), err))
	}

	fn invalid_template(&self, source: &ExprError) -> ComponentError {
		ComponentError::InvalidTemplate {
			component: self.record.name().to_string(),
			source: source.clone(),
		}
	}
}
