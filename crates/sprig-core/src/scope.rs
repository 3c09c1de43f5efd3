//! Scopes and scope chains.
//!
//! A [`Scope`] is one frame of named values: an instance's state, its resolved
//! props, a loop iteration, or the data a child hands to a scoped slot.
//!
//! A [`ScopeChain`] stacks frames explicitly. Lookup walks from the innermost
//! frame outwards and stops at the first frame that defines the name, so inner
//! frames shadow outer ones. Scoped slot fragments are evaluated against
//! `[slot data, parent lexical frames...]`, which is what makes slot data win
//! over a parent name on collision.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::error::EvalError;
use crate::value::{Object, Value};

/// Name resolution used by the expression evaluator.
pub trait Resolve {
	/// Looks up `name`, returning `None` if no frame defines it.
	fn lookup(&self, name: &str) -> Option<&Value>;

	/// Looks up `name`, failing with [`EvalError::UnresolvedBinding`] if absent.
	fn resolve(&self, name: &str) -> Result<&Value, EvalError> {
		self.lookup(name)
			.ok_or_else(|| EvalError::UnresolvedBinding(name.to_string()))
	}
}

/// A single frame of named values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope(BTreeMap<String, Value>);

impl Scope {
	pub const fn new() -> Self {
		Self(BTreeMap::new())
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
		self.0.get_mut(name)
	}

	/// Inserts a value, returning the previous one.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(name.into(), value.into())
	}

	/// Builder-style insert.
	pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(name, value);
		self
	}

	pub fn remove(&mut self, name: &str) -> Option<Value> {
		self.0.remove(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
		self.0.iter()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Converts the frame into an object value.
	pub fn into_value(self) -> Value {
		Value::Object(self.0)
	}
}

impl Resolve for Scope {
	fn lookup(&self, name: &str) -> Option<&Value> {
		self.get(name)
	}
}

impl From<Object> for Scope {
	fn from(map: Object) -> Self {
		Self(map)
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		)
	}
}

impl IntoIterator for Scope {
	type Item = (String, Value);
	type IntoIter = btree_map::IntoIter<String, Value>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a Scope {
	type Item = (&'a String, &'a Value);
	type IntoIter = btree_map::Iter<'a, String, Value>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// Builds a [`Scope`] from `name => value` pairs.
///
/// ```
/// use sprig_core::{Value, scope};
///
/// let state = scope! { "count" => 0, "label" => "clicks" };
/// assert_eq!(state.get("count"), Some(&Value::Int(0)));
/// ```
#[macro_export]
macro_rules! scope {
	() => {
		$crate::Scope::new()
	};
	($($name:expr => $value:expr),+ $(,)?) => {{
		let mut scope = $crate::Scope::new();
		$(scope.insert($name, $value);)+
		scope
	}};
}

/// An ordered stack of frames, outermost first.
///
/// Frames pushed with [`push`](Self::push) are borrowed (typically an
/// instance's state, props and computed values). Frames pushed with
/// [`push_owned`](Self::push_owned) are owned locals (loop iterations, slot
/// data, `$event`); those are the frames a handler captures at render time.
#[derive(Debug, Clone, Default)]
pub struct ScopeChain<'a> {
	frames: Vec<Cow<'a, Scope>>,
}

impl<'a> ScopeChain<'a> {
	pub fn new() -> Self {
		Self { frames: Vec::new() }
	}

	/// Builds the chain a scoped slot fragment is evaluated against: the
	/// parent's lexical chain with `slot_data` as the innermost frame.
	pub fn for_slot(lexical: &ScopeChain<'a>, slot_data: Scope) -> Self {
		lexical.with_frame(slot_data)
	}

	/// Pushes a borrowed frame as the new innermost frame.
	pub fn push(&mut self, frame: &'a Scope) {
		self.frames.push(Cow::Borrowed(frame));
	}

	/// Pushes an owned frame as the new innermost frame.
	pub fn push_owned(&mut self, frame: Scope) {
		self.frames.push(Cow::Owned(frame));
	}

	/// Returns a copy of this chain with `frame` pushed as the innermost frame.
	pub fn with_frame(&self, frame: Scope) -> Self {
		let mut chain = self.clone();
		chain.push_owned(frame);
		chain
	}

	/// Number of frames.
	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	/// Clones the owned frames, outermost first.
	pub fn owned_frames(&self) -> Vec<Scope> {
		self.frames
			.iter()
			.filter_map(|frame| match frame {
				Cow::Owned(scope) => Some(scope.clone()),
				Cow::Borrowed(_) => None,
			})
			.collect()
	}
}

impl Resolve for ScopeChain<'_> {
	fn lookup(&self, name: &str) -> Option<&Value> {
		self.frames.iter().rev().find_map(|frame| frame.get(name))
	}
}
