//! Rendered views.
//!
//! Each instance render produces a [`View`]. Child instances appear as
//! [`View::Instance`] placeholders, so re-rendering a parent never touches the
//! views of children it reuses. [`App::render_to_string`](crate::App::render_to_string)
//! stitches the views back together.

use std::fmt::Write as _;

use crate::app::{HandlerId, InstanceId};

/// One rendered node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
	Element(ElementView),
	Text(String),
	Fragment(Vec<View>),
	/// A child instance, rendered from its own view.
	Instance(InstanceId),
	/// The instance failed to render.
	Failed(String),
	/// Nothing (a false condition, an empty slot).
	#[default]
	Empty,
}

/// A rendered element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
	pub tag: String,
	/// Attributes in declaration order. `None` is a bare (boolean) attribute.
	pub attrs: Vec<(String, Option<String>)>,
	/// Event name and the handler to pass to [`App::trigger`](crate::App::trigger).
	pub handlers: Vec<(String, HandlerId)>,
	pub children: Vec<View>,
}

impl ElementView {
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attrs: Vec::new(),
			handlers: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Returns an attribute value; bare attributes read as `""`.
	pub fn attr(&self, name: &str) -> Option<&str> {
		self.attrs
			.iter()
			.find(|(attr, _)| attr == name)
			.map(|(_, value)| value.as_deref().unwrap_or(""))
	}

	pub fn set_attr(&mut self, name: &str, value: Option<String>) {
		match self.attrs.iter_mut().find(|(attr, _)| attr == name) {
			Some((_, existing)) => *existing = value,
			None => self.attrs.push((name.to_string(), value)),
		}
	}

	pub fn remove_attr(&mut self, name: &str) {
		self.attrs.retain(|(attr, _)| attr != name);
	}

	pub fn handler(&self, event: &str) -> Option<HandlerId> {
		self.handlers
			.iter()
			.find(|(name, _)| name == event)
			.map(|(_, id)| *id)
	}

	/// Concatenated text of this element's own text descendants, skipping
	/// child instances.
	pub fn text_content(&self) -> String {
		let mut out = String::new();
		collect_text(&self.children, &mut out);
		out
	}
}

fn collect_text(views: &[View], out: &mut String) {
	for view in views {
		match view {
			View::Text(text) => out.push_str(text),
			View::Element(element) => collect_text(&element.children, out),
			View::Fragment(children) => collect_text(children, out),
			View::Instance(_) | View::Failed(_) | View::Empty => {}
		}
	}
}

/// Writes views as HTML, resolving instance placeholders through `resolve`.
pub(crate) struct HtmlWriter<'a, F> {
	pub resolve: F,
	pub error_comments: bool,
	pub out: &'a mut String,
}

impl<'v, F> HtmlWriter<'_, F>
where
	F: Fn(InstanceId) -> Option<&'v View>,
{
	pub fn write(&mut self, view: &View) {
		match view {
			View::Text(text) => self.out.push_str(&html_escape::encode_text(text)),
			View::Fragment(children) => children.iter().for_each(|child| self.write(child)),
			View::Instance(id) => {
				if let Some(child) = (self.resolve)(*id) {
					self.write(child);
				}
			}
			View::Failed(message) => {
				if self.error_comments {
					// `--` cannot appear inside an HTML comment.
					let _ = write!(self.out, "<!-- render failed: {} -->", message.replace("--", "- -"));
				}
			}
			View::Empty => {}
			View::Element(element) => {
				let _ = write!(self.out, "<{}", element.tag);
				for (name, value) in &element.attrs {
					match value {
						Some(value) => {
							let _ = write!(
								self.out,
								" {name}=\"{}\"",
								html_escape::encode_double_quoted_attribute(value)
							);
						}
						None => {
							let _ = write!(self.out, " {name}");
						}
					}
				}
				self.out.push('>');
				for child in &element.children {
					self.write(child);
				}
				let _ = write!(self.out, "</{}>", element.tag);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn write(view: &View, error_comments: bool) -> String {
		let mut out = String::new();
		HtmlWriter {
			resolve: |_: InstanceId| None::<&View>,
			error_comments,
			out: &mut out,
		}
		.write(view);
		out
	}

	#[rstest]
	fn test_escapes_text_and_attributes() {
		let mut element = ElementView::new("p");
		element.set_attr("title", Some("a \"quoted\" & more".to_string()));
		element.set_attr("hidden", None);
		element.children.push(View::Text("1 < 2 & 3".to_string()));

		assert_eq!(
			write(&View::Element(element), true),
			"<p title=\"a &quot;quoted&quot; &amp; more\" hidden>1 &lt; 2 &amp; 3</p>"
		);
	}

	#[rstest]
	#[case(true, "<!-- render failed: boom -->")]
	#[case(false, "")]
	fn test_failed_view(#[case] comments: bool, #[case] expected: &str) {
		assert_eq!(write(&View::Failed("boom".to_string()), comments), expected);
	}

	#[rstest]
	fn test_attr_lookup() {
		let mut element = ElementView::new("input");
		element.set_attr("value", Some("1".to_string()));
		element.set_attr("value", Some("2".to_string()));
		element.set_attr("disabled", None);

		assert_eq!(element.attr("value"), Some("2"));
		assert_eq!(element.attr("disabled"), Some(""));
		element.remove_attr("value");
		assert_eq!(element.attr("value"), None);
	}

	#[rstest]
	fn test_text_content_skips_instances() {
		let mut element = ElementView::new("li");
		element.children.push(View::Text("a".to_string()));
		element.children.push(View::Fragment(vec![
			View::Text("b".to_string()),
			View::Instance(InstanceId::next()),
		]));
		assert_eq!(element.text_content(), "ab");
	}
}
