//! Error types for expression parsing and evaluation.

use thiserror::Error;

/// Errors raised while parsing binding expressions, loop headers and handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExprError {
	/// The expression is not valid syntax.
	#[error("syntax error in `{source_text}` at offset {offset}: {message}")]
	Syntax {
		/// The full expression text.
		source_text: String,
		/// Byte offset where parsing stopped.
		offset: usize,
		/// Parser diagnostic.
		message: String,
	},

	/// An event handler that is neither a method name nor a method call.
	#[error("`{0}` is not a valid event handler: expected a method name or a method call")]
	InvalidHandler(String),

	/// A loop header that does not match `item in items` or `(item, index) in items`.
	#[error("`{0}` is not a valid loop header: expected `item in items` or `(item, index) in items`")]
	InvalidLoop(String),
}

/// Errors raised while evaluating an expression against a scope.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EvalError {
	/// A name that is absent from every frame of the scope chain.
	#[error("unresolved binding: {0}")]
	UnresolvedBinding(String),

	/// A binary operator applied to operands it does not support.
	#[error("cannot apply `{op}` to {lhs} and {rhs}")]
	InvalidOperands {
		/// Operator symbol.
		op: &'static str,
		/// Type name of the left operand.
		lhs: &'static str,
		/// Type name of the right operand.
		rhs: &'static str,
	},

	/// A unary operator applied to an operand it does not support.
	#[error("cannot apply `{op}` to {operand}")]
	InvalidOperand {
		/// Operator symbol.
		op: &'static str,
		/// Type name of the operand.
		operand: &'static str,
	},

	/// Member access on `undefined` or `null`.
	#[error("cannot read `{member}` of {target}")]
	InvalidMember {
		/// Member name.
		member: String,
		/// Type name of the target.
		target: &'static str,
	},

	/// Indexing with an unsupported target or index type.
	#[error("cannot index {target} with {index}")]
	InvalidIndex {
		/// Type name of the indexed value.
		target: &'static str,
		/// Type name of the index.
		index: &'static str,
	},

	/// Method calls are only meaningful in event handlers.
	#[error("method calls are not allowed in bindings: {0}()")]
	CallNotAllowed(String),

	/// Integer division or remainder by zero.
	#[error("division by zero")]
	DivisionByZero,

	/// An integer range larger than the loop limit.
	#[error("cannot loop over a range of {len}: the limit is {limit}")]
	RangeTooLarge {
		/// Requested range length.
		len: i64,
		/// Configured limit.
		limit: usize,
	},
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_syntax_error_display() {
		let err = ExprError::Syntax {
			source_text: "a +".to_string(),
			offset: 3,
			message: "unexpected end of input".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"syntax error in `a +` at offset 3: unexpected end of input"
		);
	}

	#[rstest]
	fn test_unresolved_binding_display() {
		let err = EvalError::UnresolvedBinding("item".to_string());
		assert_eq!(err.to_string(), "unresolved binding: item");
	}
}
