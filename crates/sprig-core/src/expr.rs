//! Binding expression language.
//!
//! Templates bind props, attributes, conditions, loop sources and event handlers
//! with small expressions such as `item.name`, `count + 1`, `items.length > 0`
//! or `remove(item)`. This module holds the AST and its evaluator; parsing lives
//! in [`parser`].
//!
//! Method calls only make sense as event handlers, where they name a method on
//! the instance that authored the template. Evaluating a call inside a binding
//! fails with [`EvalError::CallNotAllowed`].

mod parser;

use std::cmp::Ordering;

use crate::error::{EvalError, ExprError};
use crate::scope::Resolve;
use crate::value::Value;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	/// Logical negation (`!`).
	Not,
	/// Numeric negation (`-`).
	Neg,
}

/// Binary operators, lowest precedence last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Mul,
	Div,
	Rem,
	Add,
	Sub,
	Lt,
	Le,
	Gt,
	Ge,
	Eq,
	Ne,
	And,
	Or,
}

impl BinaryOp {
	pub fn symbol(self) -> &'static str {
		match self {
			Self::Mul => "*",
			Self::Div => "/",
			Self::Rem => "%",
			Self::Add => "+",
			Self::Sub => "-",
			Self::Lt => "<",
			Self::Le => "<=",
			Self::Gt => ">",
			Self::Ge => ">=",
			Self::Eq => "==",
			Self::Ne => "!=",
			Self::And => "&&",
			Self::Or => "||",
		}
	}
}

/// Expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	/// Literal value.
	Literal(Value),
	/// Bare name, resolved against the scope chain.
	Ident(String),
	/// Member access: `target.name`.
	Member(Box<Expr>, String),
	/// Indexing: `target[index]`.
	Index(Box<Expr>, Box<Expr>),
	/// Method call: `name(args...)`.
	Call(String, Vec<Expr>),
	/// Unary operation.
	Unary(UnaryOp, Box<Expr>),
	/// Binary operation.
	Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// An event handler: the method to invoke on the authoring instance and the
/// argument expressions, if written as a call.
///
/// A bare method name (`on_change`) has no argument list and receives the event
/// payload as its only argument. A call (`remove(item)`, `select($event, i)`)
/// evaluates its arguments in the scope captured where the handler was bound,
/// with `$event` bound to the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
	pub method: String,
	pub args: Option<Vec<Expr>>,
}

impl MethodCall {
	/// Parses a handler expression.
	pub fn parse(source: &str) -> Result<Self, ExprError> {
		match Expr::parse(source) {
			Ok(Expr::Ident(method)) => Ok(Self { method, args: None }),
			Ok(Expr::Call(method, args)) => Ok(Self {
				method,
				args: Some(args),
			}),
			Ok(_) => Err(ExprError::InvalidHandler(source.to_string())),
			Err(err) => Err(err),
		}
	}
}

/// A parsed loop header: `item in items`, `(item, index) in items` (or `of`).
#[derive(Debug, Clone, PartialEq)]
pub struct LoopHeader {
	pub item: String,
	pub index: Option<String>,
	pub source: Expr,
}

impl LoopHeader {
	pub fn parse(source: &str) -> Result<Self, ExprError> {
		parser::parse_loop_header(source)
	}
}

impl Expr {
	/// Parses an expression.
	///
	/// # Examples
	///
	/// ```
	/// use sprig_core::Expr;
	///
	/// let expr = Expr::parse("items.length > 0").unwrap();
	/// assert!(matches!(expr, Expr::Binary(..)));
	/// assert!(Expr::parse("a +").is_err());
	/// ```
	pub fn parse(source: &str) -> Result<Self, ExprError> {
		parser::parse_expression(source)
	}

	/// Evaluates the expression against `env`.
	pub fn eval<R: Resolve + ?Sized>(&self, env: &R) -> Result<Value, EvalError> {
		match self {
			Self::Literal(value) => Ok(value.clone()),
			Self::Ident(name) => env.resolve(name).cloned(),
			Self::Member(target, member) => read_member(target.eval(env)?, member),
			Self::Index(target, index) => read_index(target.eval(env)?, index.eval(env)?),
			Self::Call(name, _) => Err(EvalError::CallNotAllowed(name.clone())),
			Self::Unary(op, operand) => apply_unary(*op, operand.eval(env)?),
			Self::Binary(BinaryOp::And, lhs, rhs) => {
				let left = lhs.eval(env)?;
				if left.is_truthy() { rhs.eval(env) } else { Ok(left) }
			}
			Self::Binary(BinaryOp::Or, lhs, rhs) => {
				let left = lhs.eval(env)?;
				if left.is_truthy() { Ok(left) } else { rhs.eval(env) }
			}
			Self::Binary(op, lhs, rhs) => apply_binary(*op, lhs.eval(env)?, rhs.eval(env)?),
		}
	}
}

fn read_member(target: Value, member: &str) -> Result<Value, EvalError> {
	match (&target, member) {
		(Value::Undefined | Value::Null, _) => Err(EvalError::InvalidMember {
			member: member.to_string(),
			target: target.type_name(),
		}),
		(Value::List(items), "length") => Ok(Value::from(items.len())),
		(Value::String(s), "length") => Ok(Value::from(s.chars().count())),
		(Value::Object(map), _) => Ok(map.get(member).cloned().unwrap_or_default()),
		_ => Ok(Value::Undefined),
	}
}

fn read_index(target: Value, index: Value) -> Result<Value, EvalError> {
	match (&target, &index) {
		(Value::List(items), Value::Int(i)) => Ok(usize::try_from(*i)
			.ok()
			.and_then(|i| items.get(i).cloned())
			.unwrap_or_default()),
		(Value::String(s), Value::Int(i)) => Ok(usize::try_from(*i)
			.ok()
			.and_then(|i| s.chars().nth(i))
			.map(|c| Value::String(c.to_string()))
			.unwrap_or_default()),
		(Value::Object(map), Value::String(key)) => Ok(map.get(key).cloned().unwrap_or_default()),
		_ => Err(EvalError::InvalidIndex {
			target: target.type_name(),
			index: index.type_name(),
		}),
	}
}

fn apply_unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
	match (op, operand) {
		(UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
		(UnaryOp::Neg, Value::Int(n)) => Ok(n
			.checked_neg()
			.map(Value::Int)
			.unwrap_or(Value::Float(-(n as f64)))),
		(UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
		(UnaryOp::Neg, other) => Err(EvalError::InvalidOperand {
			op: "-",
			operand: other.type_name(),
		}),
	}
}

fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
	let invalid = |lhs: &Value, rhs: &Value| EvalError::InvalidOperands {
		op: op.symbol(),
		lhs: lhs.type_name(),
		rhs: rhs.type_name(),
	};

	match op {
		BinaryOp::Eq => Ok(Value::Bool(lhs.loose_eq(&rhs))),
		BinaryOp::Ne => Ok(Value::Bool(!lhs.loose_eq(&rhs))),
		BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
			let ordering = lhs
				.partial_order(&rhs)
				.ok_or_else(|| invalid(&lhs, &rhs))?;
			Ok(Value::Bool(match op {
				BinaryOp::Lt => ordering == Ordering::Less,
				BinaryOp::Le => ordering != Ordering::Greater,
				BinaryOp::Gt => ordering == Ordering::Greater,
				_ => ordering != Ordering::Less,
			}))
		}
		BinaryOp::Add => match (&lhs, &rhs) {
			(Value::String(a), b) => Ok(Value::String(format!("{a}{}", b.to_display_string()))),
			(a, Value::String(b)) => Ok(Value::String(format!("{}{b}", a.to_display_string()))),
			(Value::Int(a), Value::Int(b)) => Ok(a
				.checked_add(*b)
				.map(Value::Int)
				.unwrap_or(Value::Float(*a as f64 + *b as f64))),
			_ => float_op(&lhs, &rhs, |a, b| a + b).ok_or_else(|| invalid(&lhs, &rhs)),
		},
		BinaryOp::Sub => match (&lhs, &rhs) {
			(Value::Int(a), Value::Int(b)) => Ok(a
				.checked_sub(*b)
				.map(Value::Int)
				.unwrap_or(Value::Float(*a as f64 - *b as f64))),
			_ => float_op(&lhs, &rhs, |a, b| a - b).ok_or_else(|| invalid(&lhs, &rhs)),
		},
		BinaryOp::Mul => match (&lhs, &rhs) {
			(Value::Int(a), Value::Int(b)) => Ok(a
				.checked_mul(*b)
				.map(Value::Int)
				.unwrap_or(Value::Float(*a as f64 * *b as f64))),
			_ => float_op(&lhs, &rhs, |a, b| a * b).ok_or_else(|| invalid(&lhs, &rhs)),
		},
		BinaryOp::Div => match (&lhs, &rhs) {
			(Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
			(Value::Int(a), Value::Int(b)) if a.checked_rem(*b) == Some(0) => Ok(Value::Int(a / b)),
			_ => float_op(&lhs, &rhs, |a, b| a / b).ok_or_else(|| invalid(&lhs, &rhs)),
		},
		BinaryOp::Rem => match (&lhs, &rhs) {
			(Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
			(Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.checked_rem(*b).unwrap_or(0))),
			_ => float_op(&lhs, &rhs, |a, b| a % b).ok_or_else(|| invalid(&lhs, &rhs)),
		},
		// Short-circuiting operators are handled in `Expr::eval`.
		BinaryOp::And | BinaryOp::Or => Err(invalid(&lhs, &rhs)),
	}
}

fn float_op(lhs: &Value, rhs: &Value, f: impl FnOnce(f64, f64) -> f64) -> Option<Value> {
	Some(Value::Float(f(lhs.as_f64()?, rhs.as_f64()?)))
}
