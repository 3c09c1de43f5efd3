//! # sprig-core
//!
//! Leaf building blocks for the sprig component runtime.
//!
//! ## Modules
//!
//! - [`value`]: the dynamic [`Value`] type carried by props, state, slot data and
//!   event payloads
//! - [`scope`]: string-keyed [`Scope`] frames and the [`ScopeChain`] used for
//!   name resolution
//! - [`expr`]: the binding expression language (parser and evaluator)
//! - [`error`]: parse and evaluation errors
//!
//! ## Example
//!
//! ```
//! use sprig_core::{Expr, ScopeChain, Value, scope};
//!
//! let state = scope! { "count" => 2 };
//! let mut chain = ScopeChain::new();
//! chain.push(&state);
//!
//! let expr = Expr::parse("count * 10 + 1").unwrap();
//! assert_eq!(expr.eval(&chain).unwrap(), Value::Int(21));
//! ```

pub mod error;
pub mod expr;
pub mod scope;
pub mod value;

pub use error::{EvalError, ExprError};
pub use expr::{BinaryOp, Expr, LoopHeader, MethodCall, UnaryOp};
pub use scope::{Resolve, Scope, ScopeChain};
pub use value::{Object, Value};
