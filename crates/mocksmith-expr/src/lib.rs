//! Restricted expression language for column post-processing.
//!
//! Expressions are whitelisted token by token ([`is_safe`]), parsed into a
//! closed [`Expr`] tree and walked by an [`Evaluator`] that can only reach the
//! approved builtins and the row locals `this`, `field` and `param`, plus the
//! `fake` generator handle.

pub mod ast;
pub mod errors;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod validator;
pub mod value;

pub use ast::Expr;
pub use errors::{ErrorKind, EvalError, ExprError, SyntaxError};
pub use evaluator::{Evaluator, Locals, evaluate};
pub use functions::{Builtin, CallScope, parse_timedelta};
pub use parser::parse;
pub use validator::is_safe;
pub use value::Value;
