//! # jsontpl Eval
//!
//! Runtime for compiled templates: the [`Value`] model, the [`Context`]
//! identifiers resolve against, a fixed set of builtins, and [`adapt`], which
//! turns compiled source into a reusable [`Executable`].
//!
//! ```rust
//! use jsontpl_eval::{adapt, Context, Value};
//!
//! let exe = adapt("a + b").unwrap();
//! let ctx = Context::new().with_variable("a", 2).with_variable("b", 3);
//! assert_eq!(exe.call(&ctx).unwrap(), Value::Number(5.0));
//! ```

pub mod binary_ops;
pub mod builtins;
pub mod context;
pub mod error;
pub mod executable;
pub mod executor;
pub mod value;

pub use context::Context;
pub use error::EvalError;
pub use executable::{Executable, adapt};
pub use executor::Executor;
pub use value::{Function, Map, Value};
