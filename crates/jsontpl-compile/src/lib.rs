//! The template compiler: turns a JSON-shaped [`Value`](jsontpl_eval::Value)
//! with `{{ }}` interpolation markers into expression source that
//! [`jsontpl_eval::adapt`] can evaluate.
//!
//! ```
//! use jsontpl_compile::to_source;
//! use jsontpl_eval::Value;
//!
//! let template = Value::from(serde_json::json!({ "greeting": "hi {{ name }}" }));
//! assert_eq!(to_source(&template).unwrap(), "{ 'greeting': `hi ${name}` }");
//! ```

pub mod compiler;
pub mod error;
pub mod interpolate;
pub mod options;

pub use compiler::{MAX_DEPTH, to_source, to_source_with};
pub use error::CompileError;
pub use interpolate::{Placeholder, Segment, interpolate, segments};
pub use options::{CompileOptions, ObjectOptions, StringOptions};
