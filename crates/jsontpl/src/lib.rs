//! Compile JSON templates with embedded `{{ expression }}` markers into
//! reusable [`Executable`]s.
//!
//! ```
//! use jsontpl::prelude::*;
//! use serde_json::json;
//!
//! let template = Value::from(json!({
//!     "greeting": "Hello, {{ name }}!",
//!     "total": "{{ a + b }}",
//!     "biggest": { "$max": ["{{ a }}", "{{ b }}"] }
//! }));
//!
//! let exe = compile(&template)?;
//! let out = exe.call_json(json!({ "name": "Ada", "a": 2, "b": 3 }))?;
//!
//! assert_eq!(
//!     out.to_json()?,
//!     json!({ "greeting": "Hello, Ada!", "total": 5, "biggest": 3 })
//! );
//! # Ok::<(), anyhow::Error>(())
//! ```

mod cache;

use anyhow::Result;
use tracing::debug;

pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, ExecutableCache};
pub use jsontpl_compile::{
    CompileError, CompileOptions, MAX_DEPTH, ObjectOptions, StringOptions, to_source,
    to_source_with,
};
pub use jsontpl_eval::{Context, EvalError, Executable, Function, Map, Value, adapt};
pub use jsontpl_syntax::{Diagnostic, ParseError, render_error};

/// Compiles `template` with the default options and wraps the result.
pub fn compile(template: &Value) -> Result<Executable> {
    compile_with(template, &CompileOptions::default())
}

pub fn compile_with(template: &Value, options: &CompileOptions) -> Result<Executable> {
    let source = to_source_with(template, options)?;
    debug!(len = source.len(), "compile");
    adapt(&source)
}

pub mod prelude {
    pub use crate::{CompileOptions, Context, Executable, Value};
    pub use crate::{adapt, compile, compile_with, to_source, to_source_with};
}
