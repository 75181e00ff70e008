//! Multi-dialect SQL rendering.
//!
//! Build SQL as a typed statement tree, then render it to injection-safe
//! text for one of three backends (T-SQL, MySQL, PostgreSQL). Literals are
//! always inlined as escaped text; there is no parameter binding here.
//!
//! Rendering is synchronous and allocates all of its state per call, so
//! concurrent renders on separate trees need no locking.

mod alias;
mod cte;
mod dialect;
mod error;
mod escape;
mod expr;
mod merge;
mod render;
mod stmt;
mod types;

pub use alias::{AliasAllocator, AliasId, AliasRef};
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use escape::{escape_backslash, escape_doubling, valid_function_name};
pub use expr::*;
pub use merge::merge_into_statements;
pub use render::{RenderOptions, render_script, render_statement};
pub use stmt::*;
pub use types::*;
