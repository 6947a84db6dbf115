//! Prefix reducer, primitive functions, and workspace state for the
//! interpreter: everything that turns a compiled `aplc::Executable` into
//! values and side effects.

pub mod arithmetic;
pub mod attention;
pub mod compare;
pub mod diagnostics;
pub mod elementwise;
pub mod format;
pub mod host;
pub mod indexing;
pub mod operators;
pub mod prefix;
pub mod quad;
pub mod si;
pub mod structural;
pub mod workspace;

pub use attention::{AtomicAttention, AttentionSource};
pub use host::{LineInput, Output, StdioHost};
pub use prefix::{execute, Prefix};
pub use quad::Quad;
pub use si::StateIndicator;
pub use workspace::Workspace;
