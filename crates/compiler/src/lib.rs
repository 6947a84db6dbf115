//! Tokenizer, parser, lambda extraction and function-fixing front end.
//!
//! Turns source text into the reversed token bodies `apl-runtime`'s prefix
//! reducer consumes, and fixes user-defined functions/operators and `{…}`
//! lambdas into [`UserFunctionHandle`](apl_core::UserFunctionHandle) impls.

pub mod executable;
pub mod lambda;
pub mod parser;
pub mod tokenizer;
pub mod userfunction;

pub use executable::{Executable, ParseMode};
pub use lambda::extract_lambdas;
pub use parser::parse_line;
pub use tokenizer::tokenize;
pub use userfunction::UserFunction;
