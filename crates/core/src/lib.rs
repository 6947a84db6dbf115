//! Value model for the APL interpreter core.
//!
//! Owns the data that every other crate in the workspace operates on:
//! shapes, cells, rectangular values, lex/parse tokens, and the symbol
//! table.

pub mod cell;
pub mod error;
pub mod index;
pub mod shape;
pub mod signature;
pub mod symbol;
pub mod token;
pub mod value;

pub use cell::{Cell, CellOrdering, LeftValueCell, PointerCell};
pub use error::{ApError, ErrorKind, PcRange};
pub use index::IndexExpr;
pub use shape::{Shape, R_MAX};
pub use signature::Signature;
pub use symbol::{NameClass, Symbol, SymbolTable};
pub use token::{DerivedFunction, FunctionRef, FunctionToken, Token, TokenClass, UserFunctionHandle, Valence};
pub use value::{Value, ValueFlags, ValueRef};
