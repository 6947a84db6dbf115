//! Lex/parse units.

use crate::symbol::Symbol;
use crate::value::ValueRef;
use std::rc::Rc;

/// Function valence: how many arguments a function token accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valence {
    Monadic,
    Dyadic,
    /// Ambivalent until the call site decides whether a left argument was
    /// bound (e.g. `/` as reduce vs. as a dyadic primitive).
    Ambivalent,
}

/// A user-defined function or lambda, as seen from the token/reducer layer.
/// `apl-core` only needs to know the shape callers rely on; the concrete
/// fixed-up function (header, body, locals, labels) lives in `aplc`, which
/// depends on this crate and implements the trait there.
pub trait UserFunctionHandle: std::fmt::Debug {
    fn name(&self) -> &str;
    fn valence(&self) -> Valence;
    fn is_operator(&self) -> bool;
    /// Lets the reducer (in `apl-runtime`, which depends on `aplc`) recover
    /// the concrete `aplc::UserFunction` behind this handle via
    /// `downcast_ref` — this crate only needs the three methods above.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// The function classes the reducer dispatches on.
#[derive(Debug, Clone)]
pub enum FunctionRef {
    /// A built-in primitive, identified by its glyph.
    Primitive(char),
    /// A user-defined function or a lambda.
    User(Rc<dyn UserFunctionHandle>),
    /// A function value produced by binding an operator to its operand
    /// function(s).
    Derived(Rc<DerivedFunction>),
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FunctionRef::Primitive(a), FunctionRef::Primitive(b)) => a == b,
            (FunctionRef::User(a), FunctionRef::User(b)) => Rc::ptr_eq(a, b),
            (FunctionRef::Derived(a), FunctionRef::Derived(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// `V OP F [G]` binds an operator to one or two operand functions.
#[derive(Debug, Clone)]
pub struct DerivedFunction {
    pub op_glyph: char,
    pub left: FunctionToken,
    pub right: Option<FunctionToken>,
    /// The bound left operand, when the operator's left argument is a
    /// value rather than a function (e.g. a derived `N∘F` style binding).
    /// Unused by the core operator set in but kept for
    /// extensibility the same way the reference keeps a generic operand
    /// slot on `DerivedFunction`.
    pub bound_value: Option<ValueRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionToken {
    pub func: FunctionRef,
    pub valence: Valence,
}

/// The token class, which drives the reducer's phrase table.
#[derive(Debug, Clone)]
pub enum TokenClass {
    Value(ValueRef),
    Function(FunctionToken),
    MonadicOp(char),
    DyadicOp(char),
    Symbol(Rc<Symbol>),
    /// A symbol retagged as the left side of an assignment (`LSYMB`).
    LeftSymbol(Rc<Symbol>),
    /// A parenthesized list of `LSYMB`s for vector assignment (`LSYMB2`).
    LeftSymbolList(Vec<Rc<Symbol>>),
    LParen,
    RParen,
    /// Parenthesized single symbol, retagged `P_SYMB` so `(F)/B` can be
    /// told apart from `F/B`.
    ParenSymbol(Rc<Symbol>),
    LBracket,
    RBracket,
    LCurly,
    RCurly,
    Assign,
    Diamond,
    Colon,
    Semicolon,
    Branch,
    Return { symbol: Option<Rc<Symbol>> },
    EndStatement,
    EndLine,
}

/// Payload carried alongside a token, beyond what its class already fixes.
/// Axis values and literal forms mostly fold directly into the
/// `TokenClass` variants above (an enum that is its own discriminant);
/// this struct holds only matching/source metadata every class needs
/// regardless of its `TokenClass`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenMeta {
    /// Bracket/paren/curly distance to the matching closer. Positive when this token opens, negative when it closes.
    pub match_distance: Option<isize>,
    /// Source column range (start, end) in the original line, for caret
    /// rendering.
    pub source_span: Option<(usize, usize)>,
    /// An explicit axis argument attached to a function token (`F[X]`).
    pub axis: Option<ValueRefSlot>,
}

/// Holder so `TokenMeta` can derive `PartialEq`/`Eq` without requiring
/// `ValueRef` to implement them (identity comparison is what matters here).
#[derive(Debug, Clone, Default)]
pub struct ValueRefSlot(pub Option<ValueRef>);

impl PartialEq for ValueRefSlot {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}
impl Eq for ValueRefSlot {}

/// One token: class plus matching/source metadata.
#[derive(Debug, Clone)]
pub struct Token {
    pub class: TokenClass,
    pub meta: TokenMeta,
}

impl Token {
    pub fn new(class: TokenClass) -> Self {
        Token {
            class,
            meta: TokenMeta::default(),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self.class, TokenClass::Value(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.class, TokenClass::Function(_))
    }
}
