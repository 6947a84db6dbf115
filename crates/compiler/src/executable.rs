//! Compiled unit: source lines, prepared body, line table.

use crate::lambda::extract_lambdas;
use crate::parser::parse_line;
use crate::tokenizer::tokenize;
use apl_core::{ApError, FunctionRef, SymbolTable, Token, TokenClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    ExecuteExpression,
    StatementList,
    UserFunction,
}

/// A compiled unit: display text, the reversed-per-statement body, and (for
/// user functions) the line table `→` branches against.
#[derive(Debug)]
pub struct Executable {
    pub text: Vec<String>,
    pub body: Vec<Token>,
    /// `line_starts[0]` is the PC of the return sentinel; `line_starts[n]`
    /// for `n >= 1` is the first body token of source line `n`.
    pub line_starts: Vec<usize>,
    pub parse_mode: ParseMode,
    pub name: Option<String>,
}

impl Executable {
    /// Compile one typed line: an execute-expression or a directly-entered
    /// statement list. No return sentinel; `→` with no target just escapes
    /// (there is no caller to pop to below the top level).
    pub fn compile_immediate(
        line: &str,
        symtab: &mut SymbolTable,
        mode: ParseMode,
    ) -> Result<Executable, ApError> {
        let tokens = tokenize(line, symtab)?;
        let tokens = extract_lambdas(tokens, symtab)?;
        let body = parse_line(tokens, symtab)?;
        Ok(Executable {
            text: vec![line.to_string()],
            body,
            line_starts: vec![0],
            parse_mode: mode,
            name: None,
        })
    }

    /// The source line a given body PC falls on (1-based), or `0` for the
    /// return sentinel / not found.
    pub fn line_of_pc(&self, pc: usize) -> usize {
        let mut best = 0;
        for (line, &start) in self.line_starts.iter().enumerate().skip(1) {
            if start <= pc {
                best = line;
            }
        }
        best
    }

    /// Reconstruct the display image of the statement whose tokens occupy
    /// `range` (inclusive), walking the tokens in source order (the body
    /// itself is stored reversed) and rendering each one's textual form.
    pub fn statement_image(&self, range: (usize, usize)) -> String {
        let (lo, hi) = range;
        let hi = hi.min(self.body.len().saturating_sub(1));
        if lo > hi {
            return String::new();
        }
        let mut parts: Vec<String> = self.body[lo..=hi].iter().map(render_token).collect();
        parts.reverse();
        parts.join(" ")
    }
}

fn render_token(tok: &Token) -> String {
    match &tok.class {
        TokenClass::Value(v) => format!("{:?}", v.borrow().ravel()),
        TokenClass::Symbol(s) | TokenClass::LeftSymbol(s) | TokenClass::ParenSymbol(s) => {
            s.name().to_string()
        }
        TokenClass::LeftSymbolList(syms) => {
            let names: Vec<&str> = syms.iter().map(|s| s.name()).collect();
            format!("({})", names.join(" "))
        }
        TokenClass::Function(ft) => match &ft.func {
            FunctionRef::Primitive(c) => c.to_string(),
            FunctionRef::User(f) => f.name().to_string(),
            FunctionRef::Derived(d) => d.op_glyph.to_string(),
        },
        TokenClass::MonadicOp(c) | TokenClass::DyadicOp(c) => c.to_string(),
        TokenClass::LParen => "(".to_string(),
        TokenClass::RParen => ")".to_string(),
        TokenClass::LBracket => "[".to_string(),
        TokenClass::RBracket => "]".to_string(),
        TokenClass::LCurly => "{".to_string(),
        TokenClass::RCurly => "}".to_string(),
        TokenClass::Assign => "←".to_string(),
        TokenClass::Diamond => "◊".to_string(),
        TokenClass::Colon => ":".to_string(),
        TokenClass::Semicolon => ";".to_string(),
        TokenClass::Branch => "→".to_string(),
        TokenClass::Return { .. } | TokenClass::EndStatement | TokenClass::EndLine => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apl_core::SymbolTable;

    #[test]
    fn compiles_immediate_expression() {
        let mut st = SymbolTable::new();
        let exe = Executable::compile_immediate("1+2", &mut st, ParseMode::ExecuteExpression).unwrap();
        assert!(!exe.body.is_empty());
    }
}
