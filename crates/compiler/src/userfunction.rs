//! User-defined function and operator fixing (`⎕FX`-equivalent): header
//! parsing, label/body assembly, and the return sentinel.

use crate::executable::{Executable, ParseMode};
use crate::lambda::extract_lambdas;
use crate::parser::parse_line;
use crate::tokenizer::tokenize;
use apl_core::{
    ApError, ErrorKind, NameClass, Signature, SymbolTable, Token, TokenClass, UserFunctionHandle,
    Valence,
};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::instrument;

/// A fixed user function or operator: its header-declared names, its
/// labels, and its compiled body.
#[derive(Debug)]
pub struct UserFunction {
    name: String,
    signature: Signature,
    pub z_name: Option<String>,
    pub a_name: Option<String>,
    pub b_name: Option<String>,
    pub lo_name: Option<String>,
    pub ro_name: Option<String>,
    pub x_name: Option<String>,
    pub locals: Vec<String>,
    pub labels: HashMap<String, usize>,
    pub executable: Executable,
}

impl UserFunctionHandle for UserFunction {
    fn name(&self) -> &str {
        &self.name
    }
    fn valence(&self) -> Valence {
        self.signature.valence()
    }
    fn is_operator(&self) -> bool {
        self.signature.is_operator()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl UserFunction {
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Build the handle for an already-compiled `{…}` lambda body: no
    /// header to parse, no locals or labels of its own. `⍺`/`⍵` are bound
    /// directly by name, same as any other formal.
    pub(crate) fn from_lambda(
        executable: Executable,
        signature: Signature,
        a_name: Option<String>,
        b_name: Option<String>,
    ) -> UserFunction {
        UserFunction {
            name: "λ".to_string(),
            signature,
            z_name: Some("λ".to_string()),
            a_name,
            b_name,
            lo_name: None,
            ro_name: None,
            x_name: None,
            locals: Vec::new(),
            labels: HashMap::new(),
            executable,
        }
    }

    /// All names this function's entry must `push()`/shadow, in the order
    /// the invoking `Workspace` should restore them on exit: Z, locals,
    /// labels, then the bound arguments.
    pub fn shadowed_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        names.extend(self.z_name.clone());
        names.extend(self.locals.iter().cloned());
        names.extend(self.labels.keys().cloned());
        names.extend(self.a_name.clone());
        names.extend(self.b_name.clone());
        names.extend(self.lo_name.clone());
        names.extend(self.ro_name.clone());
        names.extend(self.x_name.clone());
        names
    }

    /// Fix (define) a function or operator from its display text — line 0
    /// is the header, the rest is the body. Registers the function under
    /// its header-declared name in `symtab` and returns the fixed handle.
    #[instrument(skip(lines, symtab))]
    pub fn fix(lines: &[String], symtab: &mut SymbolTable) -> Result<Rc<UserFunction>, ApError> {
        let Some(header_line) = lines.first() else {
            return Err(ApError::new(ErrorKind::Defn));
        };
        let header_tokens = tokenize(header_line, symtab)?;
        let header = parse_header(&header_tokens)?;

        let body_lines = &lines[1..];
        let mut body = Vec::new();
        let mut line_starts = vec![0usize; body_lines.len() + 1];
        let mut labels = HashMap::new();

        for (i, line) in body_lines.iter().enumerate() {
            let tokens = tokenize(line, symtab)?;
            let (label, rest) = peel_label(tokens);
            if let Some(name) = label {
                labels.insert(name, i + 1);
            }
            let rest = extract_lambdas(rest, symtab)?;
            line_starts[i + 1] = body.len();
            let mut parsed = parse_line(rest, symtab)?;
            if matches!(parsed.last().map(|t| &t.class), Some(TokenClass::EndLine)) {
                parsed.pop();
            }
            body.extend(parsed);
            body.push(Token::new(TokenClass::EndStatement));
        }

        check_no_duplicates(&header, &labels)?;

        line_starts[0] = body.len();
        let z_symbol = match &header.z_name {
            Some(n) => Some(symtab.lookup(n)?),
            None => None,
        };
        body.push(Token::new(TokenClass::Return { symbol: z_symbol }));

        let executable = Executable {
            text: lines.to_vec(),
            body,
            line_starts,
            parse_mode: ParseMode::UserFunction,
            name: Some(header.fun_name.clone()),
        };

        let func = Rc::new(UserFunction {
            name: header.fun_name.clone(),
            signature: header.signature,
            z_name: header.z_name,
            a_name: header.a_name,
            b_name: header.b_name,
            lo_name: header.lo_name,
            ro_name: header.ro_name,
            x_name: header.x_name,
            locals: header.locals,
            labels,
            executable,
        });

        let sym = symtab.lookup(&func.name)?;
        sym.set_current(NameClass::Function(func.clone() as Rc<dyn UserFunctionHandle>));
        Ok(func)
    }
}

fn peel_label(tokens: Vec<Token>) -> (Option<String>, Vec<Token>) {
    if tokens.len() >= 2 {
        if let (TokenClass::Symbol(sym), TokenClass::Colon) = (&tokens[0].class, &tokens[1].class) {
            let name = sym.name().to_string();
            return (Some(name), tokens[2..].to_vec());
        }
    }
    (None, tokens)
}

struct ParsedHeader {
    fun_name: String,
    signature: Signature,
    z_name: Option<String>,
    a_name: Option<String>,
    b_name: Option<String>,
    lo_name: Option<String>,
    ro_name: Option<String>,
    x_name: Option<String>,
    locals: Vec<String>,
}

/// Parse line 0: `[Z←][A] FUN [B]` for a plain function, or
/// `[Z←](LO FUN[RO])[X] [B]` for an operator, followed by `;local;local…`.
fn parse_header(tokens: &[Token]) -> Result<ParsedHeader, ApError> {
    let mut i = 0usize;
    let mut sig = Signature::default();
    let mut z_name = None;

    if tokens.len() >= 2 {
        if let (TokenClass::Symbol(z), TokenClass::Assign) = (&tokens[0].class, &tokens[1].class) {
            z_name = Some(z.name().to_string());
            sig.z = true;
            i = 2;
        }
    }

    let mut a_name = None;
    let mut b_name = None;
    let mut lo_name = None;
    let mut ro_name = None;
    let mut x_name = None;
    let fun_name;

    if matches!(tokens.get(i).map(|t| &t.class), Some(TokenClass::LParen)) {
        i += 1;
        lo_name = Some(expect_symbol(tokens, &mut i)?);
        fun_name = expect_symbol(tokens, &mut i)?;
        sig.lo = true;
        if matches!(tokens.get(i).map(|t| &t.class), Some(TokenClass::Symbol(_))) {
            ro_name = Some(expect_symbol(tokens, &mut i)?);
            sig.ro = true;
        }
        expect(tokens, &mut i, &TokenClass::RParen)?;
        if matches!(tokens.get(i).map(|t| &t.class), Some(TokenClass::LBracket)) {
            i += 1;
            x_name = Some(expect_symbol(tokens, &mut i)?);
            sig.x = true;
            expect(tokens, &mut i, &TokenClass::RBracket)?;
        }
        if matches!(tokens.get(i).map(|t| &t.class), Some(TokenClass::Symbol(_))) {
            b_name = Some(expect_symbol(tokens, &mut i)?);
            sig.b = true;
        }
    } else {
        let mut idents = Vec::new();
        let mut axis_after = None;
        while i < tokens.len() {
            match &tokens[i].class {
                TokenClass::Symbol(s) => {
                    idents.push(s.name().to_string());
                    i += 1;
                }
                TokenClass::LBracket => {
                    i += 1;
                    axis_after = Some(expect_symbol(tokens, &mut i)?);
                    sig.x = true;
                    expect(tokens, &mut i, &TokenClass::RBracket)?;
                }
                TokenClass::Semicolon | TokenClass::EndLine => break,
                _ => return Err(ApError::new(ErrorKind::Defn)),
            }
        }
        x_name = axis_after;
        match idents.len() {
            1 => fun_name = idents.remove(0),
            2 => {
                fun_name = idents.remove(0);
                b_name = Some(idents.remove(0));
                sig.b = true;
            }
            3 => {
                a_name = Some(idents.remove(0));
                fun_name = idents.remove(0);
                b_name = Some(idents.remove(0));
                sig.a = true;
                sig.b = true;
            }
            _ => return Err(ApError::new(ErrorKind::Defn)),
        }
    }

    let mut locals = Vec::new();
    while matches!(tokens.get(i).map(|t| &t.class), Some(TokenClass::Semicolon)) {
        i += 1;
        locals.push(expect_symbol(tokens, &mut i)?);
    }

    Ok(ParsedHeader {
        fun_name,
        signature: sig,
        z_name,
        a_name,
        b_name,
        lo_name,
        ro_name,
        x_name,
        locals,
    })
}

fn expect_symbol(tokens: &[Token], i: &mut usize) -> Result<String, ApError> {
    match tokens.get(*i).map(|t| &t.class) {
        Some(TokenClass::Symbol(s)) => {
            *i += 1;
            Ok(s.name().to_string())
        }
        _ => Err(ApError::new(ErrorKind::Defn)),
    }
}

fn expect(tokens: &[Token], i: &mut usize, want: &TokenClass) -> Result<(), ApError> {
    let matches = match (tokens.get(*i).map(|t| &t.class), want) {
        (Some(TokenClass::RParen), TokenClass::RParen) => true,
        (Some(TokenClass::RBracket), TokenClass::RBracket) => true,
        _ => false,
    };
    if matches {
        *i += 1;
        Ok(())
    } else {
        Err(ApError::new(ErrorKind::Defn))
    }
}

fn check_no_duplicates(header: &ParsedHeader, labels: &HashMap<String, usize>) -> Result<(), ApError> {
    let mut seen = HashSet::new();
    let all = header
        .z_name
        .iter()
        .chain(header.a_name.iter())
        .chain(header.b_name.iter())
        .chain(header.lo_name.iter())
        .chain(header.ro_name.iter())
        .chain(header.x_name.iter())
        .chain(header.locals.iter())
        .chain(labels.keys());
    for name in all {
        if !seen.insert(name) {
            return Err(ApError::new(ErrorKind::Defn));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apl_core::NameClass;

    #[test]
    fn fixes_monadic_function_with_result() {
        let mut st = SymbolTable::new();
        let lines = vec!["Z←DOUBLE B".to_string(), "Z←B+B".to_string()];
        let f = UserFunction::fix(&lines, &mut st).unwrap();
        assert_eq!(f.name(), "DOUBLE");
        assert_eq!(f.valence(), Valence::Monadic);
        assert_eq!(f.b_name.as_deref(), Some("B"));
        let sym = st.lookup("DOUBLE").unwrap();
        assert!(matches!(sym.current(), NameClass::Function(_)));
    }

    #[test]
    fn fixes_dyadic_function_and_label() {
        let mut st = SymbolTable::new();
        let lines = vec![
            "Z←A SUM B".to_string(),
            "START:Z←A+B".to_string(),
            "→0".to_string(),
        ];
        let f = UserFunction::fix(&lines, &mut st).unwrap();
        assert_eq!(f.valence(), Valence::Dyadic);
        assert_eq!(f.labels.get("START"), Some(&1));
    }

    #[test]
    fn duplicate_local_and_formal_is_defn_error() {
        let mut st = SymbolTable::new();
        let lines = vec!["Z←F B;B".to_string(), "Z←B".to_string()];
        assert!(UserFunction::fix(&lines, &mut st).is_err());
    }

    #[test]
    fn fixes_monadic_operator() {
        let mut st = SymbolTable::new();
        let lines = vec!["Z←(LO EACH) B".to_string(), "Z←LO B".to_string()];
        let f = UserFunction::fix(&lines, &mut st).unwrap();
        assert!(f.is_operator());
        assert_eq!(f.lo_name.as_deref(), Some("LO"));
    }
}
