//! `{…}` lambda extraction: turns each brace span into an anonymous
//! function token bound to a synthetic `λ←` body, innermost first so a
//! nested lambda becomes an ordinary function reference inside its
//! enclosing one.

use crate::executable::{Executable, ParseMode};
use crate::parser::parse_line;
use crate::userfunction::UserFunction;
use apl_core::{
    ApError, ErrorKind, FunctionRef, FunctionToken, Signature, SymbolTable, Token, TokenClass,
    UserFunctionHandle,
};
use std::rc::Rc;

pub fn extract_lambdas(tokens: Vec<Token>, symtab: &mut SymbolTable) -> Result<Vec<Token>, ApError> {
    let mut tokens = tokens;
    while let Some((open, close)) = find_innermost_braces(&tokens) {
        let inner = tokens[open + 1..close].to_vec();
        let lambda = fix_lambda(inner, symtab)?;
        let func = FunctionToken {
            valence: lambda.valence(),
            func: FunctionRef::User(lambda as Rc<dyn UserFunctionHandle>),
        };
        tokens.splice(open..=close, std::iter::once(Token::new(TokenClass::Function(func))));
    }
    Ok(tokens)
}

/// The innermost (deepest-nested) brace pair: scanning left to right, an
/// opener seen after an earlier unmatched opener overwrites it, so the
/// first closer reached always pairs with the deepest opener seen so far.
fn find_innermost_braces(tokens: &[Token]) -> Option<(usize, usize)> {
    let mut open_idx = None;
    for (i, t) in tokens.iter().enumerate() {
        match t.class {
            TokenClass::LCurly => open_idx = Some(i),
            TokenClass::RCurly => {
                if let Some(o) = open_idx {
                    return Some((o, i));
                }
            }
            _ => {}
        }
    }
    None
}

fn fix_lambda(inner: Vec<Token>, symtab: &mut SymbolTable) -> Result<Rc<UserFunction>, ApError> {
    for t in &inner {
        if matches!(t.class, TokenClass::Diamond | TokenClass::Branch) {
            return Err(ApError::new(ErrorKind::Defn));
        }
    }

    let mut sig = Signature::default();
    for t in &inner {
        if let TokenClass::Symbol(s) = &t.class {
            match s.name() {
                "⍵" | "⍹" => sig.b = true,
                "⍺" | "⍶" => sig.a = true,
                "χ" => return Err(ApError::new(ErrorKind::NotYetImplemented)),
                _ => {}
            }
        }
    }
    if sig.a {
        sig.b = true;
    }

    let lambda_symbol = symtab.lookup("λ")?;
    let mut body = Vec::new();

    if !inner.is_empty() {
        let mut prologue = vec![
            Token::new(TokenClass::Symbol(lambda_symbol.clone())),
            Token::new(TokenClass::Assign),
        ];
        prologue.extend(inner);
        let mut parsed = parse_line(prologue, symtab)?;
        if matches!(parsed.last().map(|t| &t.class), Some(TokenClass::EndLine)) {
            parsed.pop();
        }
        body.extend(parsed);
        body.push(Token::new(TokenClass::EndStatement));
    }

    let line_starts = vec![body.len(), 0];
    body.push(Token::new(TokenClass::Return {
        symbol: Some(lambda_symbol),
    }));

    let executable = Executable {
        text: Vec::new(),
        body,
        line_starts,
        parse_mode: ParseMode::UserFunction,
        name: Some("λ".to_string()),
    };

    let a_name = if sig.a { Some("⍺".to_string()) } else { None };
    let b_name = if sig.b { Some("⍵".to_string()) } else { None };
    Ok(Rc::new(UserFunction::from_lambda(executable, sig, a_name, b_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apl_core::TokenClass;
    use crate::tokenizer::tokenize;

    #[test]
    fn extracts_simple_lambda_to_function_token() {
        let mut st = SymbolTable::new();
        let tokens = tokenize("{⍵+1}", &mut st).unwrap();
        let out = extract_lambdas(tokens, &mut st).unwrap();
        let funcs: Vec<_> = out.iter().filter(|t| t.is_function()).collect();
        assert_eq!(funcs.len(), 1);
    }

    #[test]
    fn nested_lambda_extracts_innermost_first() {
        let mut st = SymbolTable::new();
        let tokens = tokenize("{⍺ {⍵+1} ⍵}", &mut st).unwrap();
        let out = extract_lambdas(tokens, &mut st).unwrap();
        assert!(!out.iter().any(|t| matches!(t.class, TokenClass::LCurly | TokenClass::RCurly)));
    }

    #[test]
    fn diamond_in_lambda_body_is_defn_error() {
        let mut st = SymbolTable::new();
        let tokens = tokenize("{⍵+1 ◊ ⍵-1}", &mut st).unwrap();
        assert!(extract_lambdas(tokens, &mut st).is_err());
    }
}
