//! Token vector → prepared body.
//!
//! Six passes, each documented at its function: statement split, paren
//! collapse, constant grouping, left-symbol marking, `/ ⌿ \ ⍀`
//! disambiguation, and bracket/paren/curly matching.

use apl_core::{ApError, Cell, ErrorKind, FunctionRef, SymbolTable, Token, TokenClass};
use tracing::instrument;

/// Parse one already-tokenized source line into final body layout: each
/// statement reversed, separated by `EndStatement`, terminated by
/// `EndLine`. Multi-line assembly (stripping/re-adding `EndLine`, tracking
/// `line_starts`) is `Executable`'s job (`executable.rs`).
#[instrument(skip(tokens, symtab))]
pub fn parse_line(tokens: Vec<Token>, symtab: &mut SymbolTable) -> Result<Vec<Token>, ApError> {
    let trimmed = strip_trailing_end_line(tokens);
    let statements = split_statements(trimmed);

    let mut processed = Vec::with_capacity(statements.len());
    for stmt in statements {
        let stmt = collapse_parens(stmt)?;
        let stmt = group_constants(stmt)?;
        let stmt = mark_left_symbols(stmt, symtab)?;
        let stmt = disambiguate_slash(stmt)?;
        let stmt = match_brackets(stmt)?;
        processed.push(stmt);
    }

    let mut body = Vec::new();
    for (i, stmt) in processed.into_iter().enumerate() {
        if i > 0 {
            body.push(Token::new(TokenClass::EndStatement));
        }
        body.extend(stmt.into_iter().rev());
    }
    body.push(Token::new(TokenClass::EndLine));
    Ok(body)
}

fn strip_trailing_end_line(mut tokens: Vec<Token>) -> Vec<Token> {
    if matches!(tokens.last().map(|t| &t.class), Some(TokenClass::EndLine)) {
        tokens.pop();
    }
    tokens
}

/// Pass 1: statement split on `◊` (`TOK_DIAMOND`).
fn split_statements(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for tok in tokens {
        if matches!(tok.class, TokenClass::Diamond) {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(tok);
        }
    }
    out.push(current);
    out
}

/// Pass 2: repeatedly simplify `((…))` to `(…)` and `(X)` to `X`, retagging
/// a singleton symbol as `ParenSymbol` (`P_SYMB`) so later passes can tell
/// `(F)/B` apart from `F/B`.
fn collapse_parens(mut stmt: Vec<Token>) -> Result<Vec<Token>, ApError> {
    loop {
        let pair = find_simplifiable_paren_pair(&stmt)?;
        let Some((open, close)) = pair else { break };
        if close == open + 1 {
            stmt.remove(close);
            stmt.remove(open);
        } else {
            // close == open + 2: exactly one inner token.
            let close_tok = stmt.remove(close);
            drop(close_tok);
            let mut inner = stmt.remove(open + 1);
            stmt.remove(open);
            if let TokenClass::Symbol(sym) = inner.class {
                inner.class = TokenClass::ParenSymbol(sym);
            }
            stmt.insert(open, inner);
        }
    }
    Ok(stmt)
}

fn find_simplifiable_paren_pair(stmt: &[Token]) -> Result<Option<(usize, usize)>, ApError> {
    let mut stack = Vec::new();
    for (idx, tok) in stmt.iter().enumerate() {
        match tok.class {
            TokenClass::LParen => stack.push(idx),
            TokenClass::RParen => {
                let open = stack
                    .pop()
                    .ok_or_else(|| ApError::new(ErrorKind::UnbalancedParen))?;
                let inner_len = idx - open - 1;
                if inner_len <= 1 {
                    return Ok(Some((open, idx)));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Pass 3: maximal runs of literal-scalar `Value` tokens become a single
/// vector `Value` token. A run is broken immediately before a following
/// `[` — the literal adjacent to the bracket stays a standalone scalar, so
/// e.g. `1 2 3[2]` indexes the scalar `3` (a rank error) rather than
/// indexing the 3-vector `1 2 3` (which would just select `3`).
fn group_constants(stmt: Vec<Token>) -> Result<Vec<Token>, ApError> {
    let mut out = Vec::with_capacity(stmt.len());
    let mut i = 0;
    while i < stmt.len() {
        if is_scalar_literal(&stmt[i]) {
            let mut j = i + 1;
            while j < stmt.len() && is_scalar_literal(&stmt[j]) {
                j += 1;
            }
            let followed_by_bracket = matches!(stmt.get(j).map(|t| &t.class), Some(TokenClass::LBracket));
            let mut run_end = j;
            if followed_by_bracket && run_end > i + 1 {
                run_end -= 1; // exclude the literal adjacent to `[`
            }
            if run_end - i >= 2 {
                let cells: Vec<Cell> = stmt[i..run_end]
                    .iter()
                    .map(|t| scalar_cell(t).expect("checked is_scalar_literal"))
                    .collect();
                let value = apl_core::Value::vector_of(cells);
                out.push(Token::new(TokenClass::Value(std::rc::Rc::new(
                    std::cell::RefCell::new(value),
                ))));
                out.extend(stmt[run_end..j].iter().cloned());
                i = j;
            } else {
                out.push(stmt[i].clone());
                i += 1;
            }
        } else {
            out.push(stmt[i].clone());
            i += 1;
        }
    }
    Ok(out)
}

fn is_scalar_literal(tok: &Token) -> bool {
    matches!(&tok.class, TokenClass::Value(v) if v.borrow().is_scalar())
}

fn scalar_cell(tok: &Token) -> Option<Cell> {
    match &tok.class {
        TokenClass::Value(v) => v.borrow().ravel().first().cloned(),
        _ => None,
    }
}

/// Pass 4: the symbol immediately left of `←` is retagged `LeftSymbol`
/// (plain assignment), or — if it is a parenthesized list of bare symbols —
/// each becomes a `LeftSymbol` and the whole group collapses to a single
/// `LeftSymbolList` (vector assignment).
fn mark_left_symbols(mut stmt: Vec<Token>, symtab: &mut SymbolTable) -> Result<Vec<Token>, ApError> {
    let _ = symtab; // symbols already exist; nothing further to look up here.
    let assign_positions: Vec<usize> = stmt
        .iter()
        .enumerate()
        .filter(|(_, t)| matches!(t.class, TokenClass::Assign))
        .map(|(i, _)| i)
        .collect();

    for &pos in &assign_positions {
        if pos == 0 {
            return Err(ApError::new(ErrorKind::LeftSyntax));
        }
        match &stmt[pos - 1].class {
            TokenClass::Symbol(sym) => {
                let sym = sym.clone();
                stmt[pos - 1].class = TokenClass::LeftSymbol(sym);
            }
            TokenClass::RParen => {
                if let Some(open) = matching_lparen_before(&stmt, pos - 1) {
                    let mut names = Vec::new();
                    let mut all_symbols = true;
                    for t in &stmt[open + 1..pos - 1] {
                        match &t.class {
                            TokenClass::Symbol(s) => names.push(s.clone()),
                            _ => {
                                all_symbols = false;
                                break;
                            }
                        }
                    }
                    if all_symbols && !names.is_empty() {
                        stmt.splice(
                            open..pos,
                            std::iter::once(Token::new(TokenClass::LeftSymbolList(names))),
                        );
                    }
                }
            }
            _ => return Err(ApError::new(ErrorKind::LeftSyntax)),
        }
    }
    Ok(stmt)
}

fn matching_lparen_before(stmt: &[Token], rparen_idx: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = rparen_idx as isize;
    while i >= 0 {
        match stmt[i as usize].class {
            TokenClass::RParen => depth += 1,
            TokenClass::LParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i as usize);
                }
            }
            _ => {}
        }
        i -= 1;
    }
    None
}

/// Pass 5: `/ ⌿ \ ⍀` are each either a dyadic primitive or a monadic
/// operator. The token immediately to the left decides: if it "ends a
/// value" (a `Value`, a closing `)`, or a closing `]`), this glyph reduces
/// or scans that value as a monadic operator; otherwise it is the dyadic
/// primitive of the same name.
fn disambiguate_slash(mut stmt: Vec<Token>) -> Result<Vec<Token>, ApError> {
    for i in 0..stmt.len() {
        let glyph = match &stmt[i].class {
            TokenClass::Function(ft) => match &ft.func {
                FunctionRef::Primitive(c) if matches!(c, '/' | '⌿' | '\\' | '⍀') => Some(*c),
                _ => None,
            },
            _ => None,
        };
        let Some(glyph) = glyph else { continue };
        let ends_value = i > 0 && token_ends_a_value(&stmt[i - 1].class);
        if ends_value {
            stmt[i].class = TokenClass::MonadicOp(glyph);
        }
    }
    Ok(stmt)
}

fn token_ends_a_value(class: &TokenClass) -> bool {
    matches!(
        class,
        TokenClass::Value(_) | TokenClass::RParen | TokenClass::RBracket
    )
}

/// Pass 6: stamp each `(`, `[`, `{` with the distance to its matching
/// closer and vice-versa; mismatched or unbalanced nesting is an
/// `UNBALANCED_*` error.
fn match_brackets(mut stmt: Vec<Token>) -> Result<Vec<Token>, ApError> {
    let mut stack: Vec<(usize, char)> = Vec::new();
    for idx in 0..stmt.len() {
        let (open_kind, close_kind, err): (Option<char>, Option<char>, ErrorKind) = match stmt[idx].class {
            TokenClass::LParen => (Some('('), None, ErrorKind::UnbalancedParen),
            TokenClass::LBracket => (Some('['), None, ErrorKind::UnbalancedBracket),
            TokenClass::LCurly => (Some('{'), None, ErrorKind::UnbalancedCurly),
            TokenClass::RParen => (None, Some('('), ErrorKind::UnbalancedParen),
            TokenClass::RBracket => (None, Some('['), ErrorKind::UnbalancedBracket),
            TokenClass::RCurly => (None, Some('{'), ErrorKind::UnbalancedCurly),
            _ => continue,
        };
        if let Some(kind) = open_kind {
            stack.push((idx, kind));
        } else if let Some(expect) = close_kind {
            match stack.pop() {
                Some((open_idx, kind)) if kind == expect => {
                    let dist = (idx - open_idx) as isize;
                    stmt[open_idx].meta.match_distance = Some(dist);
                    stmt[idx].meta.match_distance = Some(dist);
                }
                _ => return Err(ApError::new(err)),
            }
        }
    }
    if let Some((_, kind)) = stack.pop() {
        let err = match kind {
            '(' => ErrorKind::UnbalancedParen,
            '[' => ErrorKind::UnbalancedBracket,
            _ => ErrorKind::UnbalancedCurly,
        };
        return Err(ApError::new(err));
    }
    Ok(stmt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn collapses_double_parens() {
        let mut st = SymbolTable::new();
        let toks = tokenize("((X))", &mut st).unwrap();
        let body = parse_line(toks, &mut st).unwrap();
        // reversed single-statement body: ParenSymbol(X), EndLine
        assert!(matches!(body[0].class, TokenClass::ParenSymbol(_)));
    }

    #[test]
    fn groups_constant_run() {
        let mut st = SymbolTable::new();
        let toks = tokenize("1 2 3", &mut st).unwrap();
        let body = parse_line(toks, &mut st).unwrap();
        match &body[0].class {
            TokenClass::Value(v) => assert_eq!(v.borrow().ravel().len(), 3),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn constant_run_breaks_before_bracket() {
        let mut st = SymbolTable::new();
        let toks = tokenize("1 2 3[2]", &mut st).unwrap();
        let body = parse_line(toks, &mut st).unwrap();
        // reversed: ], 2, [, 3, (1 2)
        assert!(matches!(body[0].class, TokenClass::RBracket));
        match &body[1].class {
            TokenClass::Value(v) => assert!(v.borrow().is_scalar()),
            other => panic!("{other:?}"),
        }
        match &body[4].class {
            TokenClass::Value(v) => assert_eq!(v.borrow().ravel().len(), 2),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn marks_left_symbol_on_assignment() {
        let mut st = SymbolTable::new();
        let toks = tokenize("A←1", &mut st).unwrap();
        let body = parse_line(toks, &mut st).unwrap();
        // reversed: 1, ←, LeftSymbol(A)
        assert!(matches!(body[2].class, TokenClass::LeftSymbol(_)));
    }

    #[test]
    fn disambiguates_reduce_vs_dyadic_divide_by_slash_context() {
        let mut st = SymbolTable::new();
        let toks = tokenize("+/1 2 3", &mut st).unwrap();
        let body = parse_line(toks, &mut st).unwrap();
        // '/' follows '+', which does not end a value, so it stays the
        // function token consumed by '+' as its monadic-operator operand —
        // here we only assert it was NOT retagged MonadicOp given '+' is a
        // Function, not a value-ending token.
        let has_monadic_op = body.iter().any(|t| matches!(t.class, TokenClass::MonadicOp('/')));
        assert!(!has_monadic_op);
    }

    #[test]
    fn unbalanced_paren_is_error() {
        let mut st = SymbolTable::new();
        let toks = tokenize("(1 2", &mut st).unwrap();
        assert!(parse_line(toks, &mut st).is_err());
    }

    #[test]
    fn bracket_match_distances_are_symmetric() {
        let mut st = SymbolTable::new();
        let toks = tokenize("A[1]", &mut st).unwrap();
        let body = parse_line(toks, &mut st).unwrap();
        let open = body.iter().find(|t| matches!(t.class, TokenClass::LBracket)).unwrap();
        let close = body.iter().find(|t| matches!(t.class, TokenClass::RBracket)).unwrap();
        assert_eq!(open.meta.match_distance, close.meta.match_distance);
    }
}
