//! Source text → flat token vector.

use apl_core::{
    ApError, Cell, ErrorKind, FunctionRef, FunctionToken, SymbolTable, Token, TokenClass, Valence,
    Value,
};
use std::rc::Rc;
use tracing::instrument;

/// Glyphs recognized as primitive functions. Ambivalent: the reducer
/// decides monadic vs. dyadic from whether a left argument was bound,
/// not the tokenizer.
const PRIMITIVE_FUNCTIONS: &[char] = &[
    '+', '-', '×', '÷', '|', '⌈', '⌊', '*', '⍟', '○', '!', '~', '<', '≤', '=', '≥', '>', '≠', '∧',
    '∨', '⍴', '⍳', '⌽', '⊖', ',', '↑', '↓', '⊃', '⊂', '∊', '≡', '⍉', '⍎', '⊣', '⊢',
];

/// Glyphs that are monadic operators in `f/` position, dyadic functions
/// otherwise — plus `¨` which is always a monadic operator.
const AMBIGUOUS_OP_GLYPHS: &[char] = &['/', '⌿', '\\', '⍀'];
const ALWAYS_OPERATOR_GLYPHS: &[char] = &['¨'];

fn is_primitive(c: char) -> bool {
    PRIMITIVE_FUNCTIONS.contains(&c)
}

/// Tokenize one source line (or a user-function header/body line).
///
/// Symbols are created/looked up eagerly in `symtab` so later passes and
/// the reducer share one `Rc<Symbol>` per name; their *binding* is not
/// touched here.
#[instrument(skip(symtab))]
pub fn tokenize(line: &str, symtab: &mut SymbolTable) -> Result<Vec<Token>, ApError> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0usize;
    let mut out = Vec::new();

    while i < chars.len() {
        let c = chars[i];

        if c == '\u{000A}' || c == '\u{000D}' {
            i += 1;
            continue;
        }
        if c == '⍝' {
            break; // comment runs to end of line
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '\'' => {
                let (s, next) = scan_quoted(&chars, i, '\'')?;
                out.push(mk_char_vector(s));
                i = next;
            }
            '"' => {
                let (s, next) = scan_quoted(&chars, i, '"')?;
                out.push(mk_char_vector(s));
                i = next;
            }
            '⎕' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                let sym = symtab.lookup(&name)?;
                out.push(Token::new(TokenClass::Symbol(sym)));
            }
            '¯' | '0'..='9' => {
                let (tok, next) = scan_number(&chars, i)?;
                out.push(tok);
                i = next;
            }
            '(' => {
                out.push(Token::new(TokenClass::LParen));
                i += 1;
            }
            ')' => {
                out.push(Token::new(TokenClass::RParen));
                i += 1;
            }
            '[' => {
                out.push(Token::new(TokenClass::LBracket));
                i += 1;
            }
            ']' => {
                out.push(Token::new(TokenClass::RBracket));
                i += 1;
            }
            '{' => {
                out.push(Token::new(TokenClass::LCurly));
                i += 1;
            }
            '}' => {
                out.push(Token::new(TokenClass::RCurly));
                i += 1;
            }
            '←' => {
                out.push(Token::new(TokenClass::Assign));
                i += 1;
            }
            '◊' => {
                out.push(Token::new(TokenClass::Diamond));
                i += 1;
            }
            ':' => {
                out.push(Token::new(TokenClass::Colon));
                i += 1;
            }
            ';' => {
                out.push(Token::new(TokenClass::Semicolon));
                i += 1;
            }
            '→' => {
                out.push(Token::new(TokenClass::Branch));
                i += 1;
            }
            _ if ALWAYS_OPERATOR_GLYPHS.contains(&c) => {
                out.push(Token::new(TokenClass::MonadicOp(c)));
                i += 1;
            }
            _ if AMBIGUOUS_OP_GLYPHS.contains(&c) => {
                // Provisionally a dyadic primitive; `aplc::parser` pass 5
                // retags it to `MonadicOp`/`DyadicOp` once it can see what
                // precedes it.
                out.push(Token::new(TokenClass::Function(FunctionToken {
                    func: FunctionRef::Primitive(c),
                    valence: Valence::Ambivalent,
                })));
                i += 1;
            }
            _ if is_primitive(c) => {
                out.push(Token::new(TokenClass::Function(FunctionToken {
                    func: FunctionRef::Primitive(c),
                    valence: Valence::Ambivalent,
                })));
                i += 1;
            }
            _ if is_ident_start(c) => {
                let start = i;
                i += 1;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                let sym = symtab.lookup(&name)?;
                out.push(Token::new(TokenClass::Symbol(sym)));
            }
            '∇' => {
                // Defining-operator (the editor). Out of this core's scope
                //; pass through as a colon-like marker so a
                // host collaborator can react, without trying to interpret
                // it ourselves.
                out.push(Token::new(TokenClass::Colon));
                i += 1;
            }
            _ => return Err(ApError::new(ErrorKind::Syntax)),
        }
    }

    out.push(Token::new(TokenClass::EndLine));
    Ok(out)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '⍺' | '⍵' | '⍶' | '⍹' | 'χ' | 'λ' | '_')
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn mk_char_vector(s: String) -> Token {
    let cells: Vec<Cell> = s.chars().map(Cell::Char).collect();
    let value = if cells.len() == 1 {
        Value::scalar_of(cells.into_iter().next().unwrap())
    } else {
        Value::vector_of(cells)
    };
    Token::new(TokenClass::Value(std::rc::Rc::new(std::cell::RefCell::new(
        value,
    ))))
}

/// Scan a quoted string starting at `start` (pointing at the opening
/// quote); doubled quotes are a literal embedded quote.
fn scan_quoted(chars: &[char], start: usize, quote: char) -> Result<(String, usize), ApError> {
    let mut i = start + 1;
    let mut s = String::new();
    loop {
        if i >= chars.len() {
            return Err(ApError::new(ErrorKind::Syntax));
        }
        if chars[i] == quote {
            if i + 1 < chars.len() && chars[i + 1] == quote {
                s.push(quote);
                i += 2;
                continue;
            }
            return Ok((s, i + 1));
        }
        s.push(chars[i]);
        i += 1;
    }
}

/// Scan one numeric literal: integer, float, or complex (`realJimag`),
/// with `¯` as the literal high-minus.
fn scan_number(chars: &[char], start: usize) -> Result<(Token, usize), ApError> {
    let (re, mut i) = scan_real(chars, start)?;
    let mut im = 0.0;
    if i < chars.len() && (chars[i] == 'J' || chars[i] == 'j') {
        i += 1;
        let (v, next) = scan_real(chars, i)?;
        im = v;
        i = next;
    }
    let cell = if im != 0.0 {
        Cell::Complex(re, im)
    } else if re.fract() == 0.0 && re.abs() < i64::MAX as f64 {
        Cell::Int(re as i64)
    } else {
        Cell::Float(re)
    };
    Ok((
        Token::new(TokenClass::Value(Rc::new(std::cell::RefCell::new(
            Value::scalar_of(cell),
        )))),
        i,
    ))
}

fn scan_real(chars: &[char], start: usize) -> Result<(f64, usize), ApError> {
    let mut i = start;
    let mut sign = 1.0;
    if i < chars.len() && chars[i] == '¯' {
        sign = -1.0;
        i += 1;
    }
    let int_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i == int_start {
        return Err(ApError::new(ErrorKind::Syntax));
    }
    let mut s: String = chars[int_start..i].iter().collect();
    if i < chars.len() && chars[i] == '.' {
        s.push('.');
        i += 1;
        let frac_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return Err(ApError::new(ErrorKind::Syntax));
        }
        s.push_str(&chars[frac_start..i].iter().collect::<String>());
    }
    if i < chars.len() && chars[i] == 'E' {
        s.push('E');
        i += 1;
        if i < chars.len() && chars[i] == '¯' {
            s.push('-');
            i += 1;
        }
        let exp_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return Err(ApError::new(ErrorKind::Syntax));
        }
        s.push_str(&chars[exp_start..i].iter().collect::<String>());
    }
    let v: f64 = s.parse().map_err(|_| ApError::new(ErrorKind::Syntax))?;
    Ok((sign * v, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_simple_vector() {
        let mut st = SymbolTable::new();
        let toks = tokenize("1 2 3", &mut st).unwrap();
        // three scalar values then EndLine
        assert_eq!(toks.len(), 4);
        assert!(toks[0].is_value());
    }

    #[test]
    fn high_minus_is_literal_negation() {
        let mut st = SymbolTable::new();
        let toks = tokenize("¯3", &mut st).unwrap();
        match &toks[0].class {
            TokenClass::Value(v) => match &v.borrow().ravel()[0] {
                Cell::Int(-3) => {}
                other => panic!("{other:?}"),
            },
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn comment_truncates_line() {
        let mut st = SymbolTable::new();
        let toks = tokenize("1 2 ⍝ trailing comment", &mut st).unwrap();
        assert_eq!(toks.len(), 3); // two values + EndLine
    }

    #[test]
    fn quoted_string_with_escaped_quote() {
        let mut st = SymbolTable::new();
        let toks = tokenize("'it''s'", &mut st).unwrap();
        match &toks[0].class {
            TokenClass::Value(v) => {
                let s: String = v
                    .borrow()
                    .ravel()
                    .iter()
                    .map(|c| match c {
                        Cell::Char(ch) => *ch,
                        _ => panic!(),
                    })
                    .collect();
                assert_eq!(s, "it's");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn identifier_reuses_symbol() {
        let mut st = SymbolTable::new();
        let toks = tokenize("ABC ABC", &mut st).unwrap();
        let (a, b) = match (&toks[0].class, &toks[1].class) {
            (TokenClass::Symbol(a), TokenClass::Symbol(b)) => (a.clone(), b.clone()),
            _ => panic!(),
        };
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn complex_number_literal() {
        let mut st = SymbolTable::new();
        let toks = tokenize("3J4", &mut st).unwrap();
        match &toks[0].class {
            TokenClass::Value(v) => match &v.borrow().ravel()[0] {
                Cell::Complex(re, im) => {
                    assert_eq!(*re, 3.0);
                    assert_eq!(*im, 4.0);
                }
                other => panic!("{other:?}"),
            },
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn unknown_glyph_is_syntax_error() {
        let mut st = SymbolTable::new();
        assert!(tokenize("`", &mut st).is_err());
    }
}
