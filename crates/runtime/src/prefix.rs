//! The prefix reducer: evaluates one `Executable`'s reversed-per-statement
//! body, right to left, per statement.
//!
//! The body layout (`aplc::executable`) stores each statement with its
//! tokens already reversed and its bracket/paren pairs cross-indexed via
//! `TokenMeta::match_distance`, so a single forward scan over the stored
//! array reproduces APL's right-to-left evaluation order without a second
//! reversal at runtime: the rightmost subexpression is simply whatever is
//! shifted first. Dyadic-vs-monadic and operator-vs-primitive decisions are
//! made by looking one token further along (the `V F V` / `F V` / `V OP F`
//! phrases) rather than by a separate priority table — the grammar here is
//! unambiguous enough that no backtracking is needed.
//!
//! A called user function recurses through ordinary Rust function calls
//! (`invoke_user`) rather than through a hand-maintained resumption record;
//! `Workspace`'s SI stack exists for `)SI` bookkeeping and depth limiting,
//! not to drive execution.

use crate::attention::AttentionSource;
use crate::si::StateIndicator;
use crate::workspace::Workspace;
use crate::{arithmetic, compare, elementwise, indexing, operators, structural};
use aplc::Executable;
use apl_core::{
    ApError, Cell, DerivedFunction, ErrorKind, FunctionRef, FunctionToken, IndexExpr, NameClass,
    Shape, TokenClass, UserFunctionHandle, Valence, Value, ValueRef,
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, trace, warn};

fn is_operator_glyph(c: char) -> bool {
    matches!(c, '/' | '⌿' | '\\' | '⍀' | '¨')
}

fn demote_value(v: Value, ct: f64) -> Value {
    let shape = v.shape().clone();
    let ravel: Vec<Cell> = v.ravel().iter().cloned().map(|c| demote_cell_logged(c, ct)).collect();
    Value::new(shape, ravel).expect("demotion never changes cell count")
}

/// [`Cell::demote`], plus a `warn!` when the demotion actually drops
/// precision (a non-zero imaginary part, or a non-integer fractional part)
/// rather than just tidying an already-exact value.
fn demote_cell_logged(c: Cell, ct: f64) -> Cell {
    let demoted = c.clone().demote(ct);
    match (&c, &demoted) {
        (Cell::Complex(_, im), Cell::Float(_)) if *im != 0.0 => {
            warn!(imaginary = im, "demoted complex to float, dropping a non-zero imaginary part within tolerance");
        }
        (Cell::Float(f), Cell::Int(_)) if f.fract() != 0.0 => {
            warn!(value = f, "demoted float to int, rounding a non-integer value within tolerance");
        }
        _ => {}
    }
    demoted
}

/// The one cell a stranded operand contributes: itself if scalar, an
/// enclosing pointer cell otherwise.
fn strand_item(v: &Value) -> Cell {
    if v.is_scalar() {
        v.ravel()[0].clone()
    } else {
        structural::enclose(v.clone()).ravel()[0].clone()
    }
}

fn finish_strand(ravel: Vec<Cell>) -> Value {
    Value::new(Shape::vector(ravel.len()), ravel).expect("strand never miscounts its own ravel")
}

/// The reducer's cursor into one `Executable`'s body.
pub struct Prefix {
    pub pc: usize,
}

enum StepResult {
    Continue,
    Finished(Option<ValueRef>),
}

impl Prefix {
    pub fn new(pc: usize) -> Self {
        Prefix { pc }
    }

    /// Run from the current `pc` until the body's `Return`/`EndLine`
    /// sentinel, honoring `→` branches within it.
    pub fn run(&mut self, exe: &Executable, ws: &mut Workspace) -> Result<Option<ValueRef>, ApError> {
        loop {
            if ws.attention.interrupted() {
                return Err(ApError::new(ErrorKind::Interrupt));
            }
            let start = self.pc;
            match self.eval_statement(exe, ws).map_err(|e| e.with_range_into((start, self.pc)))? {
                StepResult::Continue => continue,
                StepResult::Finished(v) => return Ok(v),
            }
        }
    }

    fn eval_statement(&mut self, exe: &Executable, ws: &mut Workspace) -> Result<StepResult, ApError> {
        match exe.body.get(self.pc).map(|t| &t.class) {
            None => return Ok(StepResult::Finished(None)),
            Some(TokenClass::Return { symbol }) => {
                let v = match symbol {
                    Some(s) => match s.current() {
                        NameClass::Variable(v) => Some(v),
                        _ => None,
                    },
                    None => None,
                };
                return Ok(StepResult::Finished(v));
            }
            Some(TokenClass::EndLine) => return Ok(StepResult::Finished(None)),
            Some(TokenClass::EndStatement) => {
                self.pc += 1;
                return Ok(StepResult::Continue);
            }
            Some(TokenClass::Branch) => {
                // Bare `→`: escape straight to the return sentinel (or, with
                // no sentinel to escape to at the top level, just stop).
                self.pc += 1;
                if exe.parse_mode == aplc::ParseMode::UserFunction {
                    self.pc = exe.line_starts[0];
                    return Ok(StepResult::Continue);
                }
                return Ok(StepResult::Finished(None));
            }
            _ => {}
        }

        let value = self.eval_value(exe, ws)?;

        loop {
            match exe.body.get(self.pc).map(|t| &t.class) {
                Some(TokenClass::Assign) => {
                    self.pc += 1;
                    let snapshot = value.borrow().clone();
                    self.do_assignment(exe, ws, &snapshot)?;
                }
                _ => break,
            }
        }

        match exe.body.get(self.pc).map(|t| &t.class) {
            Some(TokenClass::Branch) => {
                self.pc += 1;
                self.do_branch(exe, &value)?;
                Ok(StepResult::Continue)
            }
            Some(TokenClass::EndStatement) => {
                self.pc += 1;
                Ok(StepResult::Continue)
            }
            Some(TokenClass::EndLine) => Ok(StepResult::Finished(Some(value))),
            Some(TokenClass::Return { symbol }) => {
                let v = match symbol {
                    Some(s) => match s.current() {
                        NameClass::Variable(v) => Some(v),
                        _ => None,
                    },
                    None => None,
                };
                Ok(StepResult::Finished(v))
            }
            None => Ok(StepResult::Finished(Some(value))),
            _ => Err(ApError::new(ErrorKind::Syntax)),
        }
    }

    fn do_branch(&mut self, exe: &Executable, value: &ValueRef) -> Result<(), ApError> {
        let cell = {
            let v = value.borrow();
            if v.ravel().is_empty() {
                return Ok(());
            }
            v.ravel()[0].clone()
        };
        let n = match cell {
            Cell::Int(i) => i,
            Cell::Float(f) if (f - f.round()).abs() < 1e-9 => f.round() as i64,
            _ => return Err(ApError::new(ErrorKind::Domain)),
        };
        if n == 0 {
            self.pc = exe.line_starts[0];
        } else if n > 0 && (n as usize) < exe.line_starts.len() {
            self.pc = exe.line_starts[n as usize];
        } else {
            return Err(ApError::new(ErrorKind::Index));
        }
        Ok(())
    }

    fn do_assignment(&mut self, exe: &Executable, ws: &mut Workspace, value: &Value) -> Result<(), ApError> {
        match exe.body.get(self.pc).map(|t| t.class.clone()) {
            Some(TokenClass::LeftSymbol(sym)) => {
                self.pc += 1;
                sym.set_current(NameClass::Variable(Rc::new(RefCell::new(value.clone()))));
                Ok(())
            }
            Some(TokenClass::LeftSymbolList(syms)) => {
                self.pc += 1;
                if value.ravel().len() != syms.len() {
                    return Err(ApError::new(ErrorKind::Length));
                }
                for (sym, cell) in syms.iter().zip(value.ravel().iter()) {
                    sym.set_current(NameClass::Variable(Rc::new(RefCell::new(Value::scalar_of(cell.clone())))));
                }
                Ok(())
            }
            Some(TokenClass::RParen) => self.do_selective_assignment(exe, ws, value),
            _ => Err(ApError::new(ErrorKind::LeftSyntax)),
        }
    }

    /// `(A[I])←value` / `(A)←value`: evaluate the parenthesized LHS as a
    /// selector of `LeftValue` cells via `Value::get_cellrefs` rather than
    /// as an ordinary value expression, then scatter `value`'s cells
    /// through it. Only a bare variable, optionally indexed, is supported
    /// as the selector — a fully general re-evaluated expression (GNU
    /// APL's `(⍴A)←…` style) is not.
    fn do_selective_assignment(&mut self, exe: &Executable, ws: &mut Workspace, value: &Value) -> Result<(), ApError> {
        let tok = &exe.body[self.pc];
        let dist = tok.meta.match_distance.ok_or_else(|| ApError::new(ErrorKind::ThisIsABug))?;
        let lp = (self.pc as isize - dist) as usize;
        self.pc += 1;
        let selector = self.eval_selector(exe, ws)?;
        if self.pc != lp {
            return Err(ApError::new(ErrorKind::LeftSyntax));
        }
        self.pc = lp + 1;
        indexing::assign_through_left_values(&selector, value)
    }

    fn eval_selector(&mut self, exe: &Executable, ws: &mut Workspace) -> Result<Value, ApError> {
        match exe.body.get(self.pc).map(|t| t.class.clone()) {
            Some(TokenClass::RBracket) => {
                let tok = &exe.body[self.pc];
                let dist = tok.meta.match_distance.ok_or_else(|| ApError::new(ErrorKind::ThisIsABug))?;
                let lp = (self.pc as isize - dist) as usize;
                self.pc += 1;
                let axes = self.consume_bracket_axes(exe, ws, lp)?;
                self.pc = lp + 1;
                let base = match exe.body.get(self.pc).map(|t| t.class.clone()) {
                    Some(TokenClass::Symbol(s)) | Some(TokenClass::ParenSymbol(s)) => s,
                    _ => return Err(ApError::new(ErrorKind::LeftSyntax)),
                };
                self.pc += 1;
                let target = match base.current() {
                    NameClass::Variable(v) => v,
                    _ => return Err(ApError::new(ErrorKind::Value)),
                };
                let all_refs = Value::get_cellrefs(&target);
                let idx = IndexExpr::new(axes);
                indexing::read(&all_refs, &idx, ws.quad.io, ws.quad.ct)
            }
            Some(TokenClass::Symbol(s)) | Some(TokenClass::ParenSymbol(s)) => {
                self.pc += 1;
                let target = match s.current() {
                    NameClass::Variable(v) => v,
                    _ => return Err(ApError::new(ErrorKind::Value)),
                };
                Ok(Value::get_cellrefs(&target))
            }
            _ => Err(ApError::new(ErrorKind::LeftSyntax)),
        }
    }

    /// The `V` production: one operand, then as many trailing function
    /// applications or stranded operands as the lookahead supports, right
    /// to left.
    fn eval_value(&mut self, exe: &Executable, ws: &mut Workspace) -> Result<ValueRef, ApError> {
        let mut result = self.eval_operand(exe, ws)?;
        // Strand notation: "1 2" already folds into one Value token at
        // compile time, but "(1 2)(3 4 5)" reaches here as two adjacent
        // operands with nothing between them. Each stranded operand
        // contributes one item (enclosed, if not itself a scalar) to a
        // vector accumulated alongside `result`, outermost item last since
        // we're scanning right to left; it's folded into `result` proper
        // as soon as anything else needs `result`'s old, pre-strand value.
        let mut strand_acc: Option<Vec<Cell>> = None;
        loop {
            let class = match exe.body.get(self.pc).map(|t| t.class.clone()) {
                Some(c) => c,
                None => break,
            };
            match self.try_take_function(exe, ws, &class)? {
                Some(func_tok) => {
                    if let Some(ravel) = strand_acc.take() {
                        result = Rc::new(RefCell::new(finish_strand(ravel)));
                    }
                    if self.starts_value(exe) {
                        let left = self.eval_value(exe, ws)?;
                        trace!(pc = self.pc, "reducing V F V");
                        let out = call_dyadic(&func_tok, &left.borrow(), &result.borrow(), ws)?;
                        result = Rc::new(RefCell::new(out));
                    } else {
                        trace!(pc = self.pc, "reducing F V");
                        let out = call_monadic(&func_tok, &result.borrow(), ws)?;
                        result = Rc::new(RefCell::new(out));
                    }
                }
                None if self.starts_value(exe) => {
                    if strand_acc.is_none() {
                        strand_acc = Some(vec![strand_item(&result.borrow())]);
                    }
                    let left = self.eval_operand(exe, ws)?;
                    strand_acc.as_mut().unwrap().insert(0, strand_item(&left.borrow()));
                }
                None => break,
            }
        }
        if let Some(ravel) = strand_acc {
            result = Rc::new(RefCell::new(finish_strand(ravel)));
        }
        Ok(result)
    }

    fn starts_value(&self, exe: &Executable) -> bool {
        match exe.body.get(self.pc).map(|t| &t.class) {
            Some(TokenClass::Value(_)) | Some(TokenClass::RParen) => true,
            Some(TokenClass::Symbol(sym)) | Some(TokenClass::ParenSymbol(sym)) => {
                matches!(sym.current(), NameClass::Variable(_) | NameClass::Label(_))
            }
            _ => false,
        }
    }

    /// Tries to consume a function (possibly an operator bound to its
    /// operand function) starting at the given, already-peeked, class.
    /// Leaves `pc` untouched and returns `Ok(None)` if `class` doesn't
    /// start a function.
    fn try_take_function(
        &mut self,
        exe: &Executable,
        ws: &mut Workspace,
        class: &TokenClass,
    ) -> Result<Option<FunctionToken>, ApError> {
        match class {
            TokenClass::Function(ft) => {
                if let FunctionRef::Primitive(g) = ft.func {
                    if is_operator_glyph(g) {
                        if self.next_is_function(exe, self.pc + 1) {
                            self.pc += 1;
                            let operand = self.take_function_operand(exe, ws)?;
                            return Ok(Some(bind_operator(g, operand)));
                        }
                        return Err(ApError::new(ErrorKind::NotYetImplemented));
                    }
                }
                self.pc += 1;
                Ok(Some(ft.clone()))
            }
            TokenClass::MonadicOp(g) => {
                let g = *g;
                if self.next_is_function(exe, self.pc + 1) {
                    self.pc += 1;
                    let operand = self.take_function_operand(exe, ws)?;
                    return Ok(Some(bind_operator(g, operand)));
                }
                Err(ApError::new(ErrorKind::NotYetImplemented))
            }
            TokenClass::DyadicOp(_) => Err(ApError::new(ErrorKind::NotYetImplemented)),
            TokenClass::Symbol(sym) | TokenClass::ParenSymbol(sym) => match sym.current() {
                NameClass::Function(h) | NameClass::Operator(h) => {
                    self.pc += 1;
                    let valence = h.valence();
                    Ok(Some(FunctionToken {
                        func: FunctionRef::User(h),
                        valence,
                    }))
                }
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn take_function_operand(&mut self, exe: &Executable, ws: &mut Workspace) -> Result<FunctionToken, ApError> {
        let class = exe
            .body
            .get(self.pc)
            .map(|t| t.class.clone())
            .ok_or_else(|| ApError::new(ErrorKind::Syntax))?;
        self.try_take_function(exe, ws, &class)?
            .ok_or_else(|| ApError::new(ErrorKind::Syntax))
    }

    fn next_is_function(&self, exe: &Executable, pos: usize) -> bool {
        match exe.body.get(pos).map(|t| &t.class) {
            Some(TokenClass::Function(_)) | Some(TokenClass::MonadicOp(_)) | Some(TokenClass::DyadicOp(_)) => true,
            Some(TokenClass::Symbol(sym)) | Some(TokenClass::ParenSymbol(sym)) => {
                matches!(sym.current(), NameClass::Function(_) | NameClass::Operator(_))
            }
            _ => false,
        }
    }

    /// The `V[I;J;…]` suffix on an already-parsed operand.
    fn eval_operand(&mut self, exe: &Executable, ws: &mut Workspace) -> Result<ValueRef, ApError> {
        let mut v = self.eval_primary(exe, ws)?;
        while matches!(exe.body.get(self.pc).map(|t| &t.class), Some(TokenClass::RBracket)) {
            let tok = &exe.body[self.pc];
            let dist = tok.meta.match_distance.ok_or_else(|| ApError::new(ErrorKind::ThisIsABug))?;
            let lp = (self.pc as isize - dist) as usize;
            self.pc += 1;
            let axes = self.consume_bracket_axes(exe, ws, lp)?;
            self.pc = lp + 1;
            let idx = IndexExpr::new(axes);
            let read = indexing::read(&v.borrow(), &idx, ws.quad.io, ws.quad.ct)?;
            v = Rc::new(RefCell::new(read));
        }
        Ok(v)
    }

    fn consume_bracket_axes(
        &mut self,
        exe: &Executable,
        ws: &mut Workspace,
        lp: usize,
    ) -> Result<Vec<Option<Value>>, ApError> {
        let mut segments: Vec<Option<Value>> = Vec::new();
        loop {
            let at_boundary = self.pc == lp
                || matches!(exe.body.get(self.pc).map(|t| &t.class), Some(TokenClass::Semicolon));
            if at_boundary {
                segments.push(None);
            } else {
                let v = self.eval_value(exe, ws)?;
                segments.push(Some(v.borrow().clone()));
            }
            if self.pc == lp {
                break;
            }
            match exe.body.get(self.pc).map(|t| &t.class) {
                Some(TokenClass::Semicolon) => self.pc += 1,
                _ => return Err(ApError::new(ErrorKind::Syntax)),
            }
        }
        segments.reverse();
        Ok(segments)
    }

    fn eval_primary(&mut self, exe: &Executable, ws: &mut Workspace) -> Result<ValueRef, ApError> {
        let tok = exe.body.get(self.pc).ok_or_else(|| ApError::new(ErrorKind::Syntax))?;
        match tok.class.clone() {
            TokenClass::Value(v) => {
                self.pc += 1;
                Ok(v)
            }
            TokenClass::Symbol(sym) | TokenClass::ParenSymbol(sym) => {
                self.pc += 1;
                match sym.current() {
                    NameClass::Variable(v) => Ok(v),
                    NameClass::Label(line) => Ok(Rc::new(RefCell::new(Value::scalar_of(Cell::Int(line as i64))))),
                    _ => Err(ApError::new(ErrorKind::Value)),
                }
            }
            TokenClass::RParen => {
                let dist = tok.meta.match_distance.ok_or_else(|| ApError::new(ErrorKind::ThisIsABug))?;
                let lp = (self.pc as isize - dist) as usize;
                self.pc += 1;
                self.eval_paren_group(exe, ws, lp)
            }
            _ => Err(ApError::new(ErrorKind::Syntax)),
        }
    }

    fn eval_paren_group(&mut self, exe: &Executable, ws: &mut Workspace, lp: usize) -> Result<ValueRef, ApError> {
        let mut value = self.eval_value(exe, ws)?;
        while self.pc < lp && matches!(exe.body.get(self.pc).map(|t| &t.class), Some(TokenClass::Assign)) {
            self.pc += 1;
            let snapshot = value.borrow().clone();
            self.do_assignment(exe, ws, &snapshot)?;
        }
        if self.pc != lp {
            return Err(ApError::new(ErrorKind::Syntax));
        }
        self.pc = lp + 1;
        Ok(value)
    }
}

fn bind_operator(op_glyph: char, operand: FunctionToken) -> FunctionToken {
    let derived = DerivedFunction {
        op_glyph,
        left: operand,
        right: None,
        bound_value: None,
    };
    FunctionToken {
        func: FunctionRef::Derived(Rc::new(derived)),
        valence: Valence::Ambivalent,
    }
}

fn call_monadic(func: &FunctionToken, v: &Value, ws: &mut Workspace) -> Result<Value, ApError> {
    match &func.func {
        FunctionRef::Primitive(c) => call_primitive_monadic(*c, v, ws),
        FunctionRef::User(h) => call_user(h, None, v, ws),
        FunctionRef::Derived(d) => call_derived(d, None, v, ws),
    }
}

fn call_dyadic(func: &FunctionToken, a: &Value, b: &Value, ws: &mut Workspace) -> Result<Value, ApError> {
    match &func.func {
        FunctionRef::Primitive(c) => call_primitive_dyadic(*c, a, b, ws),
        FunctionRef::User(h) => call_user(h, Some(a), b, ws),
        FunctionRef::Derived(d) => call_derived(d, Some(a), b, ws),
    }
}

fn call_derived(d: &DerivedFunction, a: Option<&Value>, b: &Value, ws: &mut Workspace) -> Result<Value, ApError> {
    let left = &d.left;
    let mut apply = move |bv: &Value, av: Option<&Value>| -> Result<Value, ApError> {
        match av {
            Some(l) => call_dyadic(left, l, bv, ws),
            None => call_monadic(left, bv, ws),
        }
    };
    match d.op_glyph {
        '/' => operators::reduce(&mut apply, b, true),
        '⌿' => operators::reduce(&mut apply, b, false),
        '\\' => operators::scan(&mut apply, b, true),
        '⍀' => operators::scan(&mut apply, b, false),
        '¨' => match a {
            Some(left) => operators::each_dyadic(&mut apply, left, b),
            None => operators::each_monadic(&mut apply, b),
        },
        _ => Err(ApError::new(ErrorKind::NotYetImplemented)),
    }
}

/// Invoke a fixed user function or lambda, pushing an SI frame for the
/// duration. Returns `None` for a fall-through with no `Z` assigned (a
/// "void" result, valid as a whole statement but not as a value).
#[instrument(skip(a, b, ws), fields(name = %handle.name()))]
fn invoke_user(
    handle: &Rc<dyn UserFunctionHandle>,
    a: Option<&Value>,
    b: &Value,
    ws: &mut Workspace,
) -> Result<Option<Value>, ApError> {
    let uf = handle
        .as_any()
        .downcast_ref::<aplc::UserFunction>()
        .ok_or_else(|| ApError::new(ErrorKind::ThisIsABug))?;

    ws.push_si(StateIndicator::new(uf.name().to_string()))?;
    debug!(depth = ws.si_depth(), "entered user function");
    let result = run_user_body(uf, a, b, ws);
    ws.pop_si();
    debug!(depth = ws.si_depth(), "left user function");
    result
}

fn run_user_body(
    uf: &aplc::UserFunction,
    a: Option<&Value>,
    b: &Value,
    ws: &mut Workspace,
) -> Result<Option<Value>, ApError> {
    let shadow_names = uf.shadowed_names();
    let shadow_syms = ws.symtab.push_all(&shadow_names)?;

    let bound = (|| -> Result<(), ApError> {
        for (name, line) in &uf.labels {
            ws.symtab.lookup(name)?.set_current(NameClass::Label(*line));
        }
        if let Some(bn) = &uf.b_name {
            ws.symtab
                .lookup(bn)?
                .set_current(NameClass::Variable(Rc::new(RefCell::new(b.clone()))));
        }
        if let (Some(an), Some(av)) = (&uf.a_name, a) {
            ws.symtab
                .lookup(an)?
                .set_current(NameClass::Variable(Rc::new(RefCell::new(av.clone()))));
        }
        Ok(())
    })();

    let result = bound.and_then(|_| {
        let mut prefix = Prefix::new(0);
        prefix.run(&uf.executable, ws)
    });

    ws.symtab.pop_all(&shadow_syms)?;
    result.map(|opt| opt.map(|vr| vr.borrow().clone()))
}

fn call_user(handle: &Rc<dyn UserFunctionHandle>, a: Option<&Value>, b: &Value, ws: &mut Workspace) -> Result<Value, ApError> {
    match invoke_user(handle, a, b, ws)? {
        Some(v) => Ok(v),
        None => Err(ApError::new(ErrorKind::Value)),
    }
}

fn call_primitive_monadic(c: char, v: &Value, ws: &mut Workspace) -> Result<Value, ApError> {
    let ct = ws.quad.ct;
    match c {
        '+' => elementwise::map_monadic(v, arithmetic::conjugate).map(|r| demote_value(r, ct)),
        '-' => elementwise::map_monadic(v, arithmetic::negate).map(|r| demote_value(r, ct)),
        '×' => elementwise::map_monadic(v, arithmetic::signum).map(|r| demote_value(r, ct)),
        '÷' => elementwise::map_monadic(v, arithmetic::reciprocal).map(|r| demote_value(r, ct)),
        '|' => elementwise::map_monadic(v, arithmetic::magnitude).map(|r| demote_value(r, ct)),
        '⌈' => elementwise::map_monadic(v, arithmetic::ceiling).map(|r| demote_value(r, ct)),
        '⌊' => elementwise::map_monadic(v, arithmetic::floor).map(|r| demote_value(r, ct)),
        '*' => elementwise::map_monadic(v, arithmetic::exponential).map(|r| demote_value(r, ct)),
        '⍟' => elementwise::map_monadic(v, arithmetic::natural_log).map(|r| demote_value(r, ct)),
        '○' => elementwise::map_monadic(v, arithmetic::pi_times).map(|r| demote_value(r, ct)),
        '!' => elementwise::map_monadic(v, arithmetic::factorial).map(|r| demote_value(r, ct)),
        '~' => elementwise::map_monadic(v, arithmetic::logical_not),
        '⍴' => Ok(structural::shape_of(v)),
        '⍳' => structural::iota(v, ws.quad.io, ct),
        '⌽' => structural::reverse_last(v),
        '⊖' => structural::reverse_first(v),
        ',' => Ok(structural::ravel(v)),
        '⊃' => Ok(structural::disclose(v)),
        '⊂' => Ok(structural::enclose(v.clone())),
        '⍉' => structural::transpose(v),
        '≡' => Ok(compare::depth(v)),
        '∊' => Ok(compare::enlist(v)),
        _ => Err(ApError::new(ErrorKind::NotYetImplemented)),
    }
}

fn call_primitive_dyadic(c: char, a: &Value, b: &Value, ws: &mut Workspace) -> Result<Value, ApError> {
    let ct = ws.quad.ct;
    match c {
        '+' => elementwise::map_dyadic(a, b, arithmetic::add).map(|r| demote_value(r, ct)),
        '-' => elementwise::map_dyadic(a, b, arithmetic::subtract).map(|r| demote_value(r, ct)),
        '×' => elementwise::map_dyadic(a, b, arithmetic::multiply).map(|r| demote_value(r, ct)),
        '÷' => elementwise::map_dyadic(a, b, arithmetic::divide).map(|r| demote_value(r, ct)),
        '|' => elementwise::map_dyadic(a, b, arithmetic::residue).map(|r| demote_value(r, ct)),
        '⌈' => elementwise::map_dyadic(a, b, arithmetic::max).map(|r| demote_value(r, ct)),
        '⌊' => elementwise::map_dyadic(a, b, arithmetic::min).map(|r| demote_value(r, ct)),
        '*' => elementwise::map_dyadic(a, b, arithmetic::power).map(|r| demote_value(r, ct)),
        '⍟' => elementwise::map_dyadic(a, b, arithmetic::logarithm).map(|r| demote_value(r, ct)),
        '!' => elementwise::map_dyadic(a, b, arithmetic::binomial).map(|r| demote_value(r, ct)),
        '∧' => elementwise::map_dyadic(a, b, arithmetic::logical_and),
        '∨' => elementwise::map_dyadic(a, b, arithmetic::logical_or),
        '<' => elementwise::map_dyadic(a, b, |x, y| Ok(compare::less_than(x, y, ct))),
        '≤' => elementwise::map_dyadic(a, b, |x, y| Ok(compare::less_equal(x, y, ct))),
        '=' => elementwise::map_dyadic(a, b, |x, y| Ok(compare::equal(x, y, ct))),
        '≥' => elementwise::map_dyadic(a, b, |x, y| Ok(compare::greater_equal(x, y, ct))),
        '>' => elementwise::map_dyadic(a, b, |x, y| Ok(compare::greater_than(x, y, ct))),
        '≠' => elementwise::map_dyadic(a, b, |x, y| Ok(compare::not_equal(x, y, ct))),
        '≡' => Ok(compare::match_value(a, b, ct)),
        '∊' => Ok(compare::membership(a, b, ct)),
        '⍴' => structural::reshape(a, b, ct),
        '⍳' => Ok(structural::index_of(a, b, ws.quad.io, ct)),
        ',' => structural::catenate(a, b),
        '⌽' => structural::rotate_last(a, b, ct),
        '⊖' => structural::rotate_first(a, b, ct),
        '↑' => structural::take(a, b, ct),
        '↓' => structural::drop(a, b, ct),
        '⊃' => structural::pick(a, b, ws.quad.io, ct),
        _ => Err(ApError::new(ErrorKind::NotYetImplemented)),
    }
}

/// Compile and run one immediate line against a workspace, returning the
/// statement's final value (if any).
#[instrument(skip(exe, ws))]
pub fn execute(exe: &Executable, ws: &mut Workspace) -> Result<Option<Value>, ApError> {
    let mut prefix = Prefix::new(0);
    let result = prefix.run(exe, ws)?;
    Ok(result.map(|vr| vr.borrow().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aplc::ParseMode;

    fn run_line(ws: &mut Workspace, line: &str) -> Option<Value> {
        let exe = Executable::compile_immediate(line, &mut ws.symtab, ParseMode::ExecuteExpression).unwrap();
        execute(&exe, ws).unwrap()
    }

    fn as_int(v: &Value) -> i64 {
        match v.ravel()[0] {
            Cell::Int(i) => i,
            ref other => panic!("{other:?}"),
        }
    }

    #[test]
    fn evaluates_dyadic_chain_right_to_left() {
        let mut ws = Workspace::new();
        let v = run_line(&mut ws, "2+3×4").unwrap();
        assert_eq!(as_int(&v), 14);
    }

    #[test]
    fn assignment_then_reference() {
        let mut ws = Workspace::new();
        run_line(&mut ws, "A←1+2");
        let v = run_line(&mut ws, "A×10").unwrap();
        assert_eq!(as_int(&v), 30);
    }

    #[test]
    fn parenthesized_subexpression_binds_first() {
        let mut ws = Workspace::new();
        let v = run_line(&mut ws, "(1+2)×4").unwrap();
        assert_eq!(as_int(&v), 12);
    }

    #[test]
    fn reduce_operator_sums_vector() {
        let mut ws = Workspace::new();
        let v = run_line(&mut ws, "+/1 2 3 4").unwrap();
        assert_eq!(as_int(&v), 10);
    }

    #[test]
    fn index_read_selects_element() {
        let mut ws = Workspace::new();
        run_line(&mut ws, "A←10 20 30");
        let v = run_line(&mut ws, "A[2]").unwrap();
        assert_eq!(as_int(&v), 20);
    }

    #[test]
    fn indexed_assignment_mutates_in_place() {
        let mut ws = Workspace::new();
        run_line(&mut ws, "A←10 20 30");
        run_line(&mut ws, "A[2]←99");
        let v = run_line(&mut ws, "A[2]").unwrap();
        assert_eq!(as_int(&v), 99);
    }

    #[test]
    fn calls_user_defined_function() {
        let mut ws = Workspace::new();
        let lines = vec!["Z←DOUBLE B".to_string(), "Z←B+B".to_string()];
        aplc::UserFunction::fix(&lines, &mut ws.symtab).unwrap();
        let v = run_line(&mut ws, "DOUBLE 21").unwrap();
        assert_eq!(as_int(&v), 42);
    }

    #[test]
    fn strand_notation_nests_parenthesized_groups() {
        let mut ws = Workspace::new();
        let v = run_line(&mut ws, "⍴(1 2)(3 4 5)").unwrap();
        assert_eq!(as_int(&v), 2);
    }

    #[test]
    fn strand_notation_mixes_scalars_and_groups() {
        let mut ws = Workspace::new();
        let v = run_line(&mut ws, "⍴1(2 3)4").unwrap();
        assert_eq!(as_int(&v), 3);
    }

    #[test]
    fn branch_within_function_skips_a_line() {
        let mut ws = Workspace::new();
        let lines = vec![
            "Z←F B".to_string(),
            "→2×B>0".to_string(),
            "Z←¯1".to_string(),
            "Z←1".to_string(),
        ];
        aplc::UserFunction::fix(&lines, &mut ws.symtab).unwrap();
        let v = run_line(&mut ws, "F 5").unwrap();
        assert_eq!(as_int(&v), 1);
    }
}
