//! End-to-end literal-I/O scenarios, run against a fresh workspace with
//! the default `⎕IO←1 ⎕CT←1E¯13 ⎕PP←10 ⎕PW←80` configuration.

use aplc::{Executable, ParseMode, UserFunction};
use apl_core::Cell;
use apl_runtime::{diagnostics, execute, Workspace};

fn run(ws: &mut Workspace, line: &str) -> Result<Option<apl_core::Value>, (apl_core::ApError, Executable)> {
    let exe = Executable::compile_immediate(line, &mut ws.symtab, ParseMode::ExecuteExpression).unwrap();
    match execute(&exe, ws) {
        Ok(v) => Ok(v),
        Err(e) => Err((e, exe)),
    }
}

fn as_ints(v: &apl_core::Value) -> Vec<i64> {
    v.ravel()
        .iter()
        .map(|c| match c {
            Cell::Int(i) => *i,
            other => panic!("expected Int, got {other:?}"),
        })
        .collect()
}

#[test]
fn e1_vector_plus_vector() {
    let mut ws = Workspace::new();
    let v = run(&mut ws, "1 2 3 + 10 20 30").unwrap().unwrap();
    assert_eq!(as_ints(&v), vec![11, 22, 33]);
}

#[test]
fn e2_sum_of_iota() {
    let mut ws = Workspace::new();
    let v = run(&mut ws, "+/⍳10").unwrap().unwrap();
    assert_eq!(as_ints(&v), vec![55]);
}

#[test]
fn e3_shape_of_nested_vector() {
    let mut ws = Workspace::new();
    let v = run(&mut ws, "⍴(1 2)(3 4 5)").unwrap().unwrap();
    assert_eq!(as_ints(&v), vec![2]);
}

#[test]
fn e4_indexed_assignment_mutates_one_element() {
    let mut ws = Workspace::new();
    let v = run(&mut ws, "A←1 2 3 ⋄ A[2]←99 ⋄ A").unwrap().unwrap();
    assert_eq!(as_ints(&v), vec![1, 99, 3]);
}

#[test]
fn e5_lambda_reduce_with_swapped_operands() {
    let mut ws = Workspace::new();
    let v = run(&mut ws, "{⍵+⍺}/1 2 3 4").unwrap().unwrap();
    assert_eq!(as_ints(&v), vec![10]);
}

#[test]
fn e6_rank_mismatch_reshape_is_length_error() {
    let mut ws = Workspace::new();
    let (err, exe) = run(&mut ws, "3 1⍴'ABCDEF'").unwrap_err();
    assert_eq!(err.kind, apl_core::ErrorKind::Length);
    let rendered = diagnostics::render(&err, &exe);
    let mut lines = rendered.lines();
    assert_eq!(lines.next(), Some("LENGTH ERROR"));
    let image = lines.next().unwrap();
    assert!(image.trim().contains('⍴'));
}

#[test]
fn e7_divide_by_zero_is_domain_error() {
    let mut ws = Workspace::new();
    let (err, exe) = run(&mut ws, "÷0").unwrap_err();
    assert_eq!(err.kind, apl_core::ErrorKind::Domain);
    let rendered = diagnostics::render(&err, &exe);
    let mut lines = rendered.lines();
    assert_eq!(lines.next(), Some("DOMAIN ERROR"));
    let image = lines.next().unwrap();
    assert!(image.trim().contains('÷'));
}

#[test]
fn user_defined_dyadic_function_and_branch() {
    let mut ws = Workspace::new();
    let lines = vec![
        "Z←A MAX B".to_string(),
        "→2+1×(A<B)".to_string(),
        "Z←A ⋄ →0".to_string(),
        "Z←B".to_string(),
    ];
    UserFunction::fix(&lines, &mut ws.symtab).unwrap();
    let v = run(&mut ws, "3 MAX 7").unwrap().unwrap();
    assert_eq!(as_ints(&v), vec![7]);
    let v = run(&mut ws, "9 MAX 2").unwrap().unwrap();
    assert_eq!(as_ints(&v), vec![9]);
}
