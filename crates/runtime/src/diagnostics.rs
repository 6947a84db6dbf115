//! Three-line error display: the error name, the failing statement's
//! source image, and a caret line under the offending span.
//!
//! This mirrors the "name / statement / caret" shape every APL session
//! transcript uses, without reproducing any implementation's exact column
//! math — the caret spans the reported PC range, nothing finer-grained.

use aplc::Executable;
use apl_core::ApError;

/// Render `err` against `exe` as the three lines a host should print.
/// Falls back to just the error name if the reducer didn't attach a PC
/// range (e.g. a `)SI`-stack-depth error raised before any token ran).
pub fn render(err: &ApError, exe: &Executable) -> String {
    let Some(range) = err.range else {
        return err.kind.name().to_string();
    };
    let image = exe.statement_image(range);
    let caret = "^".repeat(image.chars().count().max(1));
    format!("{}\n      {}\n      {}", err.kind.name(), image, caret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aplc::ParseMode;
    use apl_core::{ErrorKind, SymbolTable};

    #[test]
    fn renders_name_only_without_a_range() {
        let err = ApError::new(ErrorKind::SystemLimitSiDepth);
        let mut st = SymbolTable::new();
        let exe = Executable::compile_immediate("1+1", &mut st, ParseMode::ExecuteExpression).unwrap();
        assert_eq!(render(&err, &exe), "SYSTEM LIMIT ERROR (SI depth)");
    }

    #[test]
    fn renders_three_lines_with_a_range() {
        let mut st = SymbolTable::new();
        let exe = Executable::compile_immediate("1+2", &mut st, ParseMode::ExecuteExpression).unwrap();
        let err = ApError::with_range(ErrorKind::Domain, (0, exe.body.len() - 1));
        let rendered = render(&err, &exe);
        assert!(rendered.starts_with("DOMAIN ERROR\n"));
        assert_eq!(rendered.lines().count(), 3);
    }
}
