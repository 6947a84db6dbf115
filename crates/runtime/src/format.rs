//! `character_representation`: render a `Value` as the rectangular grid of
//! characters the REPL prints, honoring `⎕PP` (significant digits) for
//! floats and `⎕PW` (line width) for wrapping vectors/matrices.

use apl_core::{Cell, Value};

/// Render one cell's display text, ignoring column alignment.
fn cell_text(c: &Cell, pp: u32) -> String {
    match c {
        Cell::Char(ch) => ch.to_string(),
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) => format_float(*f, pp),
        Cell::Complex(re, im) => {
            if *im == 0.0 {
                format_float(*re, pp)
            } else {
                format!("{}J{}", format_float(*re, pp), format_float(*im, pp))
            }
        }
        Cell::Pointer(p) => format!("[{}]", character_representation(&p.value.borrow(), pp, u32::MAX).join(" ")),
        Cell::LeftValue(_) | Cell::None => String::new(),
    }
}

fn format_float(f: f64, pp: u32) -> String {
    if f == f.trunc() && f.abs() < 1e15 {
        return format!("{}", f as i64);
    }
    let s = format!("{:.*}", pp as usize, f);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
}

fn negate_bar(s: String) -> String {
    // APL renders negative numbers with a high minus `¯`, not ASCII `-`.
    if let Some(rest) = s.strip_prefix('-') {
        format!("¯{rest}")
    } else {
        s
    }
}

/// Wrap a row of already-rendered cell strings at `pw` columns, breaking
/// only between cells (never inside one). `pw == u32::MAX` means "don't
/// wrap", the convention `character_representation` uses for nested values.
fn wrap_cells(cells: &[String], sep: &str, pw: u32) -> Vec<String> {
    if pw == u32::MAX || cells.is_empty() {
        return vec![cells.join(sep)];
    }
    let pw = pw as usize;
    let mut lines = Vec::new();
    let mut current = String::new();
    for cell in cells {
        let joined_len = if current.is_empty() {
            cell.chars().count()
        } else {
            current.chars().count() + sep.chars().count() + cell.chars().count()
        };
        if !current.is_empty() && joined_len > pw {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str(sep);
        }
        current.push_str(cell);
    }
    lines.push(current);
    lines
}

/// Produce the printed lines for `v`: one line for a scalar or vector
/// (wrapped at `pw` columns if it would exceed that width), one line per row
/// for a rank-2 value (each row independently wrapped). Ranks above 2 fall
/// back to a single ravel-order line prefixed with the shape, which is
/// sufficient for diagnostics even though it is not GNU APL's layered box
/// display.
pub fn character_representation(v: &Value, pp: u32, pw: u32) -> Vec<String> {
    let cells: Vec<String> = v.ravel().iter().map(|c| negate_bar(cell_text(c, pp))).collect();
    let all_char = v.ravel().iter().all(Cell::is_char);
    let sep = if all_char { "" } else { " " };

    match v.rank() {
        0 => vec![cells.into_iter().next().unwrap_or_default()],
        1 => wrap_cells(&cells, sep, pw),
        2 => {
            let rows = v.shape().dim(0).unwrap_or(0);
            let cols = v.shape().dim(1).unwrap_or(0);
            let width = cells.iter().map(|s| s.chars().count()).max().unwrap_or(0);
            (0..rows)
                .flat_map(|r| {
                    let row_cells = &cells[r * cols..(r + 1) * cols];
                    if all_char {
                        wrap_cells(row_cells, "", pw)
                    } else {
                        let padded: Vec<String> =
                            row_cells.iter().map(|c| format!("{c:>width$}")).collect();
                        wrap_cells(&padded, " ", pw)
                    }
                })
                .collect()
        }
        _ => vec![format!("{} {}", v.shape(), cells.join(" "))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apl_core::Shape;

    #[test]
    fn renders_character_vector_without_separators() {
        let v = Value::vector_of("HELLO".chars().map(Cell::Char).collect());
        assert_eq!(character_representation(&v, 10, 80), vec!["HELLO".to_string()]);
    }

    #[test]
    fn renders_negative_numbers_with_high_minus() {
        let v = Value::scalar_of(Cell::Int(-3));
        assert_eq!(character_representation(&v, 10, 80), vec!["¯3".to_string()]);
    }

    #[test]
    fn renders_matrix_rows_right_justified() {
        let v = Value::new(
            Shape::new(vec![2, 2]).unwrap(),
            vec![Cell::Int(1), Cell::Int(20), Cell::Int(3), Cell::Int(4)],
        )
        .unwrap();
        let lines = character_representation(&v, 10, 80);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[test]
    fn wraps_numeric_vector_at_print_width() {
        let v = Value::vector_of((1..=20).map(Cell::Int).collect());
        let lines = character_representation(&v, 10, 10);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.chars().count() <= 10, "line {line:?} exceeds ⎕PW");
        }
        assert_eq!(lines.join(" ").split_whitespace().count(), 20);
    }

    #[test]
    fn does_not_wrap_when_under_print_width() {
        let v = Value::vector_of(vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]);
        assert_eq!(character_representation(&v, 10, 80), vec!["1 2 3".to_string()]);
    }
}
