//! The line-input/character-output collaborators a host supplies — pulled
//! by the core, never pushed into it. A REPL wires these to a real
//! terminal; tests and embedders can wire a buffer instead.

use std::io::{self, Write};

pub trait LineInput {
    /// Returns one line of source text, or `None` at EOF.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

pub trait Output {
    fn write_line(&mut self, line: &str);
    fn write_error_line(&mut self, line: &str);
}

/// Plain `stdin`/`stdout`/`stderr`, no history or editing — the fallback
/// for non-interactive input (piped scripts) where a line editor like
/// `rustyline` would be wasted.
pub struct StdioHost;

impl LineInput for StdioHost {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        io::stdout().flush().ok();
        let mut buf = String::new();
        match io::stdin().read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => Some(buf.trim_end_matches(['\n', '\r']).to_string()),
            Err(_) => None,
        }
    }
}

impl Output for StdioHost {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
    fn write_error_line(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        lines: Vec<String>,
        out: Vec<String>,
        err: Vec<String>,
    }

    impl LineInput for Fixture {
        fn read_line(&mut self, _prompt: &str) -> Option<String> {
            if self.lines.is_empty() {
                None
            } else {
                Some(self.lines.remove(0))
            }
        }
    }

    impl Output for Fixture {
        fn write_line(&mut self, line: &str) {
            self.out.push(line.to_string());
        }
        fn write_error_line(&mut self, line: &str) {
            self.err.push(line.to_string());
        }
    }

    #[test]
    fn fixture_yields_lines_then_eof() {
        let mut f = Fixture {
            lines: vec!["1+1".to_string()],
            out: Vec::new(),
            err: Vec::new(),
        };
        assert_eq!(f.read_line("      "), Some("1+1".to_string()));
        assert_eq!(f.read_line("      "), None);
    }
}
