//! aplr - line-oriented REPL for the APL interpreter core.
//!
//! Usage:
//!   aplr                 # interactive session
//!   aplr script.apl      # run a file of immediate-execution lines
//!
//! Function definition uses the classic `∇` bracket: a line starting with
//! `∇` opens a header, subsequent lines are the body, a bare `∇` closes it.

use apl_runtime::host::{LineInput, Output, StdioHost};
use apl_runtime::{diagnostics, execute, Quad, Workspace};
use aplc::{Executable, ParseMode, UserFunction};
use apl_core::UserFunctionHandle;
use clap::Parser as ClapParser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "aplr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Line-oriented REPL for the APL interpreter core", long_about = None)]
struct Cli {
    /// Source file of immediate-execution lines to run non-interactively.
    file: Option<PathBuf>,

    /// Index origin (⎕IO), 0 or 1.
    #[arg(long)]
    io: Option<i64>,

    /// Comparison tolerance (⎕CT).
    #[arg(long)]
    ct: Option<f64>,

    /// Print precision (⎕PP).
    #[arg(long)]
    pp: Option<u32>,
}

struct RustylineHost {
    editor: DefaultEditor,
}

impl LineInput for RustylineHost {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Some(line)
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => None,
            Err(_) => None,
        }
    }
}

impl Output for RustylineHost {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
    fn write_error_line(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("apl_repl=info,aplc=info,apl_runtime=info,apl_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut quad = Quad::new();
    if let Some(io) = cli.io {
        quad = quad.with_io(io);
    }
    if let Some(ct) = cli.ct {
        quad = quad.with_ct(ct);
    }
    if let Some(pp) = cli.pp {
        quad = quad.with_pp(pp);
    }
    let mut ws = Workspace::new().with_quad(quad);

    let exit_code = match cli.file {
        Some(path) => run_script(&path, &mut ws),
        None => match DefaultEditor::new() {
            Ok(editor) => run_interactive(&mut RustylineHost { editor }, &mut ws),
            Err(e) => {
                eprintln!("aplr: could not start line editor: {e}");
                1
            }
        },
    };
    process::exit(exit_code);
}

fn run_script(path: &std::path::Path, ws: &mut Workspace) -> i32 {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("aplr: {}: {e}", path.display());
            return 1;
        }
    };
    let mut host = StdioHost;
    let mut lines = text.lines().map(str::to_string);
    run_session(&mut lines, &mut host, ws)
}

fn run_interactive(host: &mut RustylineHost, ws: &mut Workspace) -> i32 {
    let mut lines = std::iter::from_fn(|| host.read_line("      "));
    run_session(&mut lines, host, ws)
}

/// Drive one session from a source of lines: `lines` is exhausted by
/// `None` (EOF); `∇`-bracketed definitions consume further lines from the
/// same source before immediate-execution resumes.
fn run_session(lines: &mut dyn Iterator<Item = String>, host: &mut dyn Output, ws: &mut Workspace) -> i32 {
    let mut had_error = false;
    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        if line.trim_start().starts_with('∇') {
            if !read_and_fix_function(&line, lines, host, ws) {
                had_error = true;
            }
            continue;
        }
        match Executable::compile_immediate(&line, &mut ws.symtab, ParseMode::ExecuteExpression) {
            Ok(exe) => match execute(&exe, ws) {
                Ok(Some(v)) => host.write_line(&apl_runtime::format::character_representation(&v, ws.quad.pp, ws.quad.pw).join("\n")),
                Ok(None) => {}
                Err(e) => {
                    host.write_error_line(&diagnostics::render(&e, &exe));
                    had_error = true;
                }
            },
            Err(e) => {
                host.write_error_line(e.kind.name());
                had_error = true;
            }
        }
    }
    if had_error {
        1
    } else {
        0
    }
}

fn read_and_fix_function(
    opening: &str,
    lines: &mut dyn Iterator<Item = String>,
    host: &mut dyn Output,
    ws: &mut Workspace,
) -> bool {
    let mut body = Vec::new();
    let header = opening.trim_start()[1..].trim().to_string();
    if !header.is_empty() {
        body.push(header);
    }
    for line in lines.by_ref() {
        if line.trim() == "∇" {
            break;
        }
        body.push(line);
    }
    match UserFunction::fix(&body, &mut ws.symtab) {
        Ok(f) => {
            host.write_line(&format!("{}", f.name()));
            true
        }
        Err(e) => {
            host.write_error_line(e.kind.name());
            false
        }
    }
}
