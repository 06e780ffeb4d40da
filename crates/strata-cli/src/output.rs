//! Terminal output: status lines, headers, and error reports.
//!
//! Every user-facing write goes through [`OutputManager`] so quiet mode,
//! `--no-color`, the `NO_COLOR` environment variable, and `--output-format`
//! are resolved in one place. Status lines go to stdout; error reports go
//! to stderr.

use std::error::Error;
use std::ffi::OsStr;
use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;
use crate::error::CliError;

/// Visual category of a status line.
#[derive(Clone, Copy)]
enum Tone {
    Success,
    Error,
    Warning,
    Info,
}

impl Tone {
    fn icon(self) -> &'static str {
        match self {
            Self::Success => "\u{2713}", // ✓
            Self::Error => "\u{2717}",   // ✗
            Self::Warning => "\u{26a0}", // ⚠
            Self::Info => "\u{2139}",    // ℹ
        }
    }

    fn paint(self, msg: &str) -> String {
        let icon = self.icon();
        match self {
            Self::Success => format!("{} {}", icon.green().bold(), msg.green()),
            Self::Error => format!("{} {}", icon.red().bold(), msg.red()),
            Self::Warning => format!("{} {}", icon.yellow().bold(), msg.yellow()),
            Self::Info => format!("{} {}", icon.blue().bold(), msg.blue()),
        }
    }
}

/// `NO_COLOR` convention: any non-empty value disables colour.
fn env_disables_color(value: Option<&OsStr>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Routes user-facing output according to the resolved flags and config.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    stdout: Term,
    stderr: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        // Resolve Auto → Human (TTY) or Plain (piped/redirected).
        let resolved_format = if args.output_format == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            args.output_format
        };

        let no_color = args.no_color
            || config.output.no_color
            || env_disables_color(std::env::var_os("NO_COLOR").as_deref());

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color,
            stdout: Term::stdout(),
            stderr: Term::stderr(),
        }
    }

    fn status_line(&self, tone: Tone, msg: &str, color: bool) -> String {
        if color {
            tone.paint(msg)
        } else {
            format!("{} {}", tone.icon(), msg)
        }
    }

    fn stderr_color(&self) -> bool {
        !self.no_color && io::stderr().is_terminal()
    }

    // ── stdout ────────────────────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout
            .write_line(&self.status_line(Tone::Success, msg, !self.no_color))
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout
            .write_line(&self.status_line(Tone::Warning, msg, !self.no_color))
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout
            .write_line(&self.status_line(Tone::Info, msg, !self.no_color))
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.stdout.write_line(&line)
    }

    // ── stderr ────────────────────────────────────────────────────────────

    /// Error indicator: `✗ <msg>`.  *Not* suppressed in quiet mode — errors
    /// must always be visible. Written to stderr.
    pub fn error(&self, msg: &str) -> io::Result<()> {
        self.stderr
            .write_line(&self.status_line(Tone::Error, msg, self.stderr_color()))
    }

    /// Full error report: headline, optional cause chain, suggestions, and
    /// the verbosity hint.
    pub fn report_error(&self, err: &CliError, verbose: bool) -> io::Result<()> {
        self.stderr.write_line("")?;
        self.error(&err.to_string())?;

        if verbose {
            let mut source = err.source();
            while let Some(cause) = source {
                self.stderr.write_line(&format!("  caused by: {cause}"))?;
                source = cause.source();
            }
        }

        let suggestions = err.suggestions();
        if !suggestions.is_empty() {
            self.stderr.write_line("")?;
            let heading = if self.stderr_color() {
                "Suggestions:".yellow().bold().to_string()
            } else {
                "Suggestions:".to_owned()
            };
            self.stderr.write_line(&heading)?;
            for suggestion in &suggestions {
                self.stderr.write_line(&format!("  {suggestion}"))?;
            }
        }

        if !verbose {
            self.stderr.write_line("")?;
            self.stderr
                .write_line("Use -v / --verbose for more details.")?;
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if quiet mode suppresses most output.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
