// Result printing for stdout

use colored::Colorize;
use std::io::{self, Write};

use fleetping_core::application::OutputGroup;
use fleetping_core::domain::{ProbeResult, ProbeStatus};

/// Turn colours off unless stdout is a terminal
pub fn configure_colors() {
    use std::io::IsTerminal;

    if !io::stdout().is_terminal() || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
}

/// Status text as shown after `<node>: `
pub fn status_text(result: &ProbeResult) -> String {
    match result.status {
        ProbeStatus::Up => "up".green().to_string(),
        ProbeStatus::Down => "not responding".red().to_string(),
        ProbeStatus::Error => {
            let reason = result.error.as_deref().unwrap_or("unknown error");
            format!("error ({reason})").yellow().to_string()
        }
    }
}

/// Writes one line per result and goes quiet once the reader is gone
pub struct ResultPrinter<W: Write> {
    out: W,
    closed: bool,
}

impl<W: Write> ResultPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out, closed: false }
    }

    /// True after a write hit a closed pipe
    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn print(&mut self, result: &ProbeResult) -> io::Result<()> {
        let line = format!("{}: {}", result.node, status_text(result));
        self.write_line(&line)
    }

    /// Every line of every group, prefixed with the group's node list
    pub fn print_groups(&mut self, groups: &[OutputGroup]) -> io::Result<()> {
        for group in groups {
            let label = group.label();
            for line in group.output.lines() {
                self.write_line(&format!("{label}: {line}"))?;
            }
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        let written = writeln!(self.out, "{line}").and_then(|()| self.out.flush());
        if let Err(e) = &written {
            if e.kind() == io::ErrorKind::BrokenPipe {
                self.closed = true;
            }
        }
        written
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
