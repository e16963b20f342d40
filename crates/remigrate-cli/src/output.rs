//! Terminal rendering of status lines.

use std::io::IsTerminal;

use owo_colors::OwoColorize;
use remigrate::{ACTION_WIDTH, Action, Observer, StatusLine};

/// Prints each status line to stdout the moment the engine produces it.
pub struct Reporter {
    color: bool,
}

impl Reporter {
    /// Colors are used only when stdout is a terminal.
    pub fn stdout() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    pub fn render(&self, line: &StatusLine) -> String {
        if !self.color {
            return line.to_string();
        }
        let action = format!("{:<width$}", line.action, width = ACTION_WIDTH);
        let action = match line.action {
            Action::Create => action.green().to_string(),
            Action::Ignore => action.dimmed().to_string(),
        };
        format!("{} {} {}", line.name_column(), action, line.description())
    }
}

impl Observer for Reporter {
    fn status(&mut self, line: &StatusLine) {
        println!("{}", self.render(line));
    }
}
