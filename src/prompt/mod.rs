//! Interactive terminal prompter.
//!
//! Questions are drawn inline (no alternate screen) so the transcript of
//! answers and rejections stays in the scrollback.

pub mod widget;

use std::io::{self, IsTerminal, Stdout, Write};

use colored::Colorize;
use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    event::{self, Event, KeyEventKind},
    queue,
    style::Print,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};

use crate::catalog::Question;
use crate::error::{Result, WorkshopError};
use crate::session::{PromptOutcome, Prompter};

pub use widget::{KeyAction, Widget};

/// Raw mode for the lifetime of one question, restored even on panic.
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// [`Prompter`] backed by the process terminal.
pub struct TerminalPrompter {
    out: Stdout,
}

impl TerminalPrompter {
    /// # Errors
    ///
    /// Fails when stdin or stdout is not an interactive terminal.
    pub fn new() -> Result<Self> {
        if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
            return Err(WorkshopError::Config(
                "workshop run requires an interactive terminal".to_string(),
            ));
        }
        Ok(Self { out: io::stdout() })
    }

    /// Redraw the widget over its previous `drawn` lines; returns the new line count.
    fn draw(&mut self, widget: &Widget, drawn: u16) -> Result<u16> {
        self.clear_widget(drawn)?;
        let lines = widget.render();
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                queue!(self.out, Print("\r\n"))?;
            }
            queue!(self.out, Print(line))?;
        }
        if let Some(column) = widget.cursor_column() {
            queue!(self.out, MoveToColumn(column))?;
        }
        self.out.flush()?;
        Ok(u16::try_from(lines.len()).unwrap_or(u16::MAX))
    }

    fn clear_widget(&mut self, drawn: u16) -> Result<()> {
        if drawn > 1 {
            queue!(self.out, MoveUp(drawn - 1))?;
        }
        queue!(self.out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        Ok(())
    }

    /// Replace the widget with a one-line echo of what happened.
    fn finish(&mut self, drawn: u16, echo: &str) -> Result<()> {
        self.clear_widget(drawn)?;
        queue!(self.out, Print(format!("{} {echo}\r\n", ">".cyan())))?;
        self.out.flush()?;
        Ok(())
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &Question) -> Result<PromptOutcome> {
        let mut widget = Widget::for_question(question);

        writeln!(self.out, "{} {}", "?".green().bold(), question.prompt_text.bold())?;
        writeln!(self.out, "{}", widget.hint().dimmed())?;

        let _guard = RawModeGuard::new()?;
        let mut drawn = self.draw(&widget, 0)?;

        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }

            match widget.handle_key(key) {
                KeyAction::Continue => drawn = self.draw(&widget, drawn)?,
                KeyAction::Submit(answer) => {
                    self.finish(drawn, &widget.echo(&answer))?;
                    return Ok(PromptOutcome::Answer(answer));
                }
                KeyAction::Skip => {
                    self.finish(drawn, &"skipped".dimmed().to_string())?;
                    return Ok(PromptOutcome::Skip);
                }
                KeyAction::Abort => {
                    self.finish(drawn, &"aborted".dimmed().to_string())?;
                    return Err(WorkshopError::Interrupted);
                }
            }
        }
    }

    fn reject(&mut self, _question: &Question, message: &str) -> Result<()> {
        writeln!(self.out, "{} {}", ">>".red().bold(), message.red())?;
        Ok(())
    }

    fn notice(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "\n{line}")?;
        Ok(())
    }
}
