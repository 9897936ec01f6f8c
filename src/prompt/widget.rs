//! Input widgets: key handling and line rendering, independent of the terminal.

use colored::Colorize;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::catalog::{Answer, Question, QuestionKind};

const POINTER: &str = "❯";
const CHECKED: &str = "◉";
const UNCHECKED: &str = "◯";

/// Result of feeding one key to a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Submit(Answer),
    /// Ctrl-S: give up on this question for now.
    Skip,
    /// Ctrl-C: leave the session.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Text {
        buffer: String,
        /// Cursor position in chars.
        cursor: usize,
        masked: bool,
        default: Option<String>,
    },
    Confirm {
        default: bool,
    },
    Select {
        choices: Vec<String>,
        cursor: usize,
    },
    Checkbox {
        choices: Vec<String>,
        cursor: usize,
        checked: Vec<bool>,
    },
}

impl Widget {
    #[must_use]
    pub fn for_question(question: &Question) -> Self {
        match question.kind.as_ref() {
            Some(QuestionKind::Confirm) => Self::Confirm {
                default: !matches!(
                    question.default.as_deref().map(str::to_ascii_lowercase).as_deref(),
                    Some("false" | "n" | "no")
                ),
            },
            Some(QuestionKind::List) => Self::Select {
                cursor: question
                    .default
                    .as_ref()
                    .and_then(|d| question.choices.iter().position(|c| c == d))
                    .unwrap_or(0),
                choices: question.choices.clone(),
            },
            Some(QuestionKind::Checkbox) => Self::Checkbox {
                checked: vec![false; question.choices.len()],
                choices: question.choices.clone(),
                cursor: 0,
            },
            Some(QuestionKind::Password) => Self::text(None, true),
            _ => Self::text(question.default.clone(), false),
        }
    }

    fn text(default: Option<String>, masked: bool) -> Self {
        Self::Text {
            buffer: String::new(),
            cursor: 0,
            masked,
            default,
        }
    }

    /// Key help shown under the question.
    #[must_use]
    pub fn hint(&self) -> String {
        let skip = "ctrl-s to skip";
        match self {
            Self::Text {
                default: Some(default),
                ..
            } => format!("(enter for {default}, {skip})"),
            Self::Text { .. } => format!("({skip})"),
            Self::Confirm { default: true } => format!("(Y/n, {skip})"),
            Self::Confirm { default: false } => format!("(y/N, {skip})"),
            Self::Select { .. } => format!("(arrows to move, enter to pick, {skip})"),
            Self::Checkbox { .. } => {
                format!("(space to toggle, a all, i invert, enter to submit, {skip})")
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s' | 'S') => return KeyAction::Skip,
                KeyCode::Char('c' | 'C') => return KeyAction::Abort,
                _ => {}
            }
        }

        match self {
            Self::Text {
                buffer,
                cursor,
                default,
                ..
            } => handle_text_key(buffer, cursor, default.as_deref(), key),
            Self::Confirm { default } => match key.code {
                KeyCode::Char('y' | 'Y') => submit_text("true"),
                KeyCode::Char('n' | 'N') => submit_text("false"),
                KeyCode::Enter => submit_text(if *default { "true" } else { "false" }),
                _ => KeyAction::Continue,
            },
            Self::Select { choices, cursor } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    *cursor = step_back(*cursor, choices.len());
                    KeyAction::Continue
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    *cursor = step_forward(*cursor, choices.len());
                    KeyAction::Continue
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let idx = (c as usize) - ('1' as usize);
                    if idx < choices.len() {
                        *cursor = idx;
                    }
                    KeyAction::Continue
                }
                KeyCode::Enter => submit_text(choices.get(*cursor).map_or("", String::as_str)),
                _ => KeyAction::Continue,
            },
            Self::Checkbox {
                choices,
                cursor,
                checked,
            } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    *cursor = step_back(*cursor, choices.len());
                    KeyAction::Continue
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    *cursor = step_forward(*cursor, choices.len());
                    KeyAction::Continue
                }
                KeyCode::Char(' ') => {
                    if let Some(slot) = checked.get_mut(*cursor) {
                        *slot = !*slot;
                    }
                    KeyAction::Continue
                }
                KeyCode::Char('a') => {
                    let all = checked.iter().all(|c| *c);
                    checked.iter_mut().for_each(|c| *c = !all);
                    KeyAction::Continue
                }
                KeyCode::Char('i') => {
                    checked.iter_mut().for_each(|c| *c = !*c);
                    KeyAction::Continue
                }
                KeyCode::Enter => KeyAction::Submit(Answer::Many(
                    choices
                        .iter()
                        .zip(checked.iter())
                        .filter(|(_, on)| **on)
                        .map(|(choice, _)| choice.clone())
                        .collect(),
                )),
                _ => KeyAction::Continue,
            },
        }
    }

    /// Lines to draw for the current state.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        match self {
            Self::Text { buffer, masked, .. } => {
                let shown = if *masked {
                    "*".repeat(buffer.chars().count())
                } else {
                    buffer.clone()
                };
                vec![format!("{} {shown}", ">".cyan())]
            }
            Self::Confirm { default } => {
                let choices = if *default { "Y/n" } else { "y/N" };
                vec![format!("{} {choices}", ">".cyan())]
            }
            Self::Select { choices, cursor } => choices
                .iter()
                .enumerate()
                .map(|(idx, choice)| {
                    if idx == *cursor {
                        format!("{POINTER} {}", choice.cyan())
                    } else {
                        format!("  {choice}")
                    }
                })
                .collect(),
            Self::Checkbox {
                choices,
                cursor,
                checked,
            } => choices
                .iter()
                .enumerate()
                .map(|(idx, choice)| {
                    let pointer = if idx == *cursor { POINTER } else { " " };
                    let mark = if checked[idx] {
                        CHECKED.green().to_string()
                    } else {
                        UNCHECKED.to_string()
                    };
                    format!("{pointer}{mark} {choice}")
                })
                .collect(),
        }
    }

    /// Column of the text cursor on the last rendered line, for text input.
    #[must_use]
    pub fn cursor_column(&self) -> Option<u16> {
        match self {
            Self::Text { cursor, .. } => u16::try_from(cursor + 2).ok(),
            _ => None,
        }
    }

    /// How a submitted answer is echoed after the widget closes.
    #[must_use]
    pub fn echo(&self, answer: &Answer) -> String {
        match (self, answer) {
            (Self::Text { masked: true, .. }, Answer::Text(text)) => "*".repeat(text.chars().count()),
            (_, Answer::Many(items)) => items.join(", "),
            (_, Answer::Text(text)) => text.clone(),
        }
    }
}

fn handle_text_key(
    buffer: &mut String,
    cursor: &mut usize,
    default: Option<&str>,
    key: KeyEvent,
) -> KeyAction {
    match key.code {
        KeyCode::Enter => {
            if buffer.is_empty() {
                if let Some(default) = default {
                    return submit_text(default);
                }
            }
            submit_text(buffer)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            buffer.clear();
            *cursor = 0;
            KeyAction::Continue
        }
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            let at = byte_offset(buffer, *cursor);
            buffer.insert(at, c);
            *cursor += 1;
            KeyAction::Continue
        }
        KeyCode::Backspace => {
            if *cursor > 0 {
                let at = byte_offset(buffer, *cursor - 1);
                buffer.remove(at);
                *cursor -= 1;
            }
            KeyAction::Continue
        }
        KeyCode::Delete => {
            if *cursor < buffer.chars().count() {
                let at = byte_offset(buffer, *cursor);
                buffer.remove(at);
            }
            KeyAction::Continue
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
            KeyAction::Continue
        }
        KeyCode::Right => {
            *cursor = (*cursor + 1).min(buffer.chars().count());
            KeyAction::Continue
        }
        KeyCode::Home => {
            *cursor = 0;
            KeyAction::Continue
        }
        KeyCode::End => {
            *cursor = buffer.chars().count();
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn submit_text(text: &str) -> KeyAction {
    KeyAction::Submit(Answer::Text(text.to_string()))
}

fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(idx, _)| idx)
}

const fn step_back(cursor: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else if cursor == 0 {
        len - 1
    } else {
        cursor - 1
    }
}

const fn step_forward(cursor: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (cursor + 1) % len }
}
