use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Submit,
    Cancel,
}

/// Applies one key press to the hidden input buffer.
pub fn apply_key(buffer: &mut String, key: &KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Continue;
    }
    match key.code {
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Esc => KeyAction::Cancel,
        KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyAction::Cancel
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            buffer.clear();
            KeyAction::Continue
        }
        KeyCode::Backspace => {
            buffer.pop();
            KeyAction::Continue
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

/// Prompts for a secret with terminal echo off.
pub fn read_password(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    terminal::enable_raw_mode()?;
    let result = read_hidden();
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn read_hidden() -> io::Result<String> {
    let mut buffer = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match apply_key(&mut buffer, &key) {
            KeyAction::Continue => {}
            KeyAction::Submit => return Ok(buffer),
            KeyAction::Cancel => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "Password entry cancelled"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_keys(keys: &[KeyEvent]) -> (String, KeyAction) {
        let mut buffer = String::new();
        let mut last = KeyAction::Continue;
        for key in keys {
            last = apply_key(&mut buffer, key);
            if last != KeyAction::Continue {
                break;
            }
        }
        (buffer, last)
    }

    #[test]
    fn enter_submits_typed_characters() {
        let (secret, action) = type_keys(&[
            press(KeyCode::Char('p')),
            press(KeyCode::Char('w')),
            press(KeyCode::Char('!')),
            press(KeyCode::Enter),
        ]);
        assert_eq!(action, KeyAction::Submit);
        assert_eq!(secret, "pw!");
    }

    #[test]
    fn backspace_removes_last_character() {
        let (secret, _) = type_keys(&[
            press(KeyCode::Char('a')),
            press(KeyCode::Char('b')),
            press(KeyCode::Backspace),
            press(KeyCode::Char('c')),
            press(KeyCode::Enter),
        ]);
        assert_eq!(secret, "ac");

        let mut empty = String::new();
        assert_eq!(apply_key(&mut empty, &press(KeyCode::Backspace)), KeyAction::Continue);
        assert!(empty.is_empty());
    }

    #[test]
    fn ctrl_c_and_escape_cancel() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let (secret, action) = type_keys(&[press(KeyCode::Char('x')), ctrl_c]);
        assert_eq!(action, KeyAction::Cancel);
        assert_eq!(secret, "x");

        assert_eq!(type_keys(&[press(KeyCode::Esc)]).1, KeyAction::Cancel);
    }

    #[test]
    fn ctrl_u_clears_and_releases_are_ignored() {
        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        let mut release = press(KeyCode::Char('z'));
        release.kind = KeyEventKind::Release;

        let (secret, action) = type_keys(&[
            press(KeyCode::Char('o')),
            ctrl_u,
            release,
            press(KeyCode::Char('k')),
            press(KeyCode::Enter),
        ]);
        assert_eq!(action, KeyAction::Submit);
        assert_eq!(secret, "k");
    }
}
