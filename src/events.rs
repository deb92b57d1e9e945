use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    Abort,
    QuitDwim,
    InputChar(char),
    Backspace,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    Next,
    Previous,
    PageDown,
    PageUp,
    FirstCandidate,
    LastCandidate,
    ToggleDisplay,
    FocusInput,
    FocusDisplayOrToggle,
    GotoLine,
    Submit,
    ChooseDwim,
    EditCandidate,
    ToggleMode,
    Resize(u16, u16),
}

fn map_key_event(key_event: KeyEvent) -> AppEvent {
    if key_event.kind != KeyEventKind::Press {
        return AppEvent::Tick;
    }

    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key_event.modifiers.contains(KeyModifiers::ALT);

    if ctrl {
        return match key_event.code {
            KeyCode::Char('c') => AppEvent::Abort,
            KeyCode::Char('g') => AppEvent::QuitDwim,
            KeyCode::Char('n') => AppEvent::Next,
            KeyCode::Char('p') => AppEvent::Previous,
            KeyCode::Char('l') => AppEvent::ToggleDisplay,
            KeyCode::Char('o') => AppEvent::FocusDisplayOrToggle,
            KeyCode::Char('j') => AppEvent::ChooseDwim,
            KeyCode::Char('a') => AppEvent::CursorHome,
            KeyCode::Char('e') => AppEvent::CursorEnd,
            _ => AppEvent::Tick,
        };
    }

    if alt {
        return match key_event.code {
            KeyCode::Char('v') => AppEvent::FocusDisplayOrToggle,
            KeyCode::Char('i') => AppEvent::FocusInput,
            KeyCode::Char('g') => AppEvent::GotoLine,
            KeyCode::Char('<') => AppEvent::FirstCandidate,
            KeyCode::Char('>') => AppEvent::LastCandidate,
            KeyCode::Enter => AppEvent::ChooseDwim,
            _ => AppEvent::Tick,
        };
    }

    match key_event.code {
        KeyCode::Esc => AppEvent::QuitDwim,
        KeyCode::Down => AppEvent::Next,
        KeyCode::Up => AppEvent::Previous,
        KeyCode::PageDown => AppEvent::PageDown,
        KeyCode::PageUp => AppEvent::PageUp,
        KeyCode::Left => AppEvent::CursorLeft,
        KeyCode::Right => AppEvent::CursorRight,
        KeyCode::Home => AppEvent::CursorHome,
        KeyCode::End => AppEvent::CursorEnd,
        KeyCode::Backspace => AppEvent::Backspace,
        KeyCode::Enter => AppEvent::Submit,
        KeyCode::Tab => AppEvent::EditCandidate,
        KeyCode::F(2) => AppEvent::ToggleMode,
        KeyCode::Char(c) => AppEvent::InputChar(c),
        _ => AppEvent::Tick,
    }
}

pub fn next_event() -> io::Result<AppEvent> {
    if event::poll(Duration::from_millis(16))? {
        match event::read()? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                return Ok(map_key_event(key_event));
            }
            Event::Resize(width, height) => return Ok(AppEvent::Resize(width, height)),
            _ => {}
        }
    }

    Ok(AppEvent::Tick)
}
