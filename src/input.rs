use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    SwitchTab(u8),
    Down,
    Up,
    PageDown,
    PageUp,
    Bottom,
    GPrefix,
    ToggleHelp,
    Refresh,
    StartFilter,
    ExportReport,
    ClearFilter,
    SubmitInput,
    CancelInput,
    Backspace,
    DeleteWord,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Filter => map_filter_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(c) if key.modifiers.is_empty() && ('1'..='3').contains(&c) => {
            Some(Action::SwitchTab(c.to_digit(10).unwrap_or(1) as u8))
        }
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Left | KeyCode::BackTab => Some(Action::PrevTab),
        KeyCode::Right | KeyCode::Tab => Some(Action::NextTab),
        KeyCode::Char('h') if key.modifiers.is_empty() => Some(Action::PrevTab),
        KeyCode::Char('l') if key.modifiers.is_empty() => Some(Action::NextTab),
        KeyCode::Char('g') => Some(Action::GPrefix),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('/') => Some(Action::StartFilter),
        KeyCode::Char('x') if key.modifiers.is_empty() => Some(Action::ExportReport),
        KeyCode::Esc => Some(Action::ClearFilter),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PageDown)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        _ => None,
    }
}

fn map_filter_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::DeleteWord)
        }
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn normal_mode_maps_quit() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
    }

    #[test]
    fn normal_mode_maps_digits_to_tabs() {
        let key = KeyEvent::new(KeyCode::Char('2'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::SwitchTab(2)));
        let key = KeyEvent::new(KeyCode::Char('4'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), None);
    }

    #[test]
    fn normal_mode_maps_refresh_and_export() {
        let refresh = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
        let export = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, refresh), Some(Action::Refresh));
        assert_eq!(
            map_key(InputMode::Normal, export),
            Some(Action::ExportReport)
        );
    }

    #[test]
    fn normal_mode_maps_slash_to_filter() {
        let key = KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::StartFilter));
    }

    #[test]
    fn filter_mode_maps_chars_and_submit() {
        let char_key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            map_key(InputMode::Filter, char_key),
            Some(Action::InputChar('a'))
        );
        assert_eq!(map_key(InputMode::Filter, enter), Some(Action::SubmitInput));
    }

    #[test]
    fn filter_mode_rejects_ctrl_c() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Filter, key), None);
    }
}
