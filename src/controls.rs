//! Keyboard -> showcase actions.

use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NextEffect,
    PrevEffect,
    SelectNext,
    SelectPrev,
    /// Move the selected control by this many steps.
    Nudge(i32),
    TogglePointer,
    Export,
    Reset,
}

pub fn map_key(code: KeyCode, shift: bool) -> Option<Action> {
    let a = match code {
        KeyCode::ArrowRight => Action::NextEffect,
        KeyCode::ArrowLeft => Action::PrevEffect,
        KeyCode::Tab if shift => Action::SelectPrev,
        KeyCode::Tab => Action::SelectNext,
        KeyCode::ArrowUp => Action::Nudge(if shift { 10 } else { 1 }),
        KeyCode::ArrowDown => Action::Nudge(if shift { -10 } else { -1 }),
        KeyCode::KeyM => Action::TogglePointer,
        KeyCode::KeyE => Action::Export,
        KeyCode::KeyR => Action::Reset,
        _ => return None,
    };
    Some(a)
}

pub const HELP: &str = "Left/Right: effect | Tab/Shift+Tab: control | Up/Down: adjust (Shift x10) | M: mouse distortion | E: export | R: reset";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_reverses_tab_and_scales_nudges() {
        assert_eq!(map_key(KeyCode::Tab, false), Some(Action::SelectNext));
        assert_eq!(map_key(KeyCode::Tab, true), Some(Action::SelectPrev));
        assert_eq!(map_key(KeyCode::ArrowUp, false), Some(Action::Nudge(1)));
        assert_eq!(map_key(KeyCode::ArrowDown, true), Some(Action::Nudge(-10)));
        assert_eq!(map_key(KeyCode::KeyQ, false), None);
    }
}
