#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Z,
    Y,
    H,
    Space,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn press(key: KeyCode, modifiers: KeyModifiers) -> Self {
        Self {
            key,
            modifiers,
            pressed: true,
        }
    }

    pub fn release(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
            pressed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Undo,
    Redo,
    TogglePanMode,
    PanKeyHeld(bool),
    CancelStroke,
}

/// Shortcuts stay out of the way while a text field has focus. Releasing the pan key is
/// always honored so the modifier can't get stuck.
pub fn should_consume_key_event(text_input_focused: bool, event: KeyEvent) -> bool {
    if !text_input_focused {
        return true;
    }
    matches!(event.key, KeyCode::Space) && !event.pressed
}

pub fn map_key_event_to_command(text_input_focused: bool, event: KeyEvent) -> Option<KeyCommand> {
    if !should_consume_key_event(text_input_focused, event) {
        return None;
    }

    if !event.pressed {
        return match event.key {
            KeyCode::Space => Some(KeyCommand::PanKeyHeld(false)),
            _ => None,
        };
    }

    match (event.key, event.modifiers) {
        (KeyCode::Z, KeyModifiers { ctrl: true, shift: false }) => Some(KeyCommand::Undo),
        (KeyCode::Z, KeyModifiers { ctrl: true, shift: true }) => Some(KeyCommand::Redo),
        (KeyCode::Y, KeyModifiers { ctrl: true, .. }) => Some(KeyCommand::Redo),
        (KeyCode::H, KeyModifiers { ctrl: false, .. }) => Some(KeyCommand::TogglePanMode),
        (KeyCode::Space, _) => Some(KeyCommand::PanKeyHeld(true)),
        (KeyCode::Escape, _) => Some(KeyCommand::CancelStroke),
        _ => None,
    }
}
