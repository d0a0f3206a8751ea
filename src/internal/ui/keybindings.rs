use crate::internal::ui::app::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Maps key events to actions
#[derive(Debug, Clone, Default)]
pub struct KeyBindingMap {
    bindings: HashMap<KeyEvent, Action>,
}

impl KeyBindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the action for a given key event. Modifiers other than SHIFT must
    /// match exactly; SHIFT is folded into the character for `Char` keys.
    pub fn get_action(&self, key: &KeyEvent) -> Option<Action> {
        let normalized = match key.code {
            KeyCode::Char(_) => KeyEvent::new(key.code, key.modifiers - KeyModifiers::SHIFT),
            _ => KeyEvent::new(key.code, key.modifiers),
        };
        self.bindings.get(&normalized).cloned()
    }

    pub fn add_binding(&mut self, key: KeyEvent, action: Action) {
        self.bindings.insert(key, action);
    }
}

/// Create default keybindings for the application
pub fn create_default_keybindings() -> KeyBindingMap {
    let mut map = KeyBindingMap::new();

    // Quit
    map.add_binding(key('q'), Action::Quit);
    map.add_binding(key_code(KeyCode::Esc), Action::Quit);
    map.add_binding(
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        Action::Quit,
    );

    // Navigation
    map.add_binding(key('j'), Action::NavigateDown);
    map.add_binding(key('k'), Action::NavigateUp);
    map.add_binding(key_code(KeyCode::Down), Action::NavigateDown);
    map.add_binding(key_code(KeyCode::Up), Action::NavigateUp);
    map.add_binding(key('g'), Action::NavigateFirst);
    map.add_binding(key('G'), Action::NavigateLast);
    map.add_binding(key_code(KeyCode::Home), Action::NavigateFirst);
    map.add_binding(key_code(KeyCode::End), Action::NavigateLast);

    // Browser
    map.add_binding(key_code(KeyCode::Enter), Action::OpenLink);
    map.add_binding(key('o'), Action::OpenLink);

    // Source filters: 0 is All, 1-9 the sources in button order
    map.add_binding(key_code(KeyCode::Tab), Action::NextFilter);
    map.add_binding(key_code(KeyCode::Right), Action::NextFilter);
    map.add_binding(key('l'), Action::NextFilter);
    map.add_binding(key_code(KeyCode::BackTab), Action::PrevFilter);
    map.add_binding(
        KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT),
        Action::PrevFilter,
    );
    map.add_binding(key_code(KeyCode::Left), Action::PrevFilter);
    map.add_binding(key('h'), Action::PrevFilter);
    for (index, c) in ('0'..='9').enumerate() {
        map.add_binding(key(c), Action::SelectFilter(index));
    }

    // Refresh bypasses the cache
    map.add_binding(key('r'), Action::Refresh { use_cache: false });

    // Theme
    map.add_binding(key('d'), Action::ToggleDarkMode);
    map.add_binding(key('t'), Action::ToggleDarkMode);

    map
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}
