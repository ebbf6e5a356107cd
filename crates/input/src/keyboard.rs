use crate::key::Key;
use rustc_hash::{FxHashMap, FxHashSet};

/// "Is this key held" capability handed to systems that poll input.
pub trait KeyInput {
    fn is_pressed(&self, key: Key) -> bool;
}

/// Keyboard state plus key-down/key-up action bindings.
///
/// Repeated `press` events for a held key (OS auto-repeat) are not edges and
/// trigger nothing. Binding a key again replaces the previous action.
#[derive(Debug, Clone)]
pub struct Keyboard<A> {
    pressed: FxHashSet<Key>,
    on_down: FxHashMap<Key, A>,
    on_up: FxHashMap<Key, A>,
}

impl<A> Default for Keyboard<A> {
    fn default() -> Self {
        Self {
            pressed: FxHashSet::default(),
            on_down: FxHashMap::default(),
            on_up: FxHashMap::default(),
        }
    }
}

impl<A: Clone> Keyboard<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_down(&mut self, key: Key, action: A) {
        self.on_down.insert(key, action);
    }

    pub fn bind_up(&mut self, key: Key, action: A) {
        self.on_up.insert(key, action);
    }

    pub fn unbind(&mut self, key: Key) {
        self.on_down.remove(&key);
        self.on_up.remove(&key);
    }

    /// Record a key-down. Returns the bound action on the released-to-pressed edge.
    pub fn press(&mut self, key: Key) -> Option<A> {
        if !self.pressed.insert(key) {
            return None;
        }
        tracing::trace!(%key, "key down");
        self.on_down.get(&key).cloned()
    }

    /// Record a key-up. Returns the bound action on the pressed-to-released edge.
    pub fn release(&mut self, key: Key) -> Option<A> {
        if !self.pressed.remove(&key) {
            return None;
        }
        tracing::trace!(%key, "key up");
        self.on_up.get(&key).cloned()
    }

    /// Release everything without firing actions, e.g. on focus loss.
    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.pressed.iter().copied()
    }
}

impl<A> KeyInput for Keyboard<A> {
    fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }
}

/// Signed axis from two keys: +1 for `positive`, -1 for `negative`, 0 for both or neither.
pub fn axis(input: &impl KeyInput, positive: Key, negative: Key) -> f32 {
    let mut value = 0.0;
    if input.is_pressed(positive) {
        value += 1.0;
    }
    if input.is_pressed(negative) {
        value -= 1.0;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Action {
        Toggle,
        Quit,
        Stop,
    }

    #[test]
    fn press_fires_only_on_edge() {
        let mut kb = Keyboard::new();
        kb.bind_down(Key::Space, Action::Toggle);
        assert_eq!(kb.press(Key::Space), Some(Action::Toggle));
        assert_eq!(kb.press(Key::Space), None);
        assert!(kb.is_pressed(Key::Space));
        assert_eq!(kb.release(Key::Space), None);
        assert!(!kb.is_pressed(Key::Space));
        assert_eq!(kb.press(Key::Space), Some(Action::Toggle));
    }

    #[test]
    fn release_of_unpressed_key_is_ignored() {
        let mut kb = Keyboard::new();
        kb.bind_up(Key::W, Action::Stop);
        assert_eq!(kb.release(Key::W), None);
        kb.press(Key::W);
        assert_eq!(kb.release(Key::W), Some(Action::Stop));
    }

    #[test]
    fn rebinding_overwrites() {
        let mut kb = Keyboard::new();
        kb.bind_down(Key::Escape, Action::Toggle);
        kb.bind_down(Key::Escape, Action::Quit);
        assert_eq!(kb.press(Key::Escape), Some(Action::Quit));
        kb.release(Key::Escape);
        kb.unbind(Key::Escape);
        assert_eq!(kb.press(Key::Escape), None);
    }

    #[test]
    fn unbound_keys_still_track_state() {
        let mut kb: Keyboard<Action> = Keyboard::new();
        kb.press(Key::Up);
        kb.press(Key::Left);
        let mut held: Vec<_> = kb.pressed_keys().collect();
        held.sort();
        assert_eq!(held, vec![Key::Up, Key::Left]);
        kb.clear();
        assert_eq!(kb.pressed_keys().count(), 0);
    }

    #[test]
    fn axis_cancels_opposing_keys() {
        let mut kb: Keyboard<Action> = Keyboard::new();
        assert_eq!(axis(&kb, Key::W, Key::S), 0.0);
        kb.press(Key::W);
        assert_eq!(axis(&kb, Key::W, Key::S), 1.0);
        kb.press(Key::S);
        assert_eq!(axis(&kb, Key::W, Key::S), 0.0);
        kb.release(Key::W);
        assert_eq!(axis(&kb, Key::W, Key::S), -1.0);
    }
}
