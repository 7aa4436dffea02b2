/// Window-system independent input handling
use std::collections::HashSet;

use winit::keyboard::{KeyCode, ModifiersState};

use super::navigation::HeldDirections;

/// Input events after translation from winit
#[derive(Debug, Clone)]
pub enum InputEvent {
    // Keyboard events
    KeyDown { code: KeyCode, repeat: bool },
    KeyUp(KeyCode),
    ModifiersChanged(ModifiersState),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    MouseClick { button: MouseButton, is_down: bool },
    MouseWheel { delta_y: f32 },

    // Window events
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// Accumulated input between two frames
#[derive(Debug, Default)]
pub struct InputState {
    pub pressed_keys: HashSet<KeyCode>,
    pub modifiers: ModifiersState,
    pub look_delta: (f32, f32),
    pub scroll_delta: f32,
    /// Fresh key presses (repeats dropped) waiting to become actions
    pub key_presses: Vec<KeyCode>,
    pub left_clicks: u32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown { code, repeat } => {
                self.pressed_keys.insert(*code);
                if !repeat {
                    self.key_presses.push(*code);
                }
            }
            InputEvent::KeyUp(code) => {
                self.pressed_keys.remove(code);
            }
            InputEvent::ModifiersChanged(state) => {
                self.modifiers = *state;
            }
            InputEvent::MouseMove { dx, dy } => {
                self.look_delta.0 += dx;
                self.look_delta.1 += dy;
            }
            InputEvent::MouseClick { button, is_down } => {
                if *button == MouseButton::Left && *is_down {
                    self.left_clicks += 1;
                }
            }
            InputEvent::MouseWheel { delta_y } => {
                self.scroll_delta += delta_y;
            }
            InputEvent::FocusLost => {
                self.clear_keys();
            }
        }
    }

    pub fn is_key_pressed(&self, code: KeyCode) -> bool {
        self.pressed_keys.contains(&code)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
        self.modifiers = ModifiersState::empty();
    }

    pub fn consume_look(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.look_delta)
    }

    pub fn consume_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll_delta)
    }

    pub fn consume_key_presses(&mut self) -> Vec<KeyCode> {
        std::mem::take(&mut self.key_presses)
    }

    pub fn consume_left_clicks(&mut self) -> u32 {
        std::mem::take(&mut self.left_clicks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Discrete commands produced by a single key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    Digit(u8),
    ToggleCameraMode,
    SelectPerspective,
    SelectOrthographic,
    ToggleInfo,
    ReloadShaders,
    ToggleControls,
    Quit,
    /// Shift+digit debug exit with status `100 + digit`
    ExitWithCode(i32),
    NudgeEuler { axis: Axis, negative: bool },
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub toggle_camera: KeyCode,
    pub perspective: KeyCode,
    pub orthographic: KeyCode,
    pub toggle_info: KeyCode,
    pub reload_shaders: KeyCode,
    pub toggle_controls: KeyCode,
    pub escape: KeyCode,
    pub euler_x: KeyCode,
    pub euler_y: KeyCode,
    pub euler_z: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            toggle_camera: KeyCode::KeyF,
            perspective: KeyCode::KeyP,
            orthographic: KeyCode::KeyO,
            toggle_info: KeyCode::KeyH,
            reload_shaders: KeyCode::KeyR,
            toggle_controls: KeyCode::Space,
            escape: KeyCode::Escape,
            euler_x: KeyCode::KeyX,
            euler_y: KeyCode::KeyY,
            euler_z: KeyCode::KeyZ,
        }
    }
}

fn digit_of(code: KeyCode) -> Option<u8> {
    match code {
        KeyCode::Digit0 => Some(0),
        KeyCode::Digit1 => Some(1),
        KeyCode::Digit2 => Some(2),
        KeyCode::Digit3 => Some(3),
        KeyCode::Digit4 => Some(4),
        KeyCode::Digit5 => Some(5),
        KeyCode::Digit6 => Some(6),
        KeyCode::Digit7 => Some(7),
        KeyCode::Digit8 => Some(8),
        KeyCode::Digit9 => Some(9),
        _ => None,
    }
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn held_directions(&self, input: &InputState) -> HeldDirections {
        HeldDirections {
            backward: input.is_key_pressed(self.bindings.backward),
            right: input.is_key_pressed(self.bindings.right),
            forward: input.is_key_pressed(self.bindings.forward),
            left: input.is_key_pressed(self.bindings.left),
        }
    }

    pub fn action_for_key(&self, code: KeyCode, modifiers: ModifiersState) -> Option<GameAction> {
        let b = &self.bindings;
        if let Some(digit) = digit_of(code) {
            // exactly Shift, not Shift+Ctrl etc.
            return if modifiers == ModifiersState::SHIFT {
                Some(GameAction::ExitWithCode(100 + digit as i32))
            } else {
                Some(GameAction::Digit(digit))
            };
        }
        let negative = modifiers.shift_key();
        let action = match code {
            c if c == b.toggle_camera => GameAction::ToggleCameraMode,
            c if c == b.perspective => GameAction::SelectPerspective,
            c if c == b.orthographic => GameAction::SelectOrthographic,
            c if c == b.toggle_info => GameAction::ToggleInfo,
            c if c == b.reload_shaders => GameAction::ReloadShaders,
            c if c == b.toggle_controls => GameAction::ToggleControls,
            c if c == b.escape => GameAction::Quit,
            c if c == b.euler_x => GameAction::NudgeEuler { axis: Axis::X, negative },
            c if c == b.euler_y => GameAction::NudgeEuler { axis: Axis::Y, negative },
            c if c == b.euler_z => GameAction::NudgeEuler { axis: Axis::Z, negative },
            _ => return None,
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_repeat_not_queued() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown { code: KeyCode::Digit1, repeat: false });
        input.process_event(&InputEvent::KeyDown { code: KeyCode::Digit1, repeat: true });
        assert_eq!(input.consume_key_presses(), vec![KeyCode::Digit1]);
        assert!(input.consume_key_presses().is_empty());
        assert!(input.is_key_pressed(KeyCode::Digit1));
    }

    #[test]
    fn test_focus_lost_releases_keys() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown { code: KeyCode::KeyW, repeat: false });
        input.process_event(&InputEvent::FocusLost);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_look_and_scroll_accumulate_then_reset() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseMove { dx: 2.0, dy: -1.0 });
        input.process_event(&InputEvent::MouseMove { dx: 1.0, dy: 4.0 });
        input.process_event(&InputEvent::MouseWheel { delta_y: 1.5 });
        assert_eq!(input.consume_look(), (3.0, 3.0));
        assert_eq!(input.consume_look(), (0.0, 0.0));
        assert_eq!(input.consume_scroll(), 1.5);
        assert_eq!(input.consume_scroll(), 0.0);
    }

    #[test]
    fn test_left_click_counted_on_press_only() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseClick { button: MouseButton::Left, is_down: true });
        input.process_event(&InputEvent::MouseClick { button: MouseButton::Left, is_down: false });
        input.process_event(&InputEvent::MouseClick { button: MouseButton::Right, is_down: true });
        assert_eq!(input.consume_left_clicks(), 1);
    }

    #[test]
    fn test_digit_with_exact_shift_exits() {
        let p = InputProcessor::default();
        assert_eq!(p.action_for_key(KeyCode::Digit3, ModifiersState::SHIFT), Some(GameAction::ExitWithCode(103)));
        assert_eq!(p.action_for_key(KeyCode::Digit3, ModifiersState::empty()), Some(GameAction::Digit(3)));
        let shift_ctrl = ModifiersState::SHIFT | ModifiersState::CONTROL;
        assert_eq!(p.action_for_key(KeyCode::Digit3, shift_ctrl), Some(GameAction::Digit(3)));
    }

    #[test]
    fn test_euler_sign_from_shift() {
        let p = InputProcessor::default();
        assert_eq!(
            p.action_for_key(KeyCode::KeyY, ModifiersState::SHIFT),
            Some(GameAction::NudgeEuler { axis: Axis::Y, negative: true })
        );
        assert_eq!(
            p.action_for_key(KeyCode::KeyX, ModifiersState::empty()),
            Some(GameAction::NudgeEuler { axis: Axis::X, negative: false })
        );
    }

    #[test]
    fn test_unbound_key() {
        let p = InputProcessor::default();
        assert_eq!(p.action_for_key(KeyCode::KeyQ, ModifiersState::empty()), None);
        assert_eq!(p.action_for_key(KeyCode::KeyF, ModifiersState::empty()), Some(GameAction::ToggleCameraMode));
    }

    #[test]
    fn test_held_directions_from_bindings() {
        let p = InputProcessor::default();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown { code: KeyCode::KeyW, repeat: false });
        input.process_event(&InputEvent::KeyDown { code: KeyCode::KeyA, repeat: false });
        let held = p.held_directions(&input);
        assert!(held.forward && held.left);
        assert!(!held.backward && !held.right);
    }
}
