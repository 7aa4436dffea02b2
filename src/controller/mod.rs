// CONTROLLER: Input, navigation, and per-frame update
pub mod camera_controller;
pub mod frame_loop;
pub mod input;
pub mod navigation;
pub mod session;

pub use camera_controller::CameraController;
pub use frame_loop::{FpsCounter, FrameClock};
pub use input::{GameAction, InputEvent, InputProcessor, InputState, KeyBindings};
pub use navigation::{Collision, HeldDirections, Navigator};
pub use session::{GameSession, Screen, SessionCommand};
