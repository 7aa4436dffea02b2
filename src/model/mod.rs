// MODEL: puzzle state, camera and level data
pub mod camera;
pub mod hint_curve;
pub mod level;
pub mod puzzle;

pub use camera::{Camera, CameraMode, Projection};
pub use hint_curve::{CubicBezier, HintCurve};
pub use level::{draw_list, DrawCommand, ObjectId, SceneSnapshot, TextureSlot};
pub use puzzle::{Latch, Lever, Prop, PuzzleState};
