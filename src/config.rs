use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;

/// Command-line options for the native binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "escape_room")]
#[command(version, about = "First-person escape room across three puzzle-locked rooms")]
pub struct Args {
    /// Directory holding the .obj models and texture images
    #[arg(long, default_value = "data")]
    pub assets: PathBuf,

    /// WGSL file used instead of the built-in scene shader (re-read on R)
    #[arg(long)]
    pub shader: Option<PathBuf>,

    /// Extra .obj model to load next to the level meshes
    pub extra_model: Option<PathBuf>,
}

/// Compiled-in tunables.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub window_title: String,
    pub window_size: (u32, u32),
    /// Walking speed in units per second.
    pub move_speed: f32,
    /// Radians per pixel of mouse motion.
    pub look_sensitivity: f32,
    /// Zoom distance change per wheel line.
    pub scroll_sensitivity: f32,
    pub spawn_position: Vec3,
    pub initial_distance: f32,
    /// Curve parameter units per second for the hint marker.
    pub hint_rate: f32,
    /// Globe spin in radians per second.
    pub globe_spin_rate: f32,
    /// Euler nudge step for X/Y/Z.
    pub euler_step: f32,
    /// Seconds between frames-per-second refreshes.
    pub fps_interval: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_title: "Escape Room".to_string(),
            window_size: (800, 800),
            move_speed: 2.0,
            look_sensitivity: 0.01,
            scroll_sensitivity: 0.1,
            spawn_position: Vec3::new(0.0, 1.5, 0.0),
            initial_distance: 50.0,
            hint_rate: 0.125,
            globe_spin_rate: 0.1,
            euler_step: std::f32::consts::PI / 16.0,
            fps_interval: 1.0,
        }
    }
}
