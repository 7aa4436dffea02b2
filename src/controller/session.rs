// One play-through: puzzle, player, camera and hint marker advanced frame
// by frame, plus which full-screen message (if any) is up.

use glam::{Mat4, Vec3};

use super::camera_controller::CameraController;
use super::input::{Axis, GameAction};
use super::navigation::{Collision, HeldDirections, Navigator};
use crate::config::GameConfig;
use crate::model::level::{self, DrawCommand, SceneSnapshot};
use crate::model::{Camera, CameraMode, HintCurve, Projection, PuzzleState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    /// Controls help is up; the world is paused.
    Controls,
    /// Trophy reached; only quitting is left.
    Finished,
}

/// Side effects the window layer has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Quit,
    Exit(i32),
    ReloadShaders,
    CaptureCursor(bool),
}

pub struct GameSession {
    config: GameConfig,
    puzzle: PuzzleState,
    navigator: Navigator,
    camera: Camera,
    controller: CameraController,
    hint: HintCurve,
    screen: Screen,
    look_enabled: bool,
    show_info: bool,
    euler: Vec3,
    elapsed: f32,
}

impl GameSession {
    pub fn new(config: GameConfig, width: u32, height: u32) -> Self {
        Self {
            puzzle: PuzzleState::new(),
            navigator: Navigator::new(config.spawn_position, config.move_speed),
            camera: Camera::new(width, height, config.initial_distance),
            controller: CameraController::new(config.look_sensitivity, config.scroll_sensitivity),
            hint: HintCurve::new(config.hint_rate),
            screen: Screen::Playing,
            look_enabled: true,
            show_info: true,
            euler: Vec3::ZERO,
            elapsed: 0.0,
            config,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn puzzle(&self) -> &PuzzleState {
        &self.puzzle
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn player_position(&self) -> Vec3 {
        self.navigator.position()
    }

    pub fn hint(&self) -> &HintCurve {
        &self.hint
    }

    pub fn show_info(&self) -> bool {
        self.show_info
    }

    pub fn look_enabled(&self) -> bool {
        self.look_enabled
    }

    /// User Euler angles (x, y, z) nudged with X/Y/Z.
    pub fn euler(&self) -> Vec3 {
        self.euler
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    pub fn handle_action(&mut self, action: GameAction) -> Option<SessionCommand> {
        match action {
            GameAction::Quit => return Some(SessionCommand::Quit),
            GameAction::ExitWithCode(code) => return Some(SessionCommand::Exit(code)),
            GameAction::ToggleControls => return self.toggle_controls(),
            _ => {}
        }
        if self.screen != Screen::Playing {
            return None;
        }
        match action {
            GameAction::Digit(d) => {
                self.puzzle.press_digit(d);
            }
            GameAction::ToggleCameraMode => {
                self.camera.toggle_mode();
                tracing::debug!(mode = ?self.camera.mode, "camera mode");
            }
            GameAction::SelectPerspective => self.camera.projection = Projection::Perspective,
            GameAction::SelectOrthographic => self.camera.projection = Projection::Orthographic,
            GameAction::ToggleInfo => self.show_info = !self.show_info,
            GameAction::ReloadShaders => return Some(SessionCommand::ReloadShaders),
            GameAction::NudgeEuler { axis, negative } => {
                let step = if negative { -self.config.euler_step } else { self.config.euler_step };
                match axis {
                    Axis::X => self.euler.x += step,
                    Axis::Y => self.euler.y += step,
                    Axis::Z => self.euler.z += step,
                }
            }
            GameAction::Quit | GameAction::ExitWithCode(_) | GameAction::ToggleControls => {}
        }
        None
    }

    fn toggle_controls(&mut self) -> Option<SessionCommand> {
        match self.screen {
            Screen::Playing => {
                self.screen = Screen::Controls;
                Some(SessionCommand::CaptureCursor(false))
            }
            Screen::Controls => {
                self.screen = Screen::Playing;
                Some(SessionCommand::CaptureCursor(true))
            }
            Screen::Finished => None,
        }
    }

    pub fn toggle_look(&mut self) {
        if self.screen == Screen::Playing {
            self.look_enabled = !self.look_enabled;
        }
    }

    pub fn look(&mut self, dx: f32, dy: f32) {
        if self.screen == Screen::Playing && self.look_enabled {
            self.controller.apply_look(&mut self.camera, dx, dy);
        }
    }

    pub fn scroll(&mut self, delta_y: f32) {
        if self.screen == Screen::Playing {
            self.controller.apply_zoom(&mut self.camera, delta_y);
        }
    }

    /// Advances one frame: move and collide, latch doors, move the hint.
    pub fn update(&mut self, dt: f32, held: HeldDirections) -> Option<SessionCommand> {
        if self.screen != Screen::Playing {
            return None;
        }
        // movement keys only drive the player in free-look
        let held = match self.camera.mode {
            CameraMode::FreeLook => held,
            CameraMode::LookAt => HeldDirections::default(),
        };
        let collision = self.navigator.step(
            held,
            dt,
            self.camera.theta,
            self.camera.phi,
            self.puzzle.door1_open(),
            self.puzzle.door2_open(),
        );
        self.puzzle.commit();
        self.hint.advance(dt);
        self.elapsed += dt;

        if collision == Collision::Finish || self.navigator.game_over() {
            self.screen = Screen::Finished;
            tracing::info!(elapsed = self.elapsed, "escape room finished");
            return Some(SessionCommand::CaptureCursor(false));
        }
        None
    }

    pub fn view_proj(&self) -> Mat4 {
        self.camera.view_proj(self.navigator.position())
    }

    pub fn eye(&self) -> Vec3 {
        self.camera.eye(self.navigator.position())
    }

    pub fn draw_list(&self) -> Vec<DrawCommand> {
        level::draw_list(&SceneSnapshot {
            puzzle: &self.puzzle,
            elapsed: self.elapsed,
            globe_spin_rate: self.config.globe_spin_rate,
            euler_y: self.euler.y,
            hint_position: self.hint.position(),
            show_hint: self.camera.mode == CameraMode::LookAt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::level::ObjectId;

    fn session() -> GameSession {
        GameSession::new(GameConfig::default(), 800, 800)
    }

    fn press(s: &mut GameSession, digits: &[u8]) {
        for d in digits {
            s.handle_action(GameAction::Digit(*d));
        }
    }

    fn walk(s: &mut GameSession, held: HeldDirections, frames: usize) {
        for _ in 0..frames {
            s.update(0.05, held);
        }
    }

    const BACK: HeldDirections = HeldDirections { backward: true, right: false, forward: false, left: false };

    #[test]
    fn test_door1_blocks_until_levers_solved() {
        let mut s = session();
        walk(&mut s, BACK, 100);
        let z = s.player_position().z;
        assert!(z > -2.35 && z < -2.2, "stopped at {z}");

        press(&mut s, &[7, 5, 2]);
        // door opens on the next frame's commit
        s.update(0.0, HeldDirections::default());
        assert!(s.puzzle().door1_open());
        walk(&mut s, BACK, 40);
        let z = s.player_position().z;
        assert!(z < -2.35 && z > -7.35, "stopped at {z}");
    }

    #[test]
    fn test_full_run_reaches_finish() {
        let mut s = session();
        press(&mut s, &[7, 5, 2]);
        s.update(0.0, HeldDirections::default());
        press(&mut s, &[2, 3, 3, 4, 4, 4, 4, 4, 5]);
        s.update(0.0, HeldDirections::default());
        assert!(s.puzzle().door2_open());

        let mut finished = None;
        for _ in 0..400 {
            if let Some(cmd) = s.update(0.05, BACK) {
                finished = Some(cmd);
                break;
            }
        }
        assert_eq!(finished, Some(SessionCommand::CaptureCursor(false)));
        assert_eq!(s.screen(), Screen::Finished);

        let z = s.player_position().z;
        s.update(0.05, BACK);
        assert_eq!(s.player_position().z, z);
    }

    #[test]
    fn test_controls_screen_pauses_world() {
        let mut s = session();
        assert_eq!(s.handle_action(GameAction::ToggleControls), Some(SessionCommand::CaptureCursor(false)));
        walk(&mut s, BACK, 10);
        assert_eq!(s.player_position(), GameConfig::default().spawn_position);
        press(&mut s, &[1]);
        assert!(!s.puzzle().levers().is_active(crate::model::Lever::L1));
        assert_eq!(s.handle_action(GameAction::ToggleControls), Some(SessionCommand::CaptureCursor(true)));
        assert_eq!(s.screen(), Screen::Playing);
    }

    #[test]
    fn test_quit_and_exit_always_pass_through() {
        let mut s = session();
        s.handle_action(GameAction::ToggleControls);
        assert_eq!(s.handle_action(GameAction::Quit), Some(SessionCommand::Quit));
        assert_eq!(s.handle_action(GameAction::ExitWithCode(104)), Some(SessionCommand::Exit(104)));
    }

    #[test]
    fn test_look_at_mode_freezes_player_and_shows_hint() {
        let mut s = session();
        s.handle_action(GameAction::ToggleCameraMode);
        walk(&mut s, BACK, 10);
        assert_eq!(s.player_position(), GameConfig::default().spawn_position);
        assert!(s.draw_list().iter().any(|c| c.object == ObjectId::TipSphere));
        s.handle_action(GameAction::ToggleCameraMode);
        assert!(!s.draw_list().iter().any(|c| c.object == ObjectId::TipSphere));
    }

    #[test]
    fn test_look_toggle() {
        let mut s = session();
        s.look(10.0, 0.0);
        let theta = s.camera().theta;
        assert!(theta < 0.0);
        s.toggle_look();
        s.look(10.0, 0.0);
        assert_eq!(s.camera().theta, theta);
    }

    #[test]
    fn test_view_stays_finite_after_long_drag() {
        let mut s = session();
        let left = HeldDirections { left: true, ..Default::default() };
        walk(&mut s, left, 10);
        walk(&mut s, BACK, 10);
        assert!(s.player_position().x > 0.9);
        assert!(s.player_position().z < -0.9);
        s.look(0.0, 10_000.0);
        assert_eq!(s.camera().phi, std::f32::consts::FRAC_PI_2);
        assert!(s.view_proj().is_finite());
        s.look(0.0, -20_000.0);
        assert_eq!(s.camera().phi, -std::f32::consts::FRAC_PI_2);
        assert!(s.view_proj().is_finite());
    }

    #[test]
    fn test_euler_nudge_and_projection() {
        let mut s = session();
        s.handle_action(GameAction::NudgeEuler { axis: Axis::Y, negative: false });
        s.handle_action(GameAction::NudgeEuler { axis: Axis::Y, negative: false });
        s.handle_action(GameAction::NudgeEuler { axis: Axis::Y, negative: true });
        assert!((s.euler().y - std::f32::consts::PI / 16.0).abs() < 1e-6);
        s.handle_action(GameAction::SelectOrthographic);
        assert_eq!(s.camera().projection, Projection::Orthographic);
        assert_eq!(s.handle_action(GameAction::ReloadShaders), Some(SessionCommand::ReloadShaders));
    }
}
