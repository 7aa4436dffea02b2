use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Fixed overview pose used by the hint camera.
pub const LOOK_AT_EYE: Vec3 = Vec3::new(2.0, 3.0, 0.0);
pub const LOOK_AT_TARGET: Vec3 = Vec3::ZERO;

/// Pitch used for the view direction; stays short of straight up or down
/// so the look vector never lines up with `up`.
pub const MAX_VIEW_PITCH: f32 = 1.5533;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Eye follows the player, direction from mouse look.
    FreeLook,
    /// Constant eye and target, player ignored.
    LookAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

impl Projection {
    pub fn label(self) -> &'static str {
        match self {
            Projection::Perspective => "Perspective",
            Projection::Orthographic => "Orthographic",
        }
    }
}

/// Unit view direction for horizontal angle `theta` and vertical angle `phi`.
pub fn view_direction(theta: f32, phi: f32) -> Vec3 {
    Vec3::new(phi.cos() * theta.sin(), -phi.sin(), phi.cos() * theta.cos())
}

pub struct Camera {
    pub mode: CameraMode,
    pub projection: Projection,
    pub theta: f32,
    pub phi: f32,
    /// Zoom radius, only feeds the orthographic extent.
    pub distance: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32, distance: f32) -> Self {
        let mut camera = Self {
            mode: CameraMode::FreeLook,
            projection: Projection::Perspective,
            theta: 0.0,
            phi: 0.0,
            distance,
            up: Vec3::Y,
            fov_y: FRAC_PI_2,
            aspect: 1.0,
            z_near: 0.1,
            z_far: 10000.0,
        };
        camera.set_aspect(width, height);
        camera
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            CameraMode::FreeLook => CameraMode::LookAt,
            CameraMode::LookAt => CameraMode::FreeLook,
        };
    }

    /// Ignores zero-sized framebuffers (minimized window).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn forward(&self) -> Vec3 {
        view_direction(self.theta, self.phi.clamp(-MAX_VIEW_PITCH, MAX_VIEW_PITCH))
    }

    pub fn eye(&self, player: Vec3) -> Vec3 {
        match self.mode {
            CameraMode::FreeLook => player,
            CameraMode::LookAt => LOOK_AT_EYE,
        }
    }

    pub fn target(&self, player: Vec3) -> Vec3 {
        match self.mode {
            CameraMode::FreeLook => player + self.forward(),
            CameraMode::LookAt => LOOK_AT_TARGET,
        }
    }

    pub fn view(&self, player: Vec3) -> Mat4 {
        Mat4::look_at_rh(self.eye(player), self.target(player), self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
            }
            Projection::Orthographic => {
                let t = 1.5 * self.distance / 2.5;
                let r = t * self.aspect;
                Mat4::orthographic_rh(-r, r, -t, t, self.z_near, self.z_far)
            }
        }
    }

    pub fn view_proj(&self, player: Vec3) -> Mat4 {
        self.projection_matrix() * self.view(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_view_direction_axes() {
        assert!(approx(view_direction(0.0, 0.0), Vec3::Z));
        assert!(approx(view_direction(FRAC_PI_2, 0.0), Vec3::X));
        assert!(approx(view_direction(0.0, FRAC_PI_2), -Vec3::Y));
    }

    #[test]
    fn test_view_direction_is_unit() {
        for (theta, phi) in [(0.3, 0.2), (-2.0, 1.1), (5.0, -1.5)] {
            assert!((view_direction(theta, phi).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_free_look_target_offsets_player() {
        let mut cam = Camera::new(800, 600, 50.0);
        cam.theta = 0.4;
        cam.phi = -0.2;
        let player = Vec3::new(1.0, 1.5, -3.0);
        assert!(approx(cam.eye(player), player));
        assert!(approx(cam.target(player) - player, view_direction(0.4, -0.2)));
    }

    #[test]
    fn test_look_at_ignores_player() {
        let mut cam = Camera::new(800, 600, 50.0);
        cam.toggle_mode();
        assert_eq!(cam.mode, CameraMode::LookAt);
        let a = cam.view(Vec3::ZERO);
        let b = cam.view(Vec3::new(1.0, 2.0, -9.0));
        assert_eq!(a, b);
        assert!(approx(cam.eye(Vec3::ONE), LOOK_AT_EYE));
        cam.toggle_mode();
        assert_eq!(cam.mode, CameraMode::FreeLook);
    }

    #[test]
    fn test_set_aspect_ignores_zero() {
        let mut cam = Camera::new(800, 400, 50.0);
        assert_eq!(cam.aspect, 2.0);
        cam.set_aspect(0, 100);
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn test_view_proj_finite_at_pitch_limits() {
        let player = Vec3::new(1.0, 1.5, -1.0);
        for phi in [FRAC_PI_2, -FRAC_PI_2] {
            let mut cam = Camera::new(800, 800, 50.0);
            cam.phi = phi;
            assert!(cam.view_proj(player).is_finite(), "phi {phi}");
            cam.projection = Projection::Orthographic;
            assert!(cam.view_proj(player).is_finite(), "phi {phi}");
        }
    }

    #[test]
    fn test_forward_stops_short_of_vertical() {
        let mut cam = Camera::new(800, 800, 50.0);
        cam.phi = FRAC_PI_2;
        assert_eq!(cam.phi, FRAC_PI_2);
        assert!(approx(cam.forward(), view_direction(0.0, MAX_VIEW_PITCH)));
        assert!(cam.forward().cross(cam.up).length() > 1e-3);
    }

    #[test]
    fn test_orthographic_extent_follows_distance() {
        let mut cam = Camera::new(100, 100, 2.5);
        cam.projection = Projection::Orthographic;
        // t = 1.5, so a point at y = 1.5 lands on the top clip edge
        let clip = cam.projection_matrix() * glam::Vec4::new(0.0, 1.5, -1.0, 1.0);
        assert!((clip.y / clip.w - 1.0).abs() < 1e-5);
    }
}
