// Screen-space text on top of the scene, drawn with egui.
//
// Layout is computed from the session alone so it can be checked without a
// window; `TextOverlay` only turns an `OverlayFrame` into egui shapes.

use egui::{Align2, Color32};
use glam::Vec2;
use winit::window::Window;

use crate::controller::{GameSession, Screen};
use crate::view::gpu_init::GpuContext;

pub const HUD_TEXT_SIZE: f32 = 14.0;
pub const MESSAGE_TEXT_SIZE: f32 = 22.0;
const LINE_SPACING: f32 = 1.25;
const INSET: f32 = 0.97;

pub const CONTROLS_MESSAGE: [&str; 6] = [
    "CONTROLS:",
    "WASD: MOVE CHARACTER",
    "F: TOGGLE TIP_CAM",
    "1234567: TOGGLE LEVERS ON FIRST ROOM",
    "2345: CHANGE CHAIR AND WALL PUZZLE POSITION ON SECOND ROOM",
    "ESC: QUIT GAME",
];

pub const FINISHED_MESSAGE: [&str; 3] = [
    "CONGRATULATIONS!",
    "YOU'VE FINISHED THE GAME",
    "Press ESC to close this window",
];

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    /// Anchor point in normalized device coordinates, y up.
    pub ndc: Vec2,
    pub anchor: Align2,
    /// Vertical shift in lines, for multi-line blocks.
    pub line_offset: f32,
    pub size: f32,
    pub color: Color32,
}

impl OverlayText {
    fn hud(text: impl Into<String>, ndc: Vec2, anchor: Align2) -> Self {
        Self { text: text.into(), ndc, anchor, line_offset: 0.0, size: HUD_TEXT_SIZE, color: Color32::BLACK }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    /// Dim the scene behind a full-screen message.
    pub backdrop: bool,
    pub texts: Vec<OverlayText>,
}

pub fn ndc_to_screen(ndc: Vec2, rect: egui::Rect) -> egui::Pos2 {
    egui::pos2(
        rect.left() + (ndc.x + 1.0) * 0.5 * rect.width(),
        rect.top() + (1.0 - ndc.y) * 0.5 * rect.height(),
    )
}

/// Lines centered on the screen, first line on top.
pub fn message_lines(lines: &[&str]) -> Vec<OverlayText> {
    let middle = (lines.len() as f32 - 1.0) * 0.5;
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| OverlayText {
            text: line.to_string(),
            ndc: Vec2::ZERO,
            anchor: Align2::CENTER_CENTER,
            line_offset: i as f32 - middle,
            size: MESSAGE_TEXT_SIZE,
            color: Color32::WHITE,
        })
        .collect()
}

pub fn layout_texts(session: &GameSession, fps_label: &str) -> OverlayFrame {
    match session.screen() {
        Screen::Controls => OverlayFrame { backdrop: true, texts: message_lines(&CONTROLS_MESSAGE) },
        Screen::Finished => OverlayFrame { backdrop: true, texts: message_lines(&FINISHED_MESSAGE) },
        Screen::Playing => {
            let mut texts = Vec::new();
            if session.show_info() {
                texts.push(OverlayText::hud(
                    "Press Space to Open Controls Window",
                    Vec2::new(-INSET, -INSET),
                    Align2::LEFT_BOTTOM,
                ));
                let euler = session.euler();
                texts.push(OverlayText::hud(
                    format!("Euler Angles rotation matrix = Z({:.2})*Y({:.2})*X({:.2})", euler.z, euler.y, euler.x),
                    Vec2::new(-INSET, INSET),
                    Align2::LEFT_TOP,
                ));
                texts.push(OverlayText::hud(
                    session.camera().projection.label(),
                    Vec2::new(INSET, -INSET),
                    Align2::RIGHT_BOTTOM,
                ));
                texts.push(OverlayText::hud(fps_label, Vec2::new(INSET, INSET), Align2::RIGHT_TOP));
            }
            OverlayFrame { backdrop: false, texts }
        }
    }
}

fn paint_frame(ctx: &egui::Context, frame: &OverlayFrame) {
    let rect = ctx.available_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::TOP, egui::Id::new("overlay")));
    if frame.backdrop {
        painter.rect_filled(rect, 0.0, Color32::from_black_alpha(170));
    }
    for text in &frame.texts {
        let pos = ndc_to_screen(text.ndc, rect) + egui::vec2(0.0, text.line_offset * text.size * LINE_SPACING);
        painter.text(pos, text.anchor, &text.text, egui::FontId::monospace(text.size), text.color);
    }
}

pub struct TextOverlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl TextOverlay {
    pub fn new(window: &Window, gpu: &GpuContext) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(ctx.clone(), egui::ViewportId::ROOT, window, None, None, None);
        let renderer = egui_wgpu::Renderer::new(&gpu.device, gpu.format, egui_wgpu::RendererOptions::default());
        Self { ctx, state, renderer }
    }

    /// Keeps egui's view of the window (size, scale) current.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) {
        let _ = self.state.on_window_event(window, event);
    }

    /// Records an overlay pass that loads, not clears, the target.
    pub fn encode(
        &mut self,
        window: &Window,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: &OverlayFrame,
    ) {
        let raw_input = self.state.take_egui_input(window);
        let output = self.ctx.run(raw_input, |ctx| paint_frame(ctx, frame));
        self.state.handle_platform_output(window, output.platform_output);

        let pixels_per_point = window.scale_factor() as f32;
        let primitives = self.ctx.tessellate(output.shapes, pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point,
        };

        for (id, image_delta) in &output.textures_delta.set {
            self.renderer.update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        self.renderer.update_buffers(&gpu.device, &gpu.queue, encoder, &primitives, &screen_descriptor);

        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer.render(&mut pass.forget_lifetime(), &primitives, &screen_descriptor);
        }

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::controller::GameAction;

    fn session() -> GameSession {
        GameSession::new(GameConfig::default(), 800, 800)
    }

    #[test]
    fn test_ndc_to_screen_corners() {
        let rect = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(800.0, 600.0));
        assert_eq!(ndc_to_screen(Vec2::new(-1.0, 1.0), rect), egui::pos2(0.0, 0.0));
        assert_eq!(ndc_to_screen(Vec2::new(1.0, -1.0), rect), egui::pos2(800.0, 600.0));
        assert_eq!(ndc_to_screen(Vec2::ZERO, rect), egui::pos2(400.0, 300.0));
    }

    #[test]
    fn test_hud_with_info() {
        let frame = layout_texts(&session(), "59.94 fps");
        assert!(!frame.backdrop);
        let texts: Vec<&str> = frame.texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts[0], "Press Space to Open Controls Window");
        assert!(texts.contains(&"Perspective"));
        assert!(texts.contains(&"59.94 fps"));
        assert!(texts.iter().any(|t| t.starts_with("Euler Angles rotation matrix = Z(0.00)")));
    }

    #[test]
    fn test_hud_hidden_without_info() {
        let mut s = session();
        s.handle_action(GameAction::ToggleInfo);
        let frame = layout_texts(&s, "59.94 fps");
        assert!(!frame.backdrop);
        assert!(frame.texts.is_empty());
        s.handle_action(GameAction::ToggleInfo);
        assert_eq!(layout_texts(&s, "59.94 fps").texts.len(), 4);
    }

    #[test]
    fn test_fps_placeholder_before_first_sample() {
        let label = crate::controller::FpsCounter::new(1.0).label();
        let frame = layout_texts(&session(), &label);
        let fps = frame.texts.iter().find(|t| t.anchor == Align2::RIGHT_TOP);
        assert_eq!(fps.map(|t| t.text.as_str()), Some("?? fps"));
    }

    #[test]
    fn test_projection_label_follows_camera() {
        let mut s = session();
        s.handle_action(GameAction::SelectOrthographic);
        let frame = layout_texts(&s, "?? fps");
        assert!(frame.texts.iter().any(|t| t.text == "Orthographic"));
    }

    #[test]
    fn test_controls_screen_message() {
        let mut s = session();
        s.handle_action(GameAction::ToggleControls);
        let frame = layout_texts(&s, "60.00 fps");
        assert!(frame.backdrop);
        assert_eq!(frame.texts.len(), CONTROLS_MESSAGE.len());
        assert_eq!(frame.texts[0].text, "CONTROLS:");
    }

    #[test]
    fn test_message_lines_centered() {
        let lines = message_lines(&FINISHED_MESSAGE);
        let offsets: Vec<f32> = lines.iter().map(|l| l.line_offset).collect();
        assert_eq!(offsets, vec![-1.0, 0.0, 1.0]);
        assert!(lines.iter().all(|l| l.ndc == Vec2::ZERO && l.anchor == Align2::CENTER_CENTER));
    }
}
