use std::f64::consts::{PI, TAU};

use super::pose::{Accessory, AvatarPose, Mouth, MotionConfig, Persona, SizePreset};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub hex: &'static str,
    pub alpha: f64,
}

impl Color {
    pub const fn solid(hex: &'static str) -> Self {
        Self { hex, alpha: 1.0 }
    }

    pub const fn translucent(hex: &'static str, alpha: f64) -> Self {
        Self { hex, alpha }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Arc from `start` to `end` radians; a full turn is a circle.
    Arc {
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        end: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        start: f64,
        end: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Fill(Color),
    Stroke { color: Color, width: f64 },
    /// Radial gradient from the shape's centre outwards.
    Gradient { inner: Color, outer: Color },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub shape: Shape,
    pub paint: Paint,
    /// Layer opacity applied on top of the paint's own alpha.
    pub opacity: f64,
}

/// A 2D surface the avatar is drawn onto. Drawing never reads back.
pub trait Canvas {
    fn clear(&mut self, width: u32, height: u32);

    fn draw(&mut self, command: DrawCommand);
}

/// Keeps every command instead of rasterising.
#[derive(Debug, Default, Clone)]
pub struct CommandRecorder {
    pub size: (u32, u32),
    pub commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Canvas for CommandRecorder {
    fn clear(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.commands.clear();
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

/// What to draw for one animation frame.
#[derive(Debug, Clone, Copy)]
pub struct AvatarFrame<'a> {
    pub persona: &'a Persona,
    pub size: SizePreset,
    pub frame: f64,
    pub active: bool,
    pub show_pulse: bool,
}

const MOUTH_COLOR: Color = Color::solid("#8b4513");

struct Painter<'c, C: Canvas + ?Sized> {
    canvas: &'c mut C,
    cx: f64,
    cy: f64,
    scale: f64,
}

impl<C: Canvas + ?Sized> Painter<'_, C> {
    fn put(&mut self, shape: Shape, paint: Paint) {
        self.put_with_opacity(shape, paint, 1.0);
    }

    fn put_with_opacity(&mut self, shape: Shape, paint: Paint, opacity: f64) {
        self.canvas.draw(DrawCommand {
            shape,
            paint,
            opacity,
        });
    }

    /// Arc relative to the centre, in unscaled units.
    fn arc(&self, dx: f64, dy: f64, radius: f64, start: f64, end: f64) -> Shape {
        Shape::Arc {
            cx: self.cx + dx * self.scale,
            cy: self.cy + dy * self.scale,
            radius: radius * self.scale,
            start,
            end,
        }
    }

    fn rect(&self, dx: f64, dy: f64, width: f64, height: f64) -> Shape {
        Shape::Rect {
            x: self.cx + dx * self.scale,
            y: self.cy + dy * self.scale,
            width: width * self.scale,
            height: height * self.scale,
        }
    }

    fn line(&self, dx1: f64, dy1: f64, dx2: f64, dy2: f64) -> Shape {
        Shape::Line {
            x1: self.cx + dx1 * self.scale,
            y1: self.cy + dy1 * self.scale,
            x2: self.cx + dx2 * self.scale,
            y2: self.cy + dy2 * self.scale,
        }
    }

    fn stroke(&self, color: Color, width: f64) -> Paint {
        Paint::Stroke {
            color,
            width: width * self.scale,
        }
    }
}

/// Clears `canvas` and draws the avatar for `avatar.frame`.
pub fn draw_avatar<C: Canvas + ?Sized>(canvas: &mut C, avatar: &AvatarFrame<'_>, motion: &MotionConfig) -> AvatarPose {
    let pixels = avatar.size.pixels();
    canvas.clear(pixels, pixels);

    let scale = avatar.size.scale();
    let pose = AvatarPose::compute(avatar.frame, scale, avatar.active, avatar.show_pulse, motion);
    let persona = avatar.persona;
    let centre = f64::from(pixels) / 2.0;
    let mut p = Painter {
        canvas,
        cx: centre,
        cy: centre,
        scale,
    };

    if let Some(radius) = pose.pulse_radius {
        let halo = Shape::Arc {
            cx: p.cx,
            cy: p.cy,
            radius,
            start: 0.0,
            end: TAU,
        };
        p.put(
            halo,
            Paint::Gradient {
                inner: Color::translucent(persona.background_color, 0x30 as f64 / 255.0),
                outer: Color::translucent(persona.background_color, 0x10 as f64 / 255.0),
            },
        );
    }

    let face = p.arc(0.0, -2.0, 25.0, 0.0, TAU);
    p.put(face, Paint::Fill(Color::solid(persona.skin_tone)));
    let hair = p.arc(0.0, -18.0, 22.0, PI, TAU);
    p.put(hair, Paint::Fill(Color::solid(persona.hair_color)));

    for side in [-8.0, 8.0] {
        let eye = Shape::Ellipse {
            cx: p.cx + side * scale,
            cy: p.cy - 10.0 * scale + pose.eye_drop,
            rx: motion.eye_radius * scale,
            ry: pose.eye_vertical_radius,
            start: 0.0,
            end: TAU,
        };
        p.put(eye, Paint::Fill(Color::solid(persona.eye_color)));
    }

    let brow_paint = p.stroke(Color::solid(persona.hair_color), 1.5);
    let left_brow = p.line(-12.0, -15.0, -4.0, -13.0);
    let right_brow = p.line(4.0, -13.0, 12.0, -15.0);
    p.put(left_brow, brow_paint);
    p.put(right_brow, brow_paint);

    let nose_paint = p.stroke(Color::solid(persona.skin_tone), 1.0);
    let nose = p.line(0.0, -5.0, -1.0, -2.0);
    p.put(nose, nose_paint);

    let mouth_y = p.cy + 6.0 * scale;
    let mouth_paint = p.stroke(MOUTH_COLOR, 1.5);
    let mouth = match pose.mouth {
        Mouth::Talking { half_width, height } => Shape::Ellipse {
            cx: p.cx,
            cy: mouth_y,
            rx: half_width,
            ry: height,
            start: 0.0,
            end: PI,
        },
        Mouth::Neutral { radius, lift } => Shape::Arc {
            cx: p.cx,
            cy: mouth_y - lift,
            radius,
            start: 0.0,
            end: PI,
        },
    };
    p.put(mouth, mouth_paint);

    draw_accessories(&mut p, persona, &pose);

    if let Some(dots) = pose.activity_dots {
        for (i, opacity) in dots.into_iter().enumerate() {
            let dot = p.arc((i as f64 - 1.0) * 8.0, 35.0, 2.0, 0.0, TAU);
            p.put_with_opacity(dot, Paint::Fill(Color::solid(persona.background_color)), opacity);
        }
    }

    pose
}

fn draw_accessories<C: Canvas + ?Sized>(p: &mut Painter<'_, C>, persona: &Persona, pose: &AvatarPose) {
    if persona.has(Accessory::Stethoscope) {
        let paint = p.stroke(Color::solid("#666"), 2.0);
        let left = p.arc(-15.0, 25.0, 5.0, 0.0, TAU);
        let tube = p.line(-10.0, 25.0, 10.0, 25.0);
        let right = p.arc(15.0, 25.0, 5.0, 0.0, TAU);
        p.put(left, paint);
        p.put(tube, paint);
        p.put(right, paint);
    }

    if persona.has(Accessory::Cap) {
        let cap = Shape::Ellipse {
            cx: p.cx,
            cy: p.cy - 25.0 * p.scale,
            rx: 18.0 * p.scale,
            ry: 6.0 * p.scale,
            start: 0.0,
            end: TAU,
        };
        p.put(cap, Paint::Fill(Color::solid("#fff")));
        let cross = Paint::Fill(Color::solid("#dc2626"));
        let upright = p.rect(-1.5, -28.0, 3.0, 6.0);
        let bar = p.rect(-3.0, -26.5, 6.0, 3.0);
        p.put(upright, cross);
        p.put(bar, cross);
    }

    if persona.has(Accessory::Glasses) {
        let paint = p.stroke(Color::solid("#000"), 1.5);
        let lift = pose.glasses_offset / p.scale;
        let left = p.arc(-8.0, -10.0 + lift, 6.0, 0.0, TAU);
        let right = p.arc(8.0, -10.0 + lift, 6.0, 0.0, TAU);
        let bridge = p.line(-2.0, -10.0 + lift, 2.0, -10.0 + lift);
        p.put(left, paint);
        p.put(right, paint);
        p.put(bridge, paint);
    }

    let collar_color = if persona.has(Accessory::Cap) {
        "#e0f2fe"
    } else if persona.has(Accessory::Glasses) {
        "#f8f9fa"
    } else {
        "#fff"
    };
    let collar = p.rect(-18.0, 15.0, 36.0, 20.0);
    p.put(collar, Paint::Fill(Color::solid(collar_color)));

    if persona.has(Accessory::Stethoscope) {
        for i in 0..3 {
            let button = p.arc(0.0, 18.0 + f64::from(i) * 4.0, 1.0, 0.0, TAU);
            p.put(button, Paint::Fill(Color::solid("#333")));
        }
    }

    if persona.has(Accessory::Glasses) {
        let pocket_paint = p.stroke(Color::solid("#333"), 1.0);
        let pocket = p.rect(-8.0, 18.0, 16.0, 8.0);
        p.put(pocket, pocket_paint);
        let pen_paint = p.stroke(Color::solid("#1e40af"), 1.0);
        let pen = p.line(4.0, 18.0, 4.0, 22.0);
        p.put(pen, pen_paint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentKind;

    fn record(agent: AgentKind, active: bool, frame: f64) -> CommandRecorder {
        let mut canvas = CommandRecorder::new();
        let avatar = AvatarFrame {
            persona: Persona::for_agent(agent),
            size: SizePreset::Large,
            frame,
            active,
            show_pulse: true,
        };
        draw_avatar(&mut canvas, &avatar, &MotionConfig::default());
        canvas
    }

    #[test]
    fn canvas_matches_size_preset() {
        let canvas = record(AgentKind::Doctor, true, 0.0);
        assert_eq!(canvas.size, (160, 160));
        assert!(!canvas.is_empty());
    }

    #[test]
    fn idle_avatar_has_no_halo_or_dots() {
        let active = record(AgentKind::Doctor, true, 1.0);
        let idle = record(AgentKind::Doctor, false, 1.0);
        // halo + three dots
        assert_eq!(active.len(), idle.len() + 4);
        assert!(!idle
            .commands
            .iter()
            .any(|c| matches!(c.paint, Paint::Gradient { .. })));
    }

    #[test]
    fn redraw_replaces_previous_frame() {
        let mut canvas = record(AgentKind::Nurse, true, 0.0);
        let first = canvas.len();
        let avatar = AvatarFrame {
            persona: Persona::for_agent(AgentKind::Nurse),
            size: SizePreset::Large,
            frame: 0.1,
            active: true,
            show_pulse: true,
        };
        draw_avatar(&mut canvas, &avatar, &MotionConfig::default());
        assert_eq!(canvas.len(), first);
    }

    #[test]
    fn specialist_glasses_follow_the_frame() {
        let glasses_y = |frame: f64| {
            record(AgentKind::Specialist, true, frame)
                .commands
                .iter()
                .find_map(|c| match (c.shape, c.paint) {
                    (Shape::Line { y1, .. }, Paint::Stroke { color, .. }) if color.hex == "#000" => Some(y1),
                    _ => None,
                })
                .unwrap()
        };
        let rest = glasses_y(0.0);
        assert!((rest - 70.0).abs() < 1e-9);
        let raised = glasses_y(std::f64::consts::PI);
        assert!((raised - 70.5).abs() < 1e-9);
    }

    #[test]
    fn activity_dots_carry_opacity() {
        let canvas = record(AgentKind::Doctor, true, 0.0);
        let dot_opacities: Vec<f64> = canvas
            .commands
            .iter()
            .filter(|c| c.opacity < 1.0)
            .map(|c| c.opacity)
            .collect();
        assert_eq!(dot_opacities.len(), 3);
        assert!((dot_opacities[0] - 0.5).abs() < 1e-9);
    }
}
