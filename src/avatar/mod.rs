//! The animated agent figure shown during a session.

pub mod animation;
pub mod draw;
pub mod pose;

pub use animation::AnimationLoop;
pub use draw::{draw_avatar, AvatarFrame, Canvas, CommandRecorder, DrawCommand};
pub use pose::{AvatarPose, MotionConfig, Persona, SizePreset};
