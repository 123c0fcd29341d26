//! Avatar geometry as pure functions of the frame counter.
//!
//! Nothing in here holds state: the same `(frame, size, active)` always yields
//! the same [`AvatarPose`].

use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    Small,
    #[default]
    Medium,
    Large,
}

impl SizePreset {
    /// Square canvas edge in pixels.
    pub fn pixels(&self) -> u32 {
        match self {
            SizePreset::Small => 80,
            SizePreset::Medium => 120,
            SizePreset::Large => 160,
        }
    }

    pub fn scale(&self) -> f64 {
        match self {
            SizePreset::Small => 0.6,
            SizePreset::Medium => 0.8,
            SizePreset::Large => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessory {
    Stethoscope,
    Coat,
    Cap,
    Badge,
    Glasses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub name: &'static str,
    pub skin_tone: &'static str,
    pub hair_color: &'static str,
    pub eye_color: &'static str,
    pub background_color: &'static str,
    pub accessories: &'static [Accessory],
}

const DOCTOR: Persona = Persona {
    name: "Dr. Aarogya",
    skin_tone: "#fdbcb4",
    hair_color: "#4a4a4a",
    eye_color: "#2d3748",
    background_color: "#3b82f6",
    accessories: &[Accessory::Stethoscope, Accessory::Coat],
};

const NURSE: Persona = Persona {
    name: "Nurse Priya",
    skin_tone: "#f7d794",
    hair_color: "#8b4513",
    eye_color: "#2d3748",
    background_color: "#10b981",
    accessories: &[Accessory::Cap, Accessory::Badge],
};

const SPECIALIST: Persona = Persona {
    name: "Dr. Specialist",
    skin_tone: "#deb887",
    hair_color: "#2f4f4f",
    eye_color: "#2d3748",
    background_color: "#8b5cf6",
    accessories: &[Accessory::Glasses, Accessory::Coat],
};

impl Persona {
    pub fn for_agent(agent: AgentKind) -> &'static Persona {
        match agent {
            AgentKind::Doctor => &DOCTOR,
            AgentKind::Nurse => &NURSE,
            AgentKind::Specialist => &SPECIALIST,
        }
    }

    pub fn has(&self, accessory: Accessory) -> bool {
        self.accessories.contains(&accessory)
    }
}

/// Rates and amplitudes of the periodic motions, in unscaled pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionConfig {
    pub pulse_base_radius: f64,
    pub pulse_amplitude: f64,
    pub pulse_rate: f64,
    pub eye_radius: f64,
    pub min_eye_radius: f64,
    pub blink_rate: f64,
    pub blink_threshold: f64,
    pub blink_compression: f64,
    pub mouth_half_width: f64,
    pub mouth_base_height: f64,
    pub mouth_amplitude: f64,
    pub mouth_rate: f64,
    pub glasses_amplitude: f64,
    pub glasses_rate: f64,
    pub dot_rate: f64,
    pub dot_phase_step: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            pulse_base_radius: 45.0,
            pulse_amplitude: 0.1,
            pulse_rate: 0.3,
            eye_radius: 2.0,
            min_eye_radius: 0.1,
            blink_rate: 2.0,
            blink_threshold: 0.9,
            blink_compression: 1.5,
            mouth_half_width: 6.0,
            mouth_base_height: 3.0,
            mouth_amplitude: 0.2,
            mouth_rate: 1.5,
            glasses_amplitude: 0.5,
            glasses_rate: 0.5,
            dot_rate: 0.8,
            dot_phase_step: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mouth {
    /// Lower half-ellipse while the agent is speaking.
    Talking { half_width: f64, height: f64 },
    /// Fixed smile arc, raised by one unit.
    Neutral { radius: f64, lift: f64 },
}

/// Every animated quantity of one frame, already multiplied by the size scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarPose {
    /// `None` when the pulse halo is hidden.
    pub pulse_radius: Option<f64>,
    pub eye_vertical_radius: f64,
    /// Downward shift of the eyes so a blink closes towards the lower lid.
    pub eye_drop: f64,
    pub blinking: bool,
    pub mouth: Mouth,
    pub glasses_offset: f64,
    /// Opacity of the three activity dots; `None` when idle.
    pub activity_dots: Option<[f64; 3]>,
}

impl AvatarPose {
    pub fn compute(frame: f64, scale: f64, active: bool, show_pulse: bool, motion: &MotionConfig) -> Self {
        let pulse_radius = (show_pulse && active).then(|| {
            motion.pulse_base_radius
                * scale
                * (1.0 + (frame * motion.pulse_rate).sin() * motion.pulse_amplitude)
        });

        let blinking = active && (frame * motion.blink_rate).sin() > motion.blink_threshold;
        let compression = if blinking {
            motion.blink_compression * scale
        } else {
            0.0
        };
        let eye_vertical_radius =
            (motion.min_eye_radius * scale).max(motion.eye_radius * scale - compression);

        let mouth = if active {
            Mouth::Talking {
                half_width: motion.mouth_half_width * scale,
                height: (motion.mouth_base_height
                    + (frame * motion.mouth_rate).sin() * motion.mouth_amplitude)
                    * scale,
            }
        } else {
            Mouth::Neutral {
                radius: motion.mouth_half_width * scale,
                lift: scale,
            }
        };

        let glasses_offset = if active {
            (frame * motion.glasses_rate).sin() * motion.glasses_amplitude * scale
        } else {
            0.0
        };

        let activity_dots = active.then(|| {
            let mut dots = [0.0; 3];
            for (i, dot) in dots.iter_mut().enumerate() {
                let phase = frame * motion.dot_rate + i as f64 * motion.dot_phase_step;
                *dot = (phase.sin() + 1.0) / 2.0;
            }
            dots
        });

        Self {
            pulse_radius,
            eye_vertical_radius,
            eye_drop: compression / 2.0,
            blinking,
            mouth,
            glasses_offset,
            activity_dots,
        }
    }
}
