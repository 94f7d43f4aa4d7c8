//! Effect tunables.
//!
//! Every constant the effect relies on lives here with its default. Hosts can
//! override a subset per container through `data-*` attributes, see
//! [`EffectConfig::OVERRIDE_KEYS`].

use log::warn;

use crate::error::EffectError;
use crate::velocity::MIN_DELTA_MS;

#[derive(Clone, Debug, PartialEq)]
pub struct FlowmapConfig {
    /// Side length of the square simulation target in texels.
    pub size: u32,
    /// Radius of the pointer stamp in texture space.
    pub falloff: f32,
    pub alpha: f32,
    /// Per-tick multiplier applied to the previous trail.
    pub dissipation: f32,
    /// Horizontal stretch of the stamp.
    pub aspect: f32,
}

impl Default for FlowmapConfig {
    fn default() -> Self {
        Self {
            size: 128,
            falloff: 0.3,
            alpha: 1.0,
            dissipation: 0.98,
            aspect: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectConfig {
    /// How far the flow displaces the sampling coordinate.
    pub strength: f32,
    pub min_delta_ms: f64,
    pub velocity_attack: f32,
    pub velocity_release: f32,
    pub device_pixel_ratio: f64,
    pub flowmap: FlowmapConfig,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            strength: 0.12,
            min_delta_ms: MIN_DELTA_MS,
            velocity_attack: 0.15,
            velocity_release: 0.10,
            device_pixel_ratio: 1.0,
            flowmap: FlowmapConfig::default(),
        }
    }
}

impl EffectConfig {
    pub const OVERRIDE_KEYS: [&'static str; 8] = [
        "strength",
        "falloff",
        "dissipation",
        "alpha",
        "attack",
        "release",
        "dpr",
        "flowmap-size",
    ];

    /// Apply a single override. Returns `Ok(false)` for keys this config does
    /// not know about.
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<bool, EffectError> {
        let invalid = || EffectError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        };
        let ranged = |lo: f64, hi: f64| -> Result<f64, EffectError> {
            let parsed: f64 = value.trim().parse().map_err(|_| invalid())?;
            if parsed.is_finite() && parsed >= lo && parsed <= hi {
                Ok(parsed)
            } else {
                Err(invalid())
            }
        };

        match key {
            "strength" => self.strength = ranged(0.0, 1.0)? as f32,
            "falloff" => {
                let falloff = ranged(0.0, 2.0)?;
                if falloff == 0.0 {
                    return Err(invalid());
                }
                self.flowmap.falloff = falloff as f32;
            }
            "dissipation" => self.flowmap.dissipation = ranged(0.0, 1.0)? as f32,
            "alpha" => self.flowmap.alpha = ranged(0.0, 1.0)? as f32,
            "attack" => self.velocity_attack = ranged(0.0, 1.0)? as f32,
            "release" => self.velocity_release = ranged(0.0, 1.0)? as f32,
            "dpr" => {
                let dpr = ranged(0.0, 8.0)?;
                if dpr == 0.0 {
                    return Err(invalid());
                }
                self.device_pixel_ratio = dpr;
            }
            "flowmap-size" => {
                let size: u32 = value.trim().parse().map_err(|_| invalid())?;
                if !(1..=1024).contains(&size) {
                    return Err(invalid());
                }
                self.flowmap.size = size;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Apply every pair, keeping the default for anything rejected.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut applied = 0;
        for (key, value) in overrides {
            match self.apply_override(key, value) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(err) => warn!("ignoring setting: {err}"),
            }
        }
        applied
    }
}
