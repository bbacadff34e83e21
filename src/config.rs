// Runtime tuning for the carousel and lightbox.
// Every value has a default and can be overridden through a FOLIO_* variable;
// invalid overrides are logged and ignored.

use thiserror::Error;

use crate::carousel::fade::DEFAULT_FADE_EPSILON;

const DEFAULT_STEP_RATIO: f64 = 0.85;
const DEFAULT_MIN_STEP: f64 = 320.0;
const DEFAULT_DRAG_ELASTIC: f64 = 0.06;
const DEFAULT_TAP_THRESHOLD: f64 = 6.0;
const DEFAULT_SPRING_STIFFNESS: f64 = 200.0;
const DEFAULT_SPRING_DAMPING: f64 = 26.0;
const DEFAULT_SPRING_MASS: f64 = 1.0;
const DEFAULT_SLIDE_HEIGHT: i32 = 240;
const DEFAULT_SLIDE_ASPECT: f64 = 2.5;
const DEFAULT_SLIDE_GAP: i32 = 12;
const DEFAULT_TEXTURE_CACHE: usize = 64;
/// Fixed integration step for the settle spring, in seconds.
pub const SPRING_SUBSTEP: f64 = 1.0 / 240.0;
/// Longest edge for slide thumbnails.
pub const SLIDE_DECODE_EDGE: u32 = 1024;
/// Longest edge for the enlarged lightbox image.
pub const LIGHTBOX_DECODE_EDGE: u32 = 2560;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },
    #[error(
        "spring (stiffness {stiffness}, damping {damping}, mass {mass}) is too stiff to settle"
    )]
    UnstableSpring {
        stiffness: f64,
        damping: f64,
        mass: f64,
    },
}

/// Spring parameters for the settle animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl SpringConfig {
    /// Whether stepping this spring at [`SPRING_SUBSTEP`] converges.
    ///
    /// Semi-implicit Euler is stable for `k/m * h^2 + 2 * d/m * h < 4` with
    /// `d/m * h < 2`. Both terms are capped at 1 here.
    pub fn is_stable(&self) -> bool {
        let h = SPRING_SUBSTEP;
        let stiffness_term = self.stiffness / self.mass * h * h;
        let damping_term = self.damping / self.mass * h;
        stiffness_term <= 1.0 && damping_term <= 1.0
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: DEFAULT_SPRING_STIFFNESS,
            damping: DEFAULT_SPRING_DAMPING,
            mass: DEFAULT_SPRING_MASS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarouselConfig {
    /// Step size as a fraction of the viewport width.
    pub step_ratio: f64,
    /// Lower bound for a single step in pixels.
    pub min_step: f64,
    /// Fraction of the overrun applied while dragging past an edge.
    pub drag_elastic: f64,
    /// Edge-fade tolerance in pixels.
    pub fade_epsilon: f64,
    /// Manhattan distance above which a press is treated as a drag.
    pub tap_threshold: f64,
    pub spring: SpringConfig,
    pub slide_height: i32,
    /// Slide width divided by slide height.
    pub slide_aspect: f64,
    pub slide_gap: i32,
    /// Number of decoded textures kept around.
    pub texture_cache_entries: usize,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            step_ratio: DEFAULT_STEP_RATIO,
            min_step: DEFAULT_MIN_STEP,
            drag_elastic: DEFAULT_DRAG_ELASTIC,
            fade_epsilon: DEFAULT_FADE_EPSILON,
            tap_threshold: DEFAULT_TAP_THRESHOLD,
            spring: SpringConfig::default(),
            slide_height: DEFAULT_SLIDE_HEIGHT,
            slide_aspect: DEFAULT_SLIDE_ASPECT,
            slide_gap: DEFAULT_SLIDE_GAP,
            texture_cache_entries: DEFAULT_TEXTURE_CACHE,
        }
    }
}

fn env_f64(name: &str) -> Option<f64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            tracing::warn!(variable = name, value = %raw, "Ignoring non-numeric override");
            None
        }
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name })
    }
}

fn apply_override<F>(config: &mut CarouselConfig, name: &str, update: F)
where
    F: Fn(&mut CarouselConfig, f64),
{
    let Some(value) = env_f64(name) else {
        return;
    };
    let mut candidate = config.clone();
    update(&mut candidate, value);
    match candidate.validate() {
        Ok(()) => *config = candidate,
        Err(err) => tracing::warn!(variable = name, error = %err, "Ignoring override"),
    }
}

impl CarouselConfig {
    /// Step distance for a given viewport width.
    pub fn step_amount(&self, viewport_extent: f64) -> f64 {
        let viewport = crate::carousel::bounds::sanitize_extent(viewport_extent);
        (viewport * self.step_ratio).max(self.min_step)
    }

    /// Width of a single slide in pixels.
    pub fn slide_width(&self) -> i32 {
        ((self.slide_height as f64) * self.slide_aspect).round().max(1.0) as i32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("step_ratio", self.step_ratio, 0.05, 1.0)?;
        check_range("min_step", self.min_step, 0.0, 10_000.0)?;
        check_range("drag_elastic", self.drag_elastic, 0.0, 0.5)?;
        check_range("fade_epsilon", self.fade_epsilon, 0.0, 64.0)?;
        check_range("tap_threshold", self.tap_threshold, 0.0, 64.0)?;
        check_positive("spring.stiffness", self.spring.stiffness)?;
        check_positive("spring.damping", self.spring.damping)?;
        check_positive("spring.mass", self.spring.mass)?;
        if !self.spring.is_stable() {
            let SpringConfig {
                stiffness,
                damping,
                mass,
            } = self.spring;
            return Err(ConfigError::UnstableSpring {
                stiffness,
                damping,
                mass,
            });
        }
        check_range("slide_height", self.slide_height as f64, 48.0, 2048.0)?;
        check_positive("slide_aspect", self.slide_aspect)?;
        check_range("slide_gap", self.slide_gap as f64, 0.0, 256.0)?;
        check_positive("texture_cache_entries", self.texture_cache_entries as f64)?;
        Ok(())
    }

    /// Defaults with any valid FOLIO_* overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Each override is checked on its own so one bad value does not
        // discard the others.
        apply_override(&mut config, "FOLIO_STEP_RATIO", |c, v| c.step_ratio = v);
        apply_override(&mut config, "FOLIO_MIN_STEP", |c, v| c.min_step = v);
        apply_override(&mut config, "FOLIO_DRAG_ELASTIC", |c, v| c.drag_elastic = v);
        apply_override(&mut config, "FOLIO_FADE_EPSILON", |c, v| c.fade_epsilon = v);
        apply_override(&mut config, "FOLIO_TAP_THRESHOLD", |c, v| c.tap_threshold = v);
        apply_override(&mut config, "FOLIO_SPRING_STIFFNESS", |c, v| {
            c.spring.stiffness = v
        });
        apply_override(&mut config, "FOLIO_SPRING_DAMPING", |c, v| c.spring.damping = v);
        apply_override(&mut config, "FOLIO_SLIDE_HEIGHT", |c, v| {
            c.slide_height = v.round() as i32
        });
        apply_override(&mut config, "FOLIO_TEXTURE_CACHE", |c, v| {
            c.texture_cache_entries = v.max(0.0).round() as usize
        });

        config
    }
}
