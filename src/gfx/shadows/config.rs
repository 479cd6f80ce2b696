//! Cascade configuration
//!
//! [`CascadeConfig`] is an immutable value handed to
//! [`CascadePlanner::initialize`](super::CascadePlanner::initialize). Changing
//! any field means building a new value and re-initializing; the planner never
//! patches its configuration in place.

use cgmath::{InnerSpace, Vector3};

use super::error::ConfigError;
use super::fitting::FitStrategy;
use super::MAX_CASCADES;

/// Parameters that shape the cascade set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeConfig {
    /// Number of frustum slices, 1 to [`MAX_CASCADES`]
    pub split_count: usize,
    /// Blend between uniform (0.0) and logarithmic (1.0) split depths
    pub lambda: f32,
    /// World units the light-space near plane is pulled towards the light
    pub near_offset: f32,
    /// Edge length of each square shadow-map layer in texels
    pub shadow_map_resolution: u32,
    /// Use sphere-bounded, texel-snapped fitting instead of a tight box
    pub stable: bool,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            split_count: 4,
            lambda: 0.3,
            near_offset: 250.0,
            shadow_map_resolution: 2048,
            stable: false,
        }
    }
}

impl CascadeConfig {
    pub fn with_split_count(mut self, split_count: usize) -> Self {
        self.split_count = split_count;
        self
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_near_offset(mut self, near_offset: f32) -> Self {
        self.near_offset = near_offset;
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.shadow_map_resolution = resolution;
        self
    }

    pub fn with_stable(mut self, stable: bool) -> Self {
        self.stable = stable;
        self
    }

    /// Checks every field against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.split_count == 0 || self.split_count > MAX_CASCADES {
            return Err(ConfigError::InvalidSplitCount(self.split_count));
        }
        if !(0.0..=1.0).contains(&self.lambda) {
            return Err(ConfigError::InvalidLambda(self.lambda));
        }
        if !self.near_offset.is_finite() || self.near_offset < 0.0 {
            return Err(ConfigError::InvalidNearOffset(self.near_offset));
        }
        if !self.shadow_map_resolution.is_power_of_two() {
            return Err(ConfigError::InvalidResolution(self.shadow_map_resolution));
        }
        Ok(())
    }

    /// Bounding-volume strategy selected by `stable`.
    pub fn fit_strategy(&self) -> FitStrategy {
        if self.stable {
            FitStrategy::Stable {
                resolution: self.shadow_map_resolution,
            }
        } else {
            FitStrategy::Tight
        }
    }
}

/// Render target size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidViewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Normalizes a light direction, rejecting zero-length and non-finite input.
pub fn normalize_light_direction(direction: Vector3<f32>) -> Result<Vector3<f32>, ConfigError> {
    let length = direction.magnitude();
    if !length.is_finite() || length <= f32::EPSILON {
        return Err(ConfigError::DegenerateLightDirection);
    }
    Ok(direction / length)
}
