use crate::foundation::error::{StageError, StageResult};

/// Viewport dimensions in CSS pixels, read once at scene construction.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> StageResult<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(StageError::validation(
                "viewport dimensions must be finite and > 0",
            ));
        }
        Ok(Self { width, height })
    }

    pub fn center(&self) -> kurbo::Point {
        kurbo::Point::new(self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Coarse device class used to pick timing constants and preload
/// aggressiveness. Constrained profiles assume autoplay restrictions and
/// native player chrome that needs masking for longer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DeviceClass {
    Constrained,
    Standard,
}

/// Width cutoff below which a viewport classifies as constrained.
///
/// Observed deployments disagreed on the exact value, so it is configuration
/// rather than a constant.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub constrained_max_width: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            constrained_max_width: 480.0,
        }
    }
}

/// Read-only device/viewport classification handed to components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceProfile {
    pub class: DeviceClass,
    pub orientation: Orientation,
}

impl DeviceProfile {
    pub fn classify(viewport: Viewport, config: &ClassifierConfig) -> Self {
        let class = if viewport.width < config.constrained_max_width {
            DeviceClass::Constrained
        } else {
            DeviceClass::Standard
        };
        let orientation = if viewport.width > viewport.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        Self { class, orientation }
    }

    pub fn is_constrained(&self) -> bool {
        self.class == DeviceClass::Constrained
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/device.rs"]
mod tests;
