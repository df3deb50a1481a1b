use crate::foundation::error::{ReelError, ReelResult};

/// 0-based frame index; equal to the slice index along the cube's last axis.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Index as `usize` for array access.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::validation("fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::validation("fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration in seconds of `frames` frames.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * f64::from(self.den) / f64::from(self.num)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 10, den: 1 }
    }
}

impl std::str::FromStr for Fps {
    type Err = ReelError;

    /// Parse `"10"` or `"30000/1001"`.
    fn from_str(s: &str) -> ReelResult<Self> {
        let bad = || ReelError::validation(format!("invalid fps '{s}'"));
        match s.split_once('/') {
            Some((num, den)) => Fps::new(
                num.trim().parse().map_err(|_| bad())?,
                den.trim().parse().map_err(|_| bad())?,
            ),
            None => Fps::new(s.trim().parse().map_err(|_| bad())?, 1),
        }
    }
}

/// Declarative display bounds for one panel. Values outside are clipped, never rejected.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorScale {
    /// Value mapped to the bottom of the colormap.
    pub min: f32,
    /// Value mapped to the top of the colormap.
    pub max: f32,
}

impl ColorScale {
    /// Create a validated scale with finite bounds and `min < max`.
    pub fn new(min: f32, max: f32) -> ReelResult<Self> {
        let scale = Self { min, max };
        scale.validate()?;
        Ok(scale)
    }

    /// Check that bounds are finite and `min < max`.
    pub fn validate(&self) -> ReelResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ReelError::validation("color scale bounds must be finite"));
        }
        if self.min >= self.max {
            return Err(ReelError::validation(format!(
                "color scale min ({}) must be < max ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Map `v` into `[0, 1]`, clipping out-of-range values. NaN stays NaN.
    pub fn normalize(&self, v: f32) -> f32 {
        if v.is_nan() {
            return f32::NAN;
        }
        ((v - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Number of decimal digits needed to print `n`.
pub(crate) fn decimal_digits(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
