//! Perceptual colormaps sampled by linear interpolation between fixed anchors.

/// Colormap used for a heatmap and its colorbar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Viridis,
    Magma,
    Gray,
}

const VIRIDIS: [[u8; 3]; 10] = [
    [0x44, 0x01, 0x54],
    [0x48, 0x28, 0x78],
    [0x3E, 0x4A, 0x89],
    [0x31, 0x68, 0x8E],
    [0x26, 0x82, 0x8E],
    [0x1F, 0x9E, 0x89],
    [0x35, 0xB7, 0x79],
    [0x6D, 0xCD, 0x59],
    [0xB4, 0xDE, 0x2C],
    [0xFD, 0xE7, 0x25],
];

const MAGMA: [[u8; 3]; 10] = [
    [0x00, 0x00, 0x04],
    [0x18, 0x0F, 0x3E],
    [0x45, 0x10, 0x77],
    [0x72, 0x1F, 0x81],
    [0x9F, 0x2F, 0x7F],
    [0xCD, 0x40, 0x71],
    [0xF1, 0x60, 0x5D],
    [0xFD, 0x95, 0x67],
    [0xFE, 0xC9, 0x8D],
    [0xFC, 0xFD, 0xBF],
];

const GRAY: [[u8; 3]; 2] = [[0, 0, 0], [255, 255, 255]];

impl Colormap {
    fn anchors(self) -> &'static [[u8; 3]] {
        match self {
            Self::Viridis => &VIRIDIS,
            Self::Magma => &MAGMA,
            Self::Gray => &GRAY,
        }
    }

    /// RGB at normalized position `t`, clamped to `[0, 1]`. NaN maps to the low end.
    pub fn sample(self, t: f32) -> [u8; 3] {
        let anchors = self.anchors();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (anchors.len() - 1) as f32;
        let i = (pos.floor() as usize).min(anchors.len() - 2);
        let frac = pos - i as f32;
        let (a, b) = (anchors[i], anchors[i + 1]);
        let lerp = |x: u8, y: u8| -> u8 {
            (f32::from(x) + (f32::from(y) - f32::from(x)) * frac).round() as u8
        };
        [lerp(a[0], b[0]), lerp(a[1], b[1]), lerp(a[2], b[2])]
    }

    /// 256-entry lookup table for fast per-pixel mapping.
    pub fn lut(self) -> [[u8; 3]; 256] {
        let mut out = [[0u8; 3]; 256];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.sample(i as f32 / 255.0);
        }
        out
    }
}

impl std::str::FromStr for Colormap {
    type Err = crate::foundation::error::ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "viridis" => Ok(Self::Viridis),
            "magma" => Ok(Self::Magma),
            "gray" | "grey" => Ok(Self::Gray),
            other => Err(crate::foundation::error::ReelError::validation(format!(
                "unknown colormap '{other}' (expected viridis, magma or gray)"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/colormap.rs"]
mod tests;
