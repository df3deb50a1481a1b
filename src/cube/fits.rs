//! Minimal FITS primary-HDU reader for spectral cubes.
//!
//! Only what a `(V, Y, X)` cube needs is supported: the primary header, big-endian image
//! data of any standard `BITPIX`, `BSCALE`/`BZERO`/`BLANK`, and the linear WCS keywords used
//! for axis labels. Extensions are ignored.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder};
use ndarray::{ArrayD, IxDyn};

use crate::cube::model::{AxisWcs, CoordinateMap, Cube};
use crate::foundation::error::{ReelError, ReelResult};

const BLOCK_LEN: usize = 2880;
const CARD_LEN: usize = 80;
const MAX_HEADER_BLOCKS: usize = 4096;
const MAX_NAXIS: i64 = 999;

/// Supplier of a cube plus its coordinate metadata.
pub trait CubeSource {
    /// Load the cube and its pixel-to-world mapping.
    fn load(&self) -> ReelResult<(Cube, CoordinateMap)>;
}

/// Cube already held in memory, for tests and programmatic callers.
#[derive(Clone, Debug)]
pub struct InMemorySource {
    cube: Cube,
    coords: CoordinateMap,
}

impl InMemorySource {
    /// Wrap an existing cube.
    pub fn new(cube: Cube, coords: CoordinateMap) -> Self {
        Self { cube, coords }
    }
}

impl CubeSource for InMemorySource {
    fn load(&self) -> ReelResult<(Cube, CoordinateMap)> {
        Ok((self.cube.clone(), self.coords.clone()))
    }
}

/// FITS file on disk whose primary HDU holds the cube.
#[derive(Clone, Debug)]
pub struct FitsSource {
    path: PathBuf,
}

impl FitsSource {
    /// Point at a FITS file. Nothing is read until [`CubeSource::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CubeSource for FitsSource {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> ReelResult<(Cube, CoordinateMap)> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReelError::NotFound(self.path.clone()));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("open cube '{}'", self.path.display()))
                    .into());
            }
        };

        let (data, header) = read_primary_hdu(BufReader::new(file))?;
        let coords = header.coordinate_map();
        let cube = Cube::new(data)?;
        tracing::info!(shape = ?cube.shape(), "loaded cube");
        Ok((cube, coords))
    }
}

/// Value of one header card.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    /// `T` / `F`.
    Logical(bool),
    /// Integer literal.
    Int(i64),
    /// Real literal (`E` or `D` exponent).
    Float(f64),
    /// Quoted string, trailing blanks removed.
    Str(String),
}

/// Parsed primary header: keyword/value cards in file order.
#[derive(Clone, Debug, Default)]
pub struct FitsHeader {
    cards: Vec<(String, HeaderValue)>,
}

impl FitsHeader {
    /// First value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.cards.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Numeric value of `key` (integers widen to `f64`).
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            HeaderValue::Int(v) => Some(*v as f64),
            HeaderValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value of `key`.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            HeaderValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// String value of `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            HeaderValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn require_i64(&self, key: &str) -> ReelResult<i64> {
        self.get_i64(key)
            .ok_or_else(|| ReelError::parse(format!("missing or non-integer {key} card")))
    }

    /// Linear WCS per cube axis. FITS axis 1 is X, 2 is Y, 3 is spectral.
    pub fn coordinate_map(&self) -> CoordinateMap {
        CoordinateMap {
            spectral: self.axis_wcs(3),
            y: self.axis_wcs(2),
            x: self.axis_wcs(1),
        }
    }

    fn axis_wcs(&self, n: usize) -> AxisWcs {
        let cdelt = self
            .get_f64(&format!("CDELT{n}"))
            .or_else(|| self.get_f64(&format!("CD{n}_{n}")))
            .unwrap_or(1.0);
        AxisWcs {
            ctype: self
                .get_str(&format!("CTYPE{n}"))
                .unwrap_or_default()
                .to_string(),
            cunit: self
                .get_str(&format!("CUNIT{n}"))
                .unwrap_or_default()
                .to_string(),
            crpix: self.get_f64(&format!("CRPIX{n}")).unwrap_or(0.0),
            crval: self.get_f64(&format!("CRVAL{n}")).unwrap_or(0.0),
            cdelt,
        }
    }
}

/// Read the primary header and image data from `r`.
///
/// The returned array has shape `(NAXISn, ..., NAXIS1)` with trailing degenerate axes
/// (`NAXISn == 1`, `n > 3`) squeezed away.
pub fn read_primary_hdu<R: Read>(mut r: R) -> ReelResult<(ArrayD<f32>, FitsHeader)> {
    let header = read_header(&mut r)?;

    if header.get("SIMPLE") != Some(&HeaderValue::Logical(true)) {
        return Err(ReelError::parse("not a FITS file (SIMPLE = T missing)"));
    }
    let bitpix = header.require_i64("BITPIX")?;
    let naxis = header.require_i64("NAXIS")?;
    if naxis <= 0 {
        return Err(ReelError::shape("primary HDU holds no image data"));
    }
    if naxis > MAX_NAXIS {
        return Err(ReelError::parse(format!(
            "NAXIS {naxis} exceeds the FITS limit of {MAX_NAXIS}"
        )));
    }

    let mut dims = Vec::with_capacity(naxis as usize);
    for n in 1..=naxis {
        let len = header.require_i64(&format!("NAXIS{n}"))?;
        if len < 0 {
            return Err(ReelError::parse(format!("NAXIS{n} is negative")));
        }
        dims.push(len as usize);
    }
    while dims.len() > 3 && dims.last() == Some(&1) {
        dims.pop();
    }

    let count = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| ReelError::parse("image size overflows"))?;

    let bscale = header.get_f64("BSCALE").unwrap_or(1.0);
    let bzero = header.get_f64("BZERO").unwrap_or(0.0);
    let blank = header.get_i64("BLANK");
    let values = read_data(&mut r, bitpix, count, bscale, bzero, blank)?;

    let shape: Vec<usize> = dims.iter().rev().copied().collect();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| ReelError::shape(e.to_string()))?;
    Ok((data, header))
}

fn read_header<R: Read>(r: &mut R) -> ReelResult<FitsHeader> {
    let mut header = FitsHeader::default();
    let mut block = [0u8; BLOCK_LEN];

    for _ in 0..MAX_HEADER_BLOCKS {
        r.read_exact(&mut block).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ReelError::parse("header ended before END card"),
            _ => ReelError::Other(anyhow::Error::new(e).context("read FITS header")),
        })?;

        for card in block.chunks_exact(CARD_LEN) {
            let keyword = std::str::from_utf8(&card[..8])
                .map_err(|_| ReelError::parse("header keyword is not ASCII"))?
                .trim_end();
            if keyword == "END" {
                return Ok(header);
            }
            if let Some(value) = parse_card_value(card)? {
                header.cards.push((keyword.to_string(), value));
            }
        }
    }

    Err(ReelError::parse("END card not found"))
}

/// Parse the value field of an 80-byte card. `Ok(None)` for commentary cards.
pub(crate) fn parse_card_value(card: &[u8]) -> ReelResult<Option<HeaderValue>> {
    if card.len() < 10 || &card[8..10] != b"= " {
        return Ok(None);
    }
    let field = std::str::from_utf8(&card[10..])
        .map_err(|_| ReelError::parse("header value is not ASCII"))?
        .trim_start();

    if let Some(rest) = field.strip_prefix('\'') {
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        loop {
            match chars.next() {
                Some('\'') if chars.peek() == Some(&'\'') => {
                    chars.next();
                    out.push('\'');
                }
                Some('\'') => break,
                Some(c) => out.push(c),
                None => return Err(ReelError::parse("unterminated string value")),
            }
        }
        return Ok(Some(HeaderValue::Str(out.trim_end().to_string())));
    }

    let token = field.split('/').next().unwrap_or_default().trim();
    if token.is_empty() {
        return Ok(None);
    }
    match token {
        "T" => return Ok(Some(HeaderValue::Logical(true))),
        "F" => return Ok(Some(HeaderValue::Logical(false))),
        _ => {}
    }
    if let Ok(v) = token.parse::<i64>() {
        return Ok(Some(HeaderValue::Int(v)));
    }
    let real = token.replace(['D', 'd'], "E");
    real.parse::<f64>()
        .map(|v| Some(HeaderValue::Float(v)))
        .map_err(|_| ReelError::parse(format!("unparseable header value '{token}'")))
}

/// Decode `count` values of `bitpix`. The raw bytes are read before anything is sized from
/// the header, so a file that claims more data than it holds fails with a parse error.
fn read_data<R: Read>(
    r: &mut R,
    bitpix: i64,
    count: usize,
    bscale: f64,
    bzero: f64,
    blank: Option<i64>,
) -> ReelResult<Vec<f32>> {
    let width = match bitpix {
        8 => 1,
        16 => 2,
        32 | -32 => 4,
        64 | -64 => 8,
        other => return Err(ReelError::parse(format!("unsupported BITPIX {other}"))),
    };
    let expected = count
        .checked_mul(width)
        .ok_or_else(|| ReelError::parse("image size overflows"))?;
    let limit = u64::try_from(expected).map_err(|_| ReelError::parse("image size overflows"))?;

    let mut raw = Vec::new();
    r.by_ref()
        .take(limit)
        .read_to_end(&mut raw)
        .map_err(|e| ReelError::Other(anyhow::Error::new(e).context("read FITS image data")))?;
    if raw.len() != expected {
        return Err(ReelError::parse(format!(
            "image data truncated (expected {count} values of BITPIX {bitpix}, found {} bytes)",
            raw.len()
        )));
    }

    let scale_int = |raw: i64| -> f32 {
        if blank == Some(raw) {
            f32::NAN
        } else {
            (bzero + bscale * raw as f64) as f32
        }
    };
    let scale_float = |raw: f64| -> f32 { (bzero + bscale * raw) as f32 };
    let identity = bscale == 1.0 && bzero == 0.0;

    let values = raw.chunks_exact(width);
    let out = match bitpix {
        8 => values.map(|c| scale_int(i64::from(c[0]))).collect(),
        16 => values
            .map(|c| scale_int(i64::from(BigEndian::read_i16(c))))
            .collect(),
        32 => values
            .map(|c| scale_int(i64::from(BigEndian::read_i32(c))))
            .collect(),
        64 => values.map(|c| scale_int(BigEndian::read_i64(c))).collect(),
        -32 if identity => values.map(BigEndian::read_f32).collect(),
        -32 => values
            .map(|c| scale_float(f64::from(BigEndian::read_f32(c))))
            .collect(),
        _ => values.map(|c| scale_float(BigEndian::read_f64(c))).collect(),
    };
    Ok(out)
}

/// Read a cube straight from a path; shorthand for `FitsSource::new(path).load()`.
pub fn load_fits(path: impl AsRef<Path>) -> ReelResult<(Cube, CoordinateMap)> {
    FitsSource::new(path.as_ref()).load()
}

#[cfg(test)]
#[path = "../../tests/unit/cube/fits.rs"]
mod tests;
