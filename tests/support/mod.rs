#![allow(dead_code)]

use std::path::{Path, PathBuf};

use byteorder::{BigEndian, WriteBytesExt};
use ndarray::Array3;

const BLOCK_LEN: usize = 2880;

/// `(V, Y, X)` cube with `v + 2y + 3x` in every sample.
pub fn ramp(v: usize, y: usize, x: usize) -> Array3<f32> {
    Array3::from_shape_fn((v, y, x), |(v, y, x)| (v + 2 * y + 3 * x) as f32)
}

fn card(key: &str, value: &str) -> String {
    let s = if value.is_empty() {
        format!("{key:<8}")
    } else {
        format!("{key:<8}= {value:>20}")
    };
    format!("{s:<80}")
}

/// Write `cube` as a BITPIX -32 primary HDU with a simple linear WCS.
pub fn write_fits_cube(path: &Path, cube: &Array3<f32>) {
    let (v, y, x) = cube.dim();
    let cards = [
        ("SIMPLE", "T".to_string()),
        ("BITPIX", "-32".to_string()),
        ("NAXIS", "3".to_string()),
        ("NAXIS1", x.to_string()),
        ("NAXIS2", y.to_string()),
        ("NAXIS3", v.to_string()),
        ("CTYPE1", "'RA---TAN'".to_string()),
        ("CDELT1", "-0.001".to_string()),
        ("CRVAL1", "83.8".to_string()),
        ("CRPIX1", "1.0".to_string()),
        ("CTYPE2", "'DEC--TAN'".to_string()),
        ("CDELT2", "0.001".to_string()),
        ("CRVAL2", "-5.4".to_string()),
        ("CRPIX2", "1.0".to_string()),
        ("CTYPE3", "'VRAD'".to_string()),
        ("CUNIT3", "'m/s'".to_string()),
        ("CDELT3", "500.0".to_string()),
        ("CRVAL3", "8000.0".to_string()),
        ("CRPIX3", "1.0".to_string()),
    ];

    let mut header = String::new();
    for (k, val) in &cards {
        header.push_str(&card(k, val));
    }
    header.push_str(&card("END", ""));
    while header.len() % BLOCK_LEN != 0 {
        header.push(' ');
    }

    let mut out = header.into_bytes();
    // Standard (row-major) iteration of a (V, Y, X) array is NAXIS1-fastest.
    for s in cube.iter() {
        out.write_f32::<BigEndian>(*s).unwrap();
    }
    while out.len() % BLOCK_LEN != 0 {
        out.push(0);
    }
    std::fs::write(path, out).unwrap();
}

pub fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pvreel"))
}
