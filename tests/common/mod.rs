#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use npyz::WriterBuilder;

/// Fresh scratch directory unique to this process and test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wircpol-masks-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Encodes a C-order float64 `.npy` file in memory.
pub fn npy_bytes(shape: &[usize], data: &[f64]) -> Vec<u8> {
    let shape: Vec<u64> = shape.iter().map(|&d| d as u64).collect();
    let mut out = Vec::new();
    let mut writer = npyz::WriteOptions::<f64>::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut out)
        .begin_nd()
        .unwrap();
    for value in data {
        writer.push(value).unwrap();
    }
    writer.finish().unwrap();
    out
}

pub fn write_npy(path: &Path, shape: &[usize], data: &[f64]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, npy_bytes(shape, data)).unwrap();
}

pub fn write_png(path: &Path, width: usize, height: usize, pixels: Vec<u8>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::GrayImage::from_raw(width as u32, height as u32, pixels)
        .unwrap()
        .save(path)
        .unwrap();
}

/// Isotropic Gaussian spot of the given size, peak 1 at the center.
pub fn gaussian_spot(size: usize, sigma: f64) -> Vec<f64> {
    let c = (size as f64 - 1.0) * 0.5;
    let mut out = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let r2 = (x as f64 - c).powi(2) + (y as f64 - c).powi(2);
            out.push((-r2 / (2.0 * sigma * sigma)).exp());
        }
    }
    out
}

/// Ridge along the anti-diagonal, mimicking a dispersed trace.
pub fn anti_diagonal_ridge(size: usize, sigma: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let d = (x + y) as f64 - (size as f64 - 1.0);
            out.push((-d * d / (2.0 * sigma * sigma)).exp());
        }
    }
    out
}

/// Adds `patch` (row-major, `pw x ph`) into `frame` at `(x0, y0)`.
pub fn paste(frame: &mut [f64], frame_width: usize, patch: &[f64], pw: usize, x0: usize, y0: usize) {
    for (i, &v) in patch.iter().enumerate() {
        let (x, y) = (i % pw, i / pw);
        frame[(y0 + y) * frame_width + x0 + x] += v;
    }
}
