// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Shared helpers for integration tests

#![allow(dead_code)]

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Write a small solid-color PNG and return its path
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([180, 40, 120]))
        .save(&path)
        .unwrap();
    path
}

/// Write a file no image decoder accepts
pub fn write_garbage(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, "very unsupported image").unwrap();
    path
}
