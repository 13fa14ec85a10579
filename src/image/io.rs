//! Raster I/O through the `image` crate.
//!
//! Calibration rasters (the cross-obscuration renderings) are read as 8-bit
//! grayscale; masks are written as 8-bit PNG with transmissive pixels at 255.

use crate::image::Grid;
use crate::mask::RegionMask;
use crate::util::{MaskError, MaskResult};
use std::path::Path;

/// Creates an owned grid from a grayscale image buffer.
pub fn grid_from_gray_image(img: &image::GrayImage) -> MaskResult<Grid<u8>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    Grid::new(img.as_raw().clone(), width, height)
}

/// Creates an owned grayscale grid from a dynamic image.
pub fn grid_from_dynamic_image(img: &image::DynamicImage) -> MaskResult<Grid<u8>> {
    let gray = img.to_luma8();
    grid_from_gray_image(&gray)
}

/// Loads a calibration raster from disk and converts it to grayscale.
///
/// A missing file is reported as [`MaskError::ResourceNotFound`], an
/// undecodable one as [`MaskError::CorruptResource`].
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> MaskResult<Grid<u8>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(MaskError::ResourceNotFound {
            path: path.to_path_buf(),
            reason: "no such file".to_string(),
        });
    }
    let img = image::open(path).map_err(|err| MaskError::CorruptResource {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    grid_from_dynamic_image(&img)
}

/// Renders a mask as an 8-bit grayscale image (0 blocked, 255 transmissive).
pub fn mask_to_gray_image(mask: &RegionMask) -> MaskResult<image::GrayImage> {
    let (width, height) = mask.shape();
    let pixels: Vec<u8> = mask
        .as_slice()
        .iter()
        .map(|&v| if v != 0 { 255 } else { 0 })
        .collect();
    image::GrayImage::from_raw(width as u32, height as u32, pixels)
        .ok_or(MaskError::InvalidDimensions { width, height })
}

/// Writes a mask to disk as PNG.
pub fn save_mask_png<P: AsRef<Path>>(mask: &RegionMask, path: P) -> MaskResult<()> {
    let img = mask_to_gray_image(mask)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|err| MaskError::ImageIo {
            reason: err.to_string(),
        })
}
