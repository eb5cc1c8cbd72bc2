// Basic image operations: resize, grayscale, conversion to and from arrays.

use image::{GrayImage, ImageBuffer, Luma, Rgba};
use ndarray::{Array3, ArrayView2};

use crate::Image;

/// Use the image crate to resize image.
pub fn resize(image: &Image, new_width: u32, new_height: u32) -> Image {
    log::debug!(
        "resizing {:?} to ({new_width}, {new_height})",
        image.dimensions
    );

    let resize_filter = image::imageops::FilterType::CatmullRom;
    let buffer = image::imageops::resize(&image.image, new_width, new_height, resize_filter);

    Image::from_buffer(buffer)
}

/// Luma of an RGBA pixel with the BT.601 weights, rounded to 8 bits.
pub fn pixel_to_grayscale(p: &[u8]) -> u8 {
    ((p[0] as f64 * 0.299) + (p[1] as f64 * 0.587) + (p[2] as f64 * 0.114))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Single-channel `(H, W, 1)` array of grayscale values in `[0, 255]`.
pub fn grayscale_array(image: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Array3<f32> {
    let (width, height) = image.dimensions();

    // note: array index is (row, column) vs. (x, y)
    Array3::from_shape_fn((height as usize, width as usize, 1), |(i, j, _)| {
        pixel_to_grayscale(&image[(j as u32, i as u32)].0) as f32
    })
}

/// `(H, W, 3)` array of the red, green and blue channels; alpha is dropped.
pub fn rgb_array(image: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Array3<f32> {
    let (width, height) = image.dimensions();

    Array3::from_shape_fn((height as usize, width as usize, 3), |(i, j, chan)| {
        image[(j as u32, i as u32)].0[chan] as f32
    })
}

/// Grayscale image with `values` mapped linearly from their range onto
/// `[0, 255]`. A constant array maps to mid-gray.
pub fn stretch_to_gray(values: ArrayView2<f32>) -> GrayImage {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;

    gray_from_fn(values, |v| {
        if span > 0.0 {
            (v - min) / span * 255.0
        } else {
            127.0
        }
    })
}

/// Grayscale image with `values` clamped to `[0, 255]`.
pub fn clamp_to_gray(values: ArrayView2<f32>) -> GrayImage {
    gray_from_fn(values, |v| v)
}

fn gray_from_fn(values: ArrayView2<f32>, map: impl Fn(f32) -> f32) -> GrayImage {
    let (height, width) = values.dim();
    ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let v = map(values[[y as usize, x as usize]]);
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}
