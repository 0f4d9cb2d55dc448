// src/edge_extraction.rs
//
// Binary edge maps from a color frame. Low-contrast markers can vanish in a
// plain grayscale pass, so detection optionally runs on each color plane as
// well; every map is classified independently downstream.

use crate::types::{DetectionChannel, DetectionConfig};
use image::{GrayImage, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

/// Extract the requested intensity plane from a color frame.
fn channel_plane(frame: &RgbImage, channel: DetectionChannel) -> GrayImage {
    match channel {
        DetectionChannel::Gray => image::imageops::grayscale(frame),
        DetectionChannel::Red => plane(frame, 0),
        DetectionChannel::Green => plane(frame, 1),
        DetectionChannel::Blue => plane(frame, 2),
    }
}

fn plane(frame: &RgbImage, c: usize) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        image::Luma([frame.get_pixel(x, y).0[c]])
    })
}

/// Blur + Canny on one detection channel. Pure, no state.
pub fn extract_edges(
    frame: &RgbImage,
    channel: DetectionChannel,
    config: &DetectionConfig,
) -> GrayImage {
    let plane = channel_plane(frame, channel);
    let blurred = gaussian_blur_f32(&plane, config.blur_sigma);
    canny(&blurred, config.canny_low, config.canny_high)
}

/// One edge map per configured detection channel, in config order.
pub fn edge_maps(frame: &RgbImage, config: &DetectionConfig) -> Vec<(DetectionChannel, GrayImage)> {
    config
        .channels
        .iter()
        .map(|&channel| (channel, extract_edges(frame, channel, config)))
        .collect()
}
