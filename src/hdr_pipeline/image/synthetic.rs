//! Synthetic scenes and a known camera model for tests.

use super::{ExposureImage, ExposureStack, RadianceMap, CHANNELS};

pub const CAMERA_GAMMA: f32 = 2.2;

/// Exposure times spanning four stops, used by most round-trip tests.
pub const BRACKET_TIMES: [f32; 3] = [0.25, 1.0, 4.0];

/// Gamma-2.2 camera: irradiance times exposure time to an 8-bit code.
pub fn camera_response(exposure: f32) -> u8 {
    let x = exposure.clamp(0.0, 1.0);
    (255.0 * x.powf(1.0 / CAMERA_GAMMA)).round() as u8
}

/// Ground-truth `ln(exposure)` for code `z`, shifted so that code 128 maps to 0.
pub fn true_log_response(z: u8) -> f32 {
    let g = |z: f32| CAMERA_GAMMA * (z / 255.0).ln();
    g(z as f32) - g(128.0)
}

/// Smooth diagonal ramp from about 0.05 to 2.7 in radiance, slightly
/// different per channel.
pub fn ramp_scene(width: usize, height: usize) -> RadianceMap {
    let tint = [1.0f32, 0.9, 1.1];
    RadianceMap::from_fn(width, height, |x, y| {
        let t = 0.5 * (x as f32 / (width - 1).max(1) as f32 + y as f32 / (height - 1).max(1) as f32);
        let e = (-3.0 + 4.0 * t).exp();
        [e * tint[0], e * tint[1], e * tint[2]]
    })
}

/// Photographs `scene` with [`camera_response`] at every exposure time.
pub fn photograph(scene: &RadianceMap, times: &[f32]) -> ExposureStack {
    let images = times
        .iter()
        .map(|&t| {
            let data = scene.data().iter().map(|&e| camera_response(e * t)).collect();
            ExposureImage::new(scene.width(), scene.height(), data, t)
        })
        .collect();
    ExposureStack::new(images).expect("synthetic stack is valid")
}

fn block_hash(bx: usize, by: usize) -> u8 {
    let mut h = (bx as u32).wrapping_mul(0x9E37_79B1) ^ (by as u32).wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0xC2B2_AE3D);
    h ^= h >> 13;
    (h & 0xFF) as u8
}

/// Gray blocks of random brightness, `block` pixels wide.
pub fn textured_image(width: usize, height: usize, block: usize, exposure_time: f32) -> ExposureImage {
    let mut data = Vec::with_capacity(width * height * CHANNELS);
    for y in 0..height {
        for x in 0..width {
            let v = block_hash(x / block, y / block);
            data.extend_from_slice(&[v, v, v]);
        }
    }
    ExposureImage::new(width, height, data, exposure_time)
}

pub fn uniform_image(width: usize, height: usize, value: u8, exposure_time: f32) -> ExposureImage {
    ExposureImage::new(width, height, vec![value; width * height * CHANNELS], exposure_time)
}

/// Scene with a bright window region three decades above the background.
pub fn window_scene(width: usize, height: usize) -> RadianceMap {
    RadianceMap::from_fn(width, height, |x, y| {
        let inside = x > width / 3 && x < 2 * width / 3 && y > height / 4 && y < height / 2;
        let base = 0.02 + 0.05 * (x as f32 / width as f32);
        if inside {
            [40.0, 35.0, 30.0]
        } else {
            [base, base * 1.2, base * 0.8]
        }
    })
}
