use super::types::{RgbImageData, CHANNELS};

/// Linear scene radiance per pixel and channel.
///
/// Built once by the merger and only read afterwards; there is no mutable
/// access, so one map can be shared by any number of concurrent readers.
#[derive(Debug, Clone, PartialEq)]
pub struct RadianceMap {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl RadianceMap {
    /// # Panics
    ///
    /// Panics if `data` does not hold exactly `width * height * 3` samples.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            width * height * CHANNELS,
            "radiance buffer does not match {width}x{height}"
        );
        Self { width, height, data }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> [f32; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        let i = (y * self.width + x) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Smallest and largest sample over all channels.
    pub fn range(&self) -> (f32, f32) {
        sample_range(&self.data)
    }
}

/// Display-referred tonemapper output, nominally within [0, 1].
///
/// Values may exceed 1 after a post-gain ([`scaled`](Self::scaled)); clamping
/// happens only when converting to 8 bits.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneMappedImage {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ToneMappedImage {
    /// # Panics
    ///
    /// Panics if `data` does not hold exactly `width * height * 3` samples.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            width * height * CHANNELS,
            "tonemapped buffer does not match {width}x{height}"
        );
        Self { width, height, data }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        let i = (y * self.width + x) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn range(&self) -> (f32, f32) {
        sample_range(&self.data)
    }

    /// Multiplies every sample by `gain` without clamping.
    pub fn scaled(&self, gain: f32) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|v| v * gain).collect(),
        }
    }

    /// Clamps to [0, 1] and quantizes to 8 bits per channel, keeping RGB order.
    pub fn to_rgb8(&self) -> RgbImageData {
        let data = self
            .data
            .iter()
            .map(|&v| {
                let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
                (v * 255.0).round() as u8
            })
            .collect();
        RgbImageData {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

fn sample_range(data: &[f32]) -> (f32, f32) {
    data.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}
