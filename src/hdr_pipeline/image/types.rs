//! Exposure image types

use crate::hdr_pipeline::common::InputError;

/// Samples per pixel in every RGB buffer.
pub const CHANNELS: usize = 3;

/// Decoded 8-bit RGB image as handed over by an [`ExposureReader`](crate::hdr_pipeline::ExposureReader)
/// or produced at the output boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u8>,
}

/// One bracketed exposure: an 8-bit RGB grid plus its exposure duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureImage {
    pub width: usize,
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u8>,
    /// Exposure duration in seconds
    pub exposure_time: f32,
}

impl ExposureImage {
    pub fn new(width: usize, height: usize, data: Vec<u8>, exposure_time: f32) -> Self {
        Self {
            width,
            height,
            data,
            exposure_time,
        }
    }

    pub fn from_rgb(image: RgbImageData, exposure_time: f32) -> Self {
        Self::new(image.width, image.height, image.data, exposure_time)
    }

    #[inline]
    pub fn sample(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.data[(y * self.width + x) * CHANNELS + channel]
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Grayscale conversion with the Rec.601 weights, rounded to 8 bits.
    pub fn luminance_u8(&self) -> Vec<u8> {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| {
                let l = super::luminance([px[0] as f32, px[1] as f32, px[2] as f32]);
                l.round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// Moves the content by `(dx, dy)` pixels: `out(x, y) = in(x - dx, y - dy)`.
    ///
    /// Pixels uncovered at the borders repeat the nearest edge pixel, so the
    /// dimensions never change.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        if dx == 0 && dy == 0 {
            return self.clone();
        }
        let (w, h) = (self.width as i64, self.height as i64);
        let mut data = vec![0u8; self.data.len()];
        for (y, row) in data.chunks_exact_mut(self.width * CHANNELS).enumerate() {
            let sy = (y as i64 - dy as i64).clamp(0, h - 1) as usize;
            for x in 0..self.width {
                let sx = (x as i64 - dx as i64).clamp(0, w - 1) as usize;
                let src = (sy * self.width + sx) * CHANNELS;
                row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&self.data[src..src + CHANNELS]);
            }
        }
        Self::new(self.width, self.height, data, self.exposure_time)
    }
}

/// Exposures of one static scene ordered by strictly increasing exposure time.
///
/// Guarantees at least two images, identical dimensions and finite, positive,
/// strictly increasing durations. Only shared access to the images is given out.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureStack {
    images: Vec<ExposureImage>,
}

impl ExposureStack {
    pub fn new(images: Vec<ExposureImage>) -> Result<Self, InputError> {
        validate(&images)?;
        Ok(Self { images })
    }

    /// Pairs decoded images with their exposure times, shortest exposure first.
    pub fn from_images(images: Vec<RgbImageData>, exposure_times: &[f32]) -> Result<Self, InputError> {
        if images.len() != exposure_times.len() {
            return Err(InputError::ExposureCountMismatch {
                images: images.len(),
                times: exposure_times.len(),
            });
        }
        let images = images
            .into_iter()
            .zip(exposure_times)
            .map(|(image, &time)| ExposureImage::from_rgb(image, time))
            .collect();
        Self::new(images)
    }

    /// Skips validation. Callers must keep dimensions and exposure times of an
    /// already validated stack.
    pub(crate) fn from_validated(images: Vec<ExposureImage>) -> Self {
        Self { images }
    }

    pub fn images(&self) -> &[ExposureImage] {
        &self.images
    }

    pub fn into_images(self) -> Vec<ExposureImage> {
        self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn width(&self) -> usize {
        self.images[0].width
    }

    pub fn height(&self) -> usize {
        self.images[0].height
    }

    pub fn exposure_times(&self) -> Vec<f32> {
        self.images.iter().map(|img| img.exposure_time).collect()
    }

    /// Index of the middle exposure (`len / 2`, the upper middle for even stacks).
    pub fn middle_index(&self) -> usize {
        self.images.len() / 2
    }
}

fn validate(images: &[ExposureImage]) -> Result<(), InputError> {
    if images.len() < 2 {
        return Err(InputError::TooFewImages(images.len()));
    }

    let (expected_width, expected_height) = (images[0].width, images[0].height);
    let mut previous: Option<f32> = None;

    for (index, image) in images.iter().enumerate() {
        if image.width == 0 || image.height == 0 {
            return Err(InputError::EmptyImage {
                index,
                width: image.width,
                height: image.height,
            });
        }
        if image.width != expected_width || image.height != expected_height {
            return Err(InputError::DimensionMismatch {
                index,
                width: image.width,
                height: image.height,
                expected_width,
                expected_height,
            });
        }
        let expected = image.width * image.height * CHANNELS;
        if image.data.len() != expected {
            return Err(InputError::BufferSize {
                index,
                expected,
                actual: image.data.len(),
            });
        }

        let time = image.exposure_time;
        if !time.is_finite() || time <= 0.0 {
            return Err(InputError::NonPositiveExposure { index, time });
        }
        if let Some(previous) = previous {
            if time <= previous {
                return Err(InputError::NonIncreasingExposure { index, time, previous });
            }
        }
        previous = Some(time);
    }

    Ok(())
}
