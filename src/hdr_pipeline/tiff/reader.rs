use crate::hdr_pipeline::common::Result;
use crate::hdr_pipeline::image::RgbImageData;

/// Decodes one exposure into interleaved 8-bit RGB.
pub trait ExposureReader {
    fn read_rgb(&self, data: &[u8]) -> Result<RgbImageData>;
}
