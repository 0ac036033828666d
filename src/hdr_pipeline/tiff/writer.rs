use std::io::Write;

use crate::hdr_pipeline::common::Result;
use crate::hdr_pipeline::image::{RadianceMap, RgbImageData};
use crate::hdr_pipeline::tiff::types::OutputConfig;

pub trait HdrImageWriter {
    /// Linear radiance, full float precision.
    fn write_radiance(&self, image: &RadianceMap, output: &mut dyn Write, config: &OutputConfig) -> Result<()>;

    /// Display-referred 8-bit RGB.
    fn write_ldr(&self, image: &RgbImageData, output: &mut dyn Write, config: &OutputConfig) -> Result<()>;
}
