use std::io::{Cursor, Write};

use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::hdr_pipeline::common::{HdrError, Result};
use crate::hdr_pipeline::image::{RadianceMap, RgbImageData};
use crate::hdr_pipeline::tiff::types::OutputConfig;
use crate::hdr_pipeline::tiff::writer::HdrImageWriter;

pub struct StandardTiffWriter;

impl StandardTiffWriter {
    fn encoder<'a>(
        buffer: &'a mut Vec<u8>,
        config: &OutputConfig,
        predictor: bool,
    ) -> Result<TiffEncoder<Cursor<&'a mut Vec<u8>>>> {
        let mut encoder = TiffEncoder::new(Cursor::new(buffer))
            .map_err(|e| HdrError::EncodeError(e.to_string()))?
            .with_compression(config.compression.to_tiff());

        if predictor {
            if let Some(2) = config.predictor {
                encoder = encoder.with_predictor(Predictor::Horizontal);
            }
        }
        Ok(encoder)
    }
}

impl HdrImageWriter for StandardTiffWriter {
    fn write_radiance(&self, image: &RadianceMap, output: &mut dyn Write, config: &OutputConfig) -> Result<()> {
        debug!("Encoding radiance TIFF: {}x{}", image.width(), image.height());

        let mut buffer = Vec::new();
        Self::encoder(&mut buffer, config, false)?
            .write_image::<colortype::RGB32Float>(image.width() as u32, image.height() as u32, image.data())
            .map_err(|e| HdrError::EncodeError(e.to_string()))?;
        output.write_all(&buffer)?;

        debug!(bytes = buffer.len(), "Radiance TIFF encoding complete");
        Ok(())
    }

    fn write_ldr(&self, image: &RgbImageData, output: &mut dyn Write, config: &OutputConfig) -> Result<()> {
        debug!("Encoding RGB8 TIFF: {}x{}", image.width, image.height);

        let mut buffer = Vec::new();
        Self::encoder(&mut buffer, config, true)?
            .write_image::<colortype::RGB8>(image.width as u32, image.height as u32, &image.data)
            .map_err(|e| HdrError::EncodeError(e.to_string()))?;
        output.write_all(&buffer)?;

        debug!(bytes = buffer.len(), "RGB8 TIFF encoding complete");
        Ok(())
    }
}
