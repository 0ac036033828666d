use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use tracing::debug;

use crate::hdr_pipeline::common::{HdrError, Result};
use crate::hdr_pipeline::image::RgbImageData;
use crate::hdr_pipeline::tiff::reader::ExposureReader;

/// Reads 8-bit RGB, RGBA (alpha dropped) and grayscale (replicated) TIFFs.
pub struct StandardTiffReader;

impl ExposureReader for StandardTiffReader {
    fn read_rgb(&self, data: &[u8]) -> Result<RgbImageData> {
        debug!("Decoding TIFF exposure, {} bytes", data.len());

        let mut decoder =
            Decoder::new(Cursor::new(data)).map_err(|e| HdrError::DecodeError(e.to_string()))?;
        let (width, height) = decoder
            .dimensions()
            .map_err(|e| HdrError::DecodeError(e.to_string()))?;
        let color_type = decoder
            .colortype()
            .map_err(|e| HdrError::DecodeError(e.to_string()))?;

        let samples = match decoder
            .read_image()
            .map_err(|e| HdrError::DecodeError(e.to_string()))?
        {
            DecodingResult::U8(samples) => samples,
            _ => {
                return Err(HdrError::UnsupportedFormat(format!(
                    "{color_type:?}: only 8-bit samples are supported"
                )))
            }
        };

        let pixels = width as usize * height as usize;
        let rgb = match color_type {
            ColorType::RGB(8) => samples,
            ColorType::RGBA(8) => samples
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            ColorType::Gray(8) => samples.iter().flat_map(|&v| [v, v, v]).collect(),
            other => return Err(HdrError::UnsupportedFormat(format!("{other:?}"))),
        };

        if rgb.len() != pixels * 3 {
            return Err(HdrError::DecodeError(format!(
                "expected {} samples for {}x{}, got {}",
                pixels * 3,
                width,
                height,
                rgb.len()
            )));
        }

        debug!(width, height, ?color_type, "TIFF exposure decoded");
        Ok(RgbImageData {
            width: width as usize,
            height: height as usize,
            data: rgb,
        })
    }
}
