//! TIFF input/output module
//!
//! Decodes 8-bit exposure brackets and encodes the radiance map (32-bit
//! float) and the tonemapped results (8-bit) as TIFF files.

mod reader;
mod standard_tiff_reader;
mod standard_tiff_writer;
pub mod types;
mod writer;


pub use reader::ExposureReader;
pub use standard_tiff_reader::StandardTiffReader;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{OutputConfig, TiffCompression};
pub use writer::HdrImageWriter;
