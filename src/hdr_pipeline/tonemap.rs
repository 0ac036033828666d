//! Tonemapping module
//!
//! Three operators compress a radiance map into display range:
//! - `Drago`: adaptive logarithmic mapping
//! - `Reinhard`: photographic mapping with global/local adaptation
//! - `Mantiuk`: contrast mapping in a gradient pyramid
//!
//! Operators only read the radiance map, so any number of them may run at
//! the same time over one map.

mod drago;
mod luminance;
mod mantiuk;
mod reinhard;
pub mod types;


pub use drago::Drago;
pub use mantiuk::Mantiuk;
pub use reinhard::Reinhard;
pub use types::{ToneMapJob, ToneMapKind, ToneMapOperator, ToneMapper};
