//! Radiance merge module
//!
//! Fuses an aligned exposure stack into one linear radiance map using the
//! recovered camera response.

mod debevec_merge;


pub use debevec_merge::DebevecMerger;
