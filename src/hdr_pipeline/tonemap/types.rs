//! Operator identity, the `ToneMapper` trait and the closed operator variant

use std::fmt;

use crate::hdr_pipeline::common::ToneMapError;
use crate::hdr_pipeline::image::{RadianceMap, ToneMappedImage};

use super::{Drago, Mantiuk, Reinhard};

/// Identity of a tonemap operator, used to tag results and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToneMapKind {
    Drago,
    Reinhard,
    Mantiuk,
}

impl ToneMapKind {
    pub const ALL: [ToneMapKind; 3] = [ToneMapKind::Drago, ToneMapKind::Reinhard, ToneMapKind::Mantiuk];

    pub fn name(&self) -> &'static str {
        match self {
            ToneMapKind::Drago => "Drago",
            ToneMapKind::Reinhard => "Reinhard",
            ToneMapKind::Mantiuk => "Mantiuk",
        }
    }
}

impl fmt::Display for ToneMapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pure radiance-to-display mapping.
///
/// Output samples lie in [0, 1]. Implementations must not keep state between
/// calls.
pub trait ToneMapper: Send + Sync {
    fn kind(&self) -> ToneMapKind;

    /// Rejects parameter combinations the operator cannot evaluate.
    fn validate(&self) -> Result<(), ToneMapError>;

    fn tonemap(&self, radiance: &RadianceMap) -> Result<ToneMappedImage, ToneMapError>;
}

/// One of the three operators together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ToneMapOperator {
    Drago(Drago),
    Reinhard(Reinhard),
    Mantiuk(Mantiuk),
}

impl ToneMapOperator {
    /// All three operators with their reference parameters, in reporting order.
    pub fn reference_set() -> Vec<ToneMapOperator> {
        vec![
            ToneMapOperator::Drago(Drago::default()),
            ToneMapOperator::Reinhard(Reinhard::default()),
            ToneMapOperator::Mantiuk(Mantiuk::default()),
        ]
    }

    /// Brightness gain the reference deployment applies after the operator.
    pub fn reference_post_gain(&self) -> f32 {
        match self {
            ToneMapOperator::Drago(_) | ToneMapOperator::Mantiuk(_) => 3.0,
            ToneMapOperator::Reinhard(_) => 1.0,
        }
    }

    fn inner(&self) -> &dyn ToneMapper {
        match self {
            ToneMapOperator::Drago(op) => op,
            ToneMapOperator::Reinhard(op) => op,
            ToneMapOperator::Mantiuk(op) => op,
        }
    }
}

impl ToneMapper for ToneMapOperator {
    fn kind(&self) -> ToneMapKind {
        self.inner().kind()
    }

    fn validate(&self) -> Result<(), ToneMapError> {
        self.inner().validate()
    }

    fn tonemap(&self, radiance: &RadianceMap) -> Result<ToneMappedImage, ToneMapError> {
        self.inner().tonemap(radiance)
    }
}

impl From<Drago> for ToneMapOperator {
    fn from(op: Drago) -> Self {
        ToneMapOperator::Drago(op)
    }
}

impl From<Reinhard> for ToneMapOperator {
    fn from(op: Reinhard) -> Self {
        ToneMapOperator::Reinhard(op)
    }
}

impl From<Mantiuk> for ToneMapOperator {
    fn from(op: Mantiuk) -> Self {
        ToneMapOperator::Mantiuk(op)
    }
}

/// An operator scheduled by the pipeline, plus the gain applied to its output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneMapJob {
    pub operator: ToneMapOperator,
    pub post_gain: f32,
}

impl ToneMapJob {
    /// Job with the operator's reference post-gain.
    pub fn new(operator: impl Into<ToneMapOperator>) -> Self {
        let operator = operator.into();
        let post_gain = operator.reference_post_gain();
        Self { operator, post_gain }
    }

    pub fn with_post_gain(mut self, post_gain: f32) -> Self {
        self.post_gain = post_gain;
        self
    }

    pub fn kind(&self) -> ToneMapKind {
        self.operator.kind()
    }

    /// The reference deployment: Drago x3, Reinhard x1, Mantiuk x3.
    pub fn reference_set() -> Vec<ToneMapJob> {
        ToneMapOperator::reference_set().into_iter().map(ToneMapJob::new).collect()
    }
}
