//! MeshGenError: unified error type for block-mesh public APIs
//!
//! Every fallible operation in this crate returns [`MeshGenError`]. Variants
//! carry the block id, patch name or node index needed to locate the offending
//! input. Errors are grouped into the categories reported by
//! [`MeshGenError::kind`].

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = MeshGenError> = std::result::Result<T, E>;

/// Broad classification of a [`MeshGenError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Rejected at a setter call; fix the input and call again.
    Validation,
    /// Internally inconsistent topology found by `build` or `partition`.
    Structural,
    /// Periodic matching failed; the mesh itself stays usable.
    Geometric,
    /// Invalid option or description file.
    Configuration,
}

/// Unified error type for block-mesh operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshGenError {
    // ---------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------
    /// Point dimension must be 2 or 3.
    #[error("invalid dimension {0}: only 2D and 3D are supported")]
    InvalidDimension(usize),
    /// An index (point, block, face) is outside its container.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// A list has the wrong number of entries.
    #[error("{what}: expected {expected} entries, found {found}")]
    ArityMismatch {
        what: String,
        expected: String,
        found: usize,
    },
    /// A coordinate or translation component is NaN or infinite.
    #[error("non-finite coordinate {value} for {what}")]
    InvalidCoordinate { what: String, value: f64 },
    /// Subdivision counts must be at least one.
    #[error("block {block}: subdivision count {count} on axis {axis} must be >= 1")]
    InvalidSubdivision {
        block: usize,
        axis: usize,
        count: usize,
    },
    /// Grading factors must be finite and within `[1e-6, 1e6]`.
    #[error("block {block}: grading factor {value} at position {position} must be finite and within [1e-6, 1e6]")]
    InvalidGrading {
        block: usize,
        position: usize,
        value: f64,
    },
    /// Extrusion stage lengths must be finite and strictly positive.
    #[error("extrusion stage {stage}: length {length} must be finite and > 0")]
    InvalidStageLength { stage: usize, length: f64 },
    /// A patch with this name is already registered.
    #[error("patch `{0}` already exists")]
    DuplicatePatchName(String),
    /// No patch with this name is registered.
    #[error("unknown patch `{0}`")]
    UnknownPatch(String),
    /// Extrusion needs at least one stage.
    #[error("extrusion requires at least one stage")]
    EmptyStageList,
    /// Logical axis does not exist for this dimension.
    #[error("axis {axis} is invalid for a {dimension}D topology")]
    InvalidAxis { axis: usize, dimension: usize },

    // ---------------------------------------------------------------------
    // Structural
    // ---------------------------------------------------------------------
    /// A block is missing its corners or subdivisions.
    #[error("block {block} is incomplete: {missing} not set")]
    IncompleteBlock { block: usize, missing: &'static str },
    /// A patch face is not an exterior face of any block.
    #[error("patch `{patch}` face {face} with points {points:?} is not an exterior block face")]
    UnmatchedPatchFace {
        patch: String,
        face: usize,
        points: Vec<usize>,
    },
    /// The same exterior face appears in two patches.
    #[error("face {points:?} is claimed by patches `{first}` and `{second}`")]
    DuplicatePatchFace {
        points: Vec<usize>,
        first: String,
        second: String,
    },
    /// Two blocks sharing an edge disagree on its subdivision count.
    #[error("edge {edge:?} has {first} subdivisions in one block but {second} in block {block}")]
    InconsistentEdgeSubdivision {
        edge: (usize, usize),
        first: usize,
        second: usize,
        block: usize,
    },
    /// Partition count is zero or exceeds the number of cell layers.
    #[error("cannot split {layers} cell layers on axis {axis} into {requested} partitions")]
    TooManyPartitions {
        requested: usize,
        layers: usize,
        axis: usize,
    },
    /// Blocks cannot be stacked consistently along the partition axis.
    #[error("block {block}: inconsistent layering along axis {axis} ({reason})")]
    InconsistentLayering {
        block: usize,
        axis: usize,
        reason: String,
    },

    // ---------------------------------------------------------------------
    // Geometric
    // ---------------------------------------------------------------------
    /// A source-patch node has no translated counterpart on the destination patch.
    #[error("periodic link {link} (`{source_patch}`): node {node} has no match within {tolerance:e}")]
    UnmatchedPeriodicNode {
        link: usize,
        source_patch: String,
        node: usize,
        tolerance: f64,
    },
    /// More than one destination node lies within tolerance.
    #[error("periodic link {link}: node {node} matches several destination nodes {candidates:?}")]
    AmbiguousPeriodicMatch {
        link: usize,
        node: usize,
        candidates: Vec<usize>,
    },
    /// A slave node would map to two different masters.
    #[error("periodic mapping conflict for node {slave}: existing master {existing}, new {new}")]
    PeriodicMappingConflict {
        slave: usize,
        existing: usize,
        new: usize,
    },

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------
    /// Options or description failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An invariant check failed.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl MeshGenError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use MeshGenError::*;
        match self {
            InvalidDimension(_)
            | IndexOutOfRange { .. }
            | ArityMismatch { .. }
            | InvalidCoordinate { .. }
            | InvalidSubdivision { .. }
            | InvalidGrading { .. }
            | InvalidStageLength { .. }
            | DuplicatePatchName(_)
            | UnknownPatch(_)
            | EmptyStageList
            | InvalidAxis { .. } => ErrorKind::Validation,
            IncompleteBlock { .. }
            | UnmatchedPatchFace { .. }
            | DuplicatePatchFace { .. }
            | InconsistentEdgeSubdivision { .. }
            | TooManyPartitions { .. }
            | InconsistentLayering { .. } => ErrorKind::Structural,
            UnmatchedPeriodicNode { .. }
            | AmbiguousPeriodicMatch { .. }
            | PeriodicMappingConflict { .. } => ErrorKind::Geometric,
            InvalidConfig(_) | InvariantViolation(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn arity(what: impl Into<String>, expected: impl ToString, found: usize) -> Self {
        MeshGenError::ArityMismatch {
            what: what.into(),
            expected: expected.to_string(),
            found,
        }
    }
}
