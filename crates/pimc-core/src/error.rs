//! Error types for compilation
//!
//! The taxonomy mirrors the stage that raises each error: allocation and
//! lookup errors come from the memory mapper, scheduling errors from the
//! instruction generator, and encoding errors from lowering to words.
//! Allocation and lookup failures abort the in-progress compilation and
//! surface the offending name/coordinates; no retry is attempted since
//! inputs are deterministic.

use pimc_isa::EncodingError;

/// Result type for compilation operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised by the memory mapper's allocator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    /// No bank can hold the requested footprint after a full round-robin scan
    #[error("out of memory: no bank has {rows_needed} free rows for matrix '{name}'")]
    OutOfMemory { name: String, rows_needed: usize },

    /// The matrix name was already allocated in this session
    #[error("duplicate matrix name '{name}'")]
    DuplicateName { name: String },
}

/// Errors raised by address-table queries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The matrix was never allocated in this session
    #[error("matrix '{name}' not found in allocation table")]
    NotFound { name: String },

    /// The logical coordinates exceed the matrix's declared dimensions
    #[error("element ({row}, {col}) out of range for matrix '{name}' ({rows}x{cols})")]
    OutOfRange {
        name: String,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// Errors raised by the instruction generator's scheduler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    /// An operand references a matrix/coordinate absent from the address table
    #[error("unresolved operand address: matrix '{name}' element ({row}, {col})")]
    AddressUnresolved { name: String, row: usize, col: usize },

    /// The read-after-write rule could not be satisfied within the modeled
    /// pipeline depth (defensive; unreachable under sequential scheduling)
    #[error("unresolvable hazard on address {address:#x} at cycle {cycle}")]
    HazardUnresolvable { address: u32, cycle: u64 },
}

/// Any error that aborts a compilation
///
/// On failure the whole in-progress compilation is discarded: neither a
/// partial allocation table nor a partial stream is ever exposed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The descriptor is not a well-formed matmul
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Allocation error
    #[error("allocation error: {0}")]
    Allocation(#[from] AllocationError),

    /// Lookup error
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Scheduling error
    #[error("scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    /// Encoding error (an internal invariant violation when raised by a
    /// stream produced through the mapper)
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Serializer output could not be formatted
    #[error("serialization error: {0}")]
    Serialization(String),
}
