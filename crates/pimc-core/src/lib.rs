//! # pimc-core - Banked PIM Matmul Compiler Backend
//!
//! Lowers a dense matrix-multiplication descriptor onto the banked,
//! row-addressed PIM target defined by `pimc-isa`: 8 banks x 512 rows x
//! 64 columns, 8 compute clusters per bank, 24-bit instruction words.
//!
//! ## Architecture
//!
//! Compilation is a single-pass, synchronous batch transformation:
//!
//! ```text
//! MatmulDescriptor -> MemoryMapper -> InstructionGenerator -> serializers
//!                     (AllocationTable)  (InstructionStream)
//! ```
//!
//! - The [`mapper`] allocates contiguous single-bank row ranges with a
//!   round-robin bump allocator and answers physical address queries.
//! - The [`generator`] schedules a deterministic row-major traversal,
//!   fuses elementwise activations into read-modify-writes, and keeps
//!   read-after-write and bank-bandwidth hazards out of the stream via a
//!   transient [`hazard::HazardLedger`].
//! - The [`compiler`] ties one session together; every session owns a
//!   fresh mapper, so independent compilations can run in parallel.
//! - [`serialize`] holds the thin stream consumers (binary packing,
//!   assembly text, verification dump).
//!
//! ## Example
//!
//! ```
//! use pimc_core::{Compiler, MatmulDescriptor, MatrixSpec};
//!
//! # fn main() -> pimc_core::Result<()> {
//! let descriptor = MatmulDescriptor::new(
//!     MatrixSpec::new("A", 64, 32),
//!     MatrixSpec::new("B", 32, 16),
//!     MatrixSpec::new("C", 64, 16),
//! );
//! let compilation = Compiler::new().compile(descriptor)?;
//! assert_eq!(compilation.stream.len(), 1 + 64 * 16 * (2 * 32 + 32 + 1) + 1);
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod hazard;
pub mod mapper;
pub mod serialize;
pub mod transform;

// Re-export primary types
pub use compiler::{Compilation, Compiler};
pub use descriptor::{Activation, MatmulDescriptor, MatrixSpec};
pub use error::{AllocationError, CompileError, LookupError, Result, SchedulingError};
pub use generator::InstructionGenerator;
pub use mapper::{cluster_for, AllocationTable, ClusterAssignment, MatrixAllocation, MemoryMapper};
pub use transform::{DescriptorTransform, IdentityTransform};
