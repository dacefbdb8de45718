//! Pluggable descriptor transforms
//!
//! An optional external IR pass is modeled as a narrow
//! descriptor-in/descriptor-out interface, so the generator has no
//! dependency on any specific external toolchain. Transforms run in the
//! order they were registered, before allocation.

use crate::descriptor::MatmulDescriptor;
use crate::error::Result;

/// A descriptor-in/descriptor-out rewrite applied before compilation
pub trait DescriptorTransform {
    /// Name reported in tracing output
    fn name(&self) -> &str;

    /// Rewrite the descriptor
    fn apply(&self, descriptor: MatmulDescriptor) -> Result<MatmulDescriptor>;
}

/// Transform that returns the descriptor unchanged
#[derive(Debug, Default)]
pub struct IdentityTransform;

impl DescriptorTransform for IdentityTransform {
    fn name(&self) -> &str {
        "identity"
    }

    fn apply(&self, descriptor: MatmulDescriptor) -> Result<MatmulDescriptor> {
        Ok(descriptor)
    }
}
