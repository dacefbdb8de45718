//! Compile session orchestration
//!
//! A [`Compiler`] drives one descriptor through the whole backend:
//! descriptor transforms, per-session memory mapping, instruction
//! generation. Each `compile` call constructs a fresh [`MemoryMapper`], so
//! independent compilations never share allocator state and may run fully
//! in parallel. On any error all partial state is discarded; callers only
//! ever observe a complete [`Compilation`] or none.

use crate::descriptor::MatmulDescriptor;
use crate::error::Result;
use crate::generator::InstructionGenerator;
use crate::mapper::{AllocationTable, MemoryMapper};
use crate::transform::DescriptorTransform;
use pimc_isa::InstructionStream;

/// The all-or-nothing output of one compilation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    /// Matrix name -> physical placement
    pub table: AllocationTable,
    /// The sealed instruction stream
    pub stream: InstructionStream,
}

/// Batch compiler for matmul descriptors
///
/// The compiler itself holds only the transform chain; all per-session
/// state lives in locals of [`compile`](Self::compile).
#[derive(Default)]
pub struct Compiler {
    transforms: Vec<Box<dyn DescriptorTransform>>,
}

impl Compiler {
    /// Create a compiler with no descriptor transforms
    pub fn new() -> Self {
        Self { transforms: Vec::new() }
    }

    /// Append a descriptor transform, applied in registration order
    pub fn with_transform(mut self, transform: Box<dyn DescriptorTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Compile one descriptor into an address table and instruction stream
    ///
    /// # Errors
    ///
    /// Propagates descriptor validation, allocation, lookup, scheduling,
    /// and encoding errors. Failure yields no partial stream or table.
    #[tracing::instrument(
        skip(self, descriptor),
        fields(
            m = tracing::field::Empty,
            k = tracing::field::Empty,
            n = tracing::field::Empty,
        )
    )]
    pub fn compile(&self, descriptor: MatmulDescriptor) -> Result<Compilation> {
        descriptor.validate()?;

        let mut descriptor = descriptor;
        for transform in &self.transforms {
            tracing::debug!(transform = transform.name(), "descriptor_transform");
            descriptor = transform.apply(descriptor)?;
        }
        descriptor.validate()?;

        tracing::Span::current()
            .record("m", descriptor.m() as u64)
            .record("k", descriptor.k() as u64)
            .record("n", descriptor.n() as u64);

        let mut mapper = MemoryMapper::new();
        mapper.allocate_matrix(&descriptor.a.name, descriptor.a.rows, descriptor.a.cols)?;
        mapper.allocate_matrix(&descriptor.b.name, descriptor.b.rows, descriptor.b.cols)?;
        mapper.allocate_matrix(&descriptor.c.name, descriptor.c.rows, descriptor.c.cols)?;

        let stream = InstructionGenerator::new().generate(&descriptor, &mapper)?;

        tracing::debug!(
            matrices = mapper.table().len(),
            instructions = stream.len(),
            "compilation_complete"
        );
        Ok(Compilation {
            table: mapper.into_table(),
            stream,
        })
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Activation, MatrixSpec};
    use crate::error::CompileError;
    use pimc_isa::Opcode;

    fn descriptor(m: usize, k: usize, n: usize) -> MatmulDescriptor {
        MatmulDescriptor::new(
            MatrixSpec::new("A", m, k),
            MatrixSpec::new("B", k, n),
            MatrixSpec::new("C", m, n),
        )
    }

    #[test]
    fn test_compile_produces_table_and_stream() {
        let compilation = Compiler::new().compile(descriptor(4, 3, 2)).unwrap();
        assert_eq!(compilation.table.len(), 3);
        assert_eq!(compilation.stream.len(), 1 + 4 * 2 * (6 + 3 + 1) + 1);
    }

    #[test]
    fn test_compile_rejects_invalid_descriptor() {
        let mut desc = descriptor(4, 3, 2);
        desc.b.rows = 7;
        let err = Compiler::new().compile(desc).unwrap_err();
        assert!(matches!(err, CompileError::InvalidDescriptor(_)));
    }

    #[test]
    fn test_transform_chain_is_applied() {
        struct AttachRelu;
        impl DescriptorTransform for AttachRelu {
            fn name(&self) -> &str {
                "attach_relu"
            }
            fn apply(&self, descriptor: MatmulDescriptor) -> Result<MatmulDescriptor> {
                Ok(descriptor.with_activation(Activation::Relu))
            }
        }

        let compilation = Compiler::new()
            .with_transform(Box::new(AttachRelu))
            .compile(descriptor(2, 2, 2))
            .unwrap();
        let progs = compilation
            .stream
            .iter()
            .filter(|instruction| instruction.opcode() == Opcode::Prog)
            .count();
        assert_eq!(progs, 2);
    }

    #[test]
    fn test_independent_sessions_are_identical() {
        let compiler = Compiler::new();
        let first = compiler.compile(descriptor(6, 5, 4)).unwrap();
        let second = compiler.compile(descriptor(6, 5, 4)).unwrap();
        assert_eq!(first, second);
    }
}
