//! Instruction generator: scheduling, fusion, and stream emission
//!
//! Given a descriptor and the mapper's address table, the generator
//! produces the compilation's single, total instruction order:
//!
//! 1. One `PROG` per distinct (core, function) pair, deduplicated and
//!    emitted before any `EXE`.
//! 2. Row-major traversal of the output (i outer, j middle, k inner): per
//!    element, paired operand reads and a MAC `EXE` for each k, then one
//!    accumulated write.
//! 3. A fusion pass that merges an accumulation write followed by an
//!    elementwise nonlinearity on the same address into a single
//!    read-modify-write.
//! 4. Issue cycles chosen through the [`HazardLedger`]; operand fetches
//!    for iteration k+1 may share the cycle of iteration k's `EXE`
//!    (software pipelining) when bank bandwidth allows.
//! 5. Exactly one `END`, always last.

use crate::descriptor::MatmulDescriptor;
use crate::error::{Result, SchedulingError};
use crate::hazard::HazardLedger;
use crate::mapper::MemoryMapper;
use pimc_isa::{FuncCode, Instruction, InstructionStream, MemoryAddress};

/// LUT-core class carrying the MAC array; `PROG` against it broadcasts the
/// function code to every cluster
pub const MAC_CORE: u8 = 0;

/// One-shot builder of a hazard-free instruction stream
#[derive(Debug)]
pub struct InstructionGenerator {
    instructions: Vec<Instruction>,
    ledger: HazardLedger,
    cycle: u64,
}

impl InstructionGenerator {
    /// Create a generator with an empty stream buffer
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            ledger: HazardLedger::new(),
            cycle: 0,
        }
    }

    /// Produce the encoded, hazard-free stream for one matmul
    ///
    /// The traversal order is deterministic; identical inputs always yield
    /// identical streams.
    pub fn generate(mut self, descriptor: &MatmulDescriptor, mapper: &MemoryMapper) -> Result<InstructionStream> {
        self.emit_core_programming(descriptor);
        self.emit_elements(descriptor, mapper)?;
        if let Some(activation) = descriptor.activation {
            fuse_elementwise(&mut self.instructions, activation.func_code());
        }
        self.instructions.push(Instruction::End);

        tracing::debug!(
            m = descriptor.m(),
            k = descriptor.k(),
            n = descriptor.n(),
            instructions = self.instructions.len(),
            "stream_generated"
        );
        Ok(InstructionStream::from_instructions(self.instructions))
    }

    // One PROG per distinct (core, func) pair, before any EXE.
    fn emit_core_programming(&mut self, descriptor: &MatmulDescriptor) {
        let mut funcs = vec![FuncCode::Mac];
        if let Some(activation) = descriptor.activation {
            let func = activation.func_code();
            if !funcs.contains(&func) {
                funcs.push(func);
            }
        }
        for func in funcs {
            self.cycle += 1;
            self.instructions.push(Instruction::Prog { core: MAC_CORE, func });
        }
    }

    fn emit_elements(&mut self, descriptor: &MatmulDescriptor, mapper: &MemoryMapper) -> Result<()> {
        let (m, k, n) = (descriptor.m(), descriptor.k(), descriptor.n());
        for i in 0..m {
            for j in 0..n {
                for step in 0..k {
                    let a_addr = resolve(mapper, &descriptor.a.name, i, step)?;
                    let b_addr = resolve(mapper, &descriptor.b.name, step, j)?;

                    // Software pipelining: after the first reduction step,
                    // operand fetches may overlap the preceding MAC's cycle.
                    let earliest = if step == 0 { self.cycle + 1 } else { self.cycle };
                    let a_cycle = self.ledger.schedule_read(a_addr, earliest)?;
                    self.instructions.push(Instruction::Read { addr: a_addr });
                    let b_cycle = self.ledger.schedule_read(b_addr, earliest)?;
                    self.instructions.push(Instruction::Read { addr: b_addr });

                    // The MAC issues once both operands are in.
                    self.cycle = a_cycle.max(b_cycle) + 1;
                    self.instructions.push(Instruction::Exe {
                        core: MAC_CORE,
                        func: FuncCode::Mac,
                    });
                }

                let c_addr = resolve(mapper, &descriptor.c.name, i, j)?;
                self.cycle = self.ledger.schedule_write(c_addr, self.cycle + 1)?;
                self.instructions.push(Instruction::Write { addr: c_addr });

                if let Some(activation) = descriptor.activation {
                    self.cycle += 1;
                    self.instructions.push(Instruction::Exe {
                        core: MAC_CORE,
                        func: activation.func_code(),
                    });
                    self.cycle = self.ledger.schedule_write(c_addr, self.cycle + 1)?;
                    self.instructions.push(Instruction::Write { addr: c_addr });
                }
            }
        }
        Ok(())
    }
}

impl Default for InstructionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(mapper: &MemoryMapper, name: &str, row: usize, col: usize) -> Result<MemoryAddress> {
    mapper.get_row_address(name, row, col).map_err(|_| {
        SchedulingError::AddressUnresolved {
            name: name.to_string(),
            row,
            col,
        }
        .into()
    })
}

/// Merge `[wr addr; exe func; wr addr]` windows into a single `rdwr addr`
///
/// Applies only under the exact condition of the fusion rule: the
/// nonlinearity immediately follows the accumulation write, targets the
/// same address, and nothing touches that address in between (guaranteed
/// by adjacency). One `EXE`/write pair disappears per fused element.
fn fuse_elementwise(instructions: &mut Vec<Instruction>, func: FuncCode) {
    let mut fused = Vec::with_capacity(instructions.len());
    let mut idx = 0;
    while idx < instructions.len() {
        if idx + 2 < instructions.len() {
            if let (
                Instruction::Write { addr: first },
                Instruction::Exe { func: exe_func, .. },
                Instruction::Write { addr: second },
            ) = (instructions[idx], instructions[idx + 1], instructions[idx + 2])
            {
                if exe_func == func && first == second {
                    fused.push(Instruction::ReadWrite { addr: first });
                    idx += 3;
                    continue;
                }
            }
        }
        fused.push(instructions[idx]);
        idx += 1;
    }
    *instructions = fused;
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Activation, MatrixSpec};
    use pimc_isa::Opcode;

    fn compile_stream(m: usize, k: usize, n: usize, activation: Option<Activation>) -> InstructionStream {
        let mut descriptor = MatmulDescriptor::new(
            MatrixSpec::new("A", m, k),
            MatrixSpec::new("B", k, n),
            MatrixSpec::new("C", m, n),
        );
        descriptor.activation = activation;

        let mut mapper = MemoryMapper::new();
        mapper.allocate_matrix("A", m, k).unwrap();
        mapper.allocate_matrix("B", k, n).unwrap();
        mapper.allocate_matrix("C", m, n).unwrap();

        InstructionGenerator::new().generate(&descriptor, &mapper).unwrap()
    }

    fn count_opcode(stream: &InstructionStream, opcode: Opcode) -> usize {
        stream.iter().filter(|instruction| instruction.opcode() == opcode).count()
    }

    #[test]
    fn test_instruction_count_formula_small() {
        // 1 PROG + M*N*(2K reads + K EXE + 1 write) + 1 END
        let stream = compile_stream(2, 2, 2, None);
        assert_eq!(stream.len(), 1 + 2 * 2 * (4 + 2 + 1) + 1);
        assert_eq!(count_opcode(&stream, Opcode::Read), 2 * 2 * 4);
        assert_eq!(count_opcode(&stream, Opcode::Exe), 2 * 2 * 2);
        assert_eq!(count_opcode(&stream, Opcode::Write), 2 * 2);
    }

    #[test]
    fn test_stream_begins_with_prog_and_ends_with_single_end() {
        let stream = compile_stream(3, 4, 5, None);
        assert_eq!(stream.instructions()[0].opcode(), Opcode::Prog);
        assert_eq!(stream.instructions().last().unwrap().opcode(), Opcode::End);
        assert_eq!(count_opcode(&stream, Opcode::End), 1);
    }

    #[test]
    fn test_prog_precedes_every_exe() {
        let stream = compile_stream(2, 3, 2, Some(Activation::Relu));
        let last_prog = stream
            .iter()
            .rposition(|instruction| instruction.opcode() == Opcode::Prog)
            .unwrap();
        let first_exe = stream
            .iter()
            .position(|instruction| instruction.opcode() == Opcode::Exe)
            .unwrap();
        assert!(last_prog < first_exe);
    }

    #[test]
    fn test_activation_fuses_into_read_modify_write() {
        let stream = compile_stream(2, 2, 2, Some(Activation::Relu));
        // Two PROGs, and every element's write fused to RDWR: the
        // per-element count matches the unactivated formula.
        assert_eq!(stream.len(), 2 + 2 * 2 * (4 + 2 + 1) + 1);
        assert_eq!(count_opcode(&stream, Opcode::ReadWrite), 4);
        assert_eq!(count_opcode(&stream, Opcode::Write), 0);
        assert_eq!(
            count_opcode(&stream, Opcode::Exe),
            2 * 2 * 2, // MAC only; the activation EXEs were fused away
        );
        assert_eq!(count_opcode(&stream, Opcode::Prog), 2);
    }

    #[test]
    fn test_fusion_requires_matching_address() {
        let a0 = MemoryAddress::new(0, 0, 0).unwrap();
        let a1 = MemoryAddress::new(0, 1, 0).unwrap();
        let mut instructions = vec![
            Instruction::Write { addr: a0 },
            Instruction::Exe {
                core: MAC_CORE,
                func: FuncCode::Relu,
            },
            Instruction::Write { addr: a1 },
        ];
        fuse_elementwise(&mut instructions, FuncCode::Relu);
        assert_eq!(instructions.len(), 3);
    }

    #[test]
    fn test_fusion_requires_matching_function() {
        let a0 = MemoryAddress::new(0, 0, 0).unwrap();
        let mut instructions = vec![
            Instruction::Write { addr: a0 },
            Instruction::Exe {
                core: MAC_CORE,
                func: FuncCode::Mac,
            },
            Instruction::Write { addr: a0 },
        ];
        fuse_elementwise(&mut instructions, FuncCode::Relu);
        assert_eq!(instructions.len(), 3);
    }

    #[test]
    fn test_reads_never_precede_writes_to_same_address() {
        let stream = compile_stream(4, 3, 4, Some(Activation::Tanh));
        let mut written = std::collections::HashSet::new();
        for instruction in &stream {
            match instruction {
                Instruction::Write { addr } | Instruction::ReadWrite { addr } => {
                    written.insert(addr.pack());
                }
                Instruction::Read { addr } => {
                    // Operand reads target A and B, which are never written
                    // inside the stream; any read of a written address would
                    // be a read-after-write violation in program order.
                    assert!(!written.contains(&addr.pack()));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let first = compile_stream(5, 4, 3, Some(Activation::Sigmoid));
        let second = compile_stream(5, 4, 3, Some(Activation::Sigmoid));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unallocated_operand_is_unresolved() {
        let descriptor = MatmulDescriptor::new(
            MatrixSpec::new("A", 2, 2),
            MatrixSpec::new("B", 2, 2),
            MatrixSpec::new("C", 2, 2),
        );
        let mut mapper = MemoryMapper::new();
        mapper.allocate_matrix("A", 2, 2).unwrap();
        mapper.allocate_matrix("C", 2, 2).unwrap();

        let err = InstructionGenerator::new().generate(&descriptor, &mapper).unwrap_err();
        assert_eq!(
            err,
            SchedulingError::AddressUnresolved {
                name: "B".to_string(),
                row: 0,
                col: 0,
            }
            .into()
        );
    }
}
