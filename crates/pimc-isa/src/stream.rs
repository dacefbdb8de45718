//! Instruction stream container
//!
//! An [`InstructionStream`] is the sole output artifact of the instruction
//! generator: an ordered sequence of instructions, immutable once built.
//! Streams can be serialized to binary with bincode for ahead-of-time
//! compilation and rehydrated for verification tooling.

use crate::error::Result;
use crate::instruction::Instruction;
use crate::word::{Word, WordFields};

/// Ordered, immutable-once-built instruction sequence
///
/// The constructor consumes the generator's buffer; there is no push or
/// mutation API afterwards, so a completed stream can never be partially
/// rewritten.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstructionStream {
    instructions: Vec<Instruction>,
}

impl InstructionStream {
    /// Seal a generated instruction sequence into a stream
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Instructions in emission order
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Iterate over the instructions in emission order
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Is the stream empty?
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Encode every instruction to its 24-bit word
    pub fn encode_all(&self) -> Result<Vec<Word>> {
        self.instructions.iter().map(Instruction::encode).collect()
    }

    /// Decoded structured view of every word, for verification tooling
    pub fn decoded_words(&self) -> Result<Vec<WordFields>> {
        self.encode_all()?.iter().map(|word| word.fields()).collect()
    }

    /// Serialize the stream to binary format
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize a stream from binary format
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

impl<'a> IntoIterator for &'a InstructionStream {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FuncCode, MemoryAddress};
    use crate::word::Opcode;

    fn sample_stream() -> InstructionStream {
        let addr = MemoryAddress::new(0, 7, 3).unwrap();
        InstructionStream::from_instructions(vec![
            Instruction::Prog {
                core: 0,
                func: FuncCode::Mac,
            },
            Instruction::Read { addr },
            Instruction::Exe {
                core: 0,
                func: FuncCode::Mac,
            },
            Instruction::Write { addr },
            Instruction::End,
        ])
    }

    #[test]
    fn test_stream_basic_accessors() {
        let stream = sample_stream();
        assert_eq!(stream.len(), 5);
        assert!(!stream.is_empty());
        assert_eq!(stream.instructions()[0].opcode(), Opcode::Prog);
        assert_eq!(stream.iter().count(), 5);
    }

    #[test]
    fn test_stream_encode_all() {
        let stream = sample_stream();
        let words = stream.encode_all().unwrap();
        assert_eq!(words.len(), stream.len());
        assert_eq!(words[1].fields().unwrap().address, 7);
        assert_eq!(words[4].fields().unwrap().opcode, Opcode::End);
    }

    #[test]
    fn test_stream_decoded_words_match_opcodes() {
        let stream = sample_stream();
        let decoded = stream.decoded_words().unwrap();
        for (instruction, fields) in stream.iter().zip(&decoded) {
            assert_eq!(instruction.opcode(), fields.opcode);
            assert_eq!(fields.reserved, 0);
        }
    }

    #[test]
    fn test_stream_bincode_roundtrip() {
        let stream = sample_stream();
        let bytes = stream.to_bytes().unwrap();
        let loaded = InstructionStream::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, stream);
    }

    #[test]
    fn test_empty_stream() {
        let stream = InstructionStream::from_instructions(Vec::new());
        assert!(stream.is_empty());
        assert!(stream.encode_all().unwrap().is_empty());
    }
}
