//! Serializers: pure consumers of a completed compilation
//!
//! Three thin, stateless transforms over the sealed stream:
//! - binary packing of consecutive 24-bit words
//! - assembly text, one mnemonic per line
//! - a JSON verification dump of the address table and decoded words

use crate::compiler::Compilation;
use crate::error::Result;
use crate::mapper::AllocationTable;
use pimc_isa::{InstructionStream, Word, WordFields};
use std::fmt::Write as _;

/// Pack the stream into consecutive 24-bit words, 3 little-endian bytes
/// each, with no inter-word padding
pub fn pack_binary(stream: &InstructionStream) -> Result<Vec<u8>> {
    let words = stream.encode_all()?;
    let mut bytes = Vec::with_capacity(words.len() * 3);
    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    Ok(bytes)
}

/// Rebuild the word sequence from its packed binary form
///
/// Returns `None` when the byte length is not a multiple of 3.
pub fn unpack_binary(bytes: &[u8]) -> Option<Vec<Word>> {
    if bytes.len() % 3 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(3)
            .map(|chunk| Word::from_le_bytes([chunk[0], chunk[1], chunk[2]]))
            .collect(),
    )
}

/// Render the stream as assembly text, one mnemonic per line
///
/// Memory operands print as `bank:row:col`; `PROG`/`EXE` print their core
/// and function code.
pub fn to_assembly(stream: &InstructionStream) -> String {
    let mut text = String::new();
    for instruction in stream {
        // Writing to a String cannot fail.
        let _ = writeln!(text, "{}", instruction);
    }
    text
}

#[derive(serde::Serialize)]
struct VerificationDump<'a> {
    table: &'a AllocationTable,
    words: Vec<WordFields>,
}

/// Dump the address table and decoded instruction words as pretty JSON,
/// for verification tooling
pub fn verification_dump(compilation: &Compilation) -> Result<String> {
    let dump = VerificationDump {
        table: &compilation.table,
        words: compilation.stream.decoded_words()?,
    };
    serde_json::to_string_pretty(&dump).map_err(|err| crate::error::CompileError::Serialization(err.to_string()))
}

// ================================================================================================
// Tests
// ================================================================================================
