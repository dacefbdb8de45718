//! Error types for instruction encoding and decoding

/// Result type for encoding operations
pub type Result<T> = std::result::Result<T, EncodingError>;

/// Errors that can occur when packing or unpacking instruction words
///
/// A correctly functioning memory mapper never produces a row outside the
/// 9-bit address field, so `FieldOverflow` during compilation indicates an
/// internal invariant violation rather than a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// A field value does not fit its bit width
    #[error("field overflow: {field} value {value} exceeds maximum {max}")]
    FieldOverflow {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// An opcode/flag combination outside the seven defined mnemonics
    #[error("undefined opcode: op={op:#04x} rd={rd} wr={wr}")]
    UndefinedOpcode { op: u8, rd: bool, wr: bool },
}
