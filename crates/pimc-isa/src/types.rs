//! Core types for the PIM target address space
//!
//! This module defines the target geometry and the fundamental types used
//! throughout the instruction set:
//! - Bank/row/column geometry constants
//! - Physical memory addresses and their canonical packed form
//! - LUT-core function codes

use crate::error::{EncodingError, Result};
use std::fmt;

// ================================================================================================
// Target Geometry
// ================================================================================================

/// Number of independent memory banks
pub const NUM_BANKS: u8 = 8;

/// Addressable rows per bank
pub const ROWS_PER_BANK: u16 = 512;

/// Columns per row
pub const COLS_PER_ROW: u8 = 64;

/// Compute clusters per bank
pub const CLUSTERS_PER_BANK: u8 = 8;

/// Memory operations (read + write combined) a bank can service per cycle
pub const BANK_OPS_PER_CYCLE: u8 = 2;

// Packed address layout: col occupies bits 0-5, row bits 6-18, bank bits 19+.
const COL_MASK: u32 = 0x3F;
const ROW_MASK: u32 = 0x1FFF;
const ROW_SHIFT: u32 = 6;
const BANK_SHIFT: u32 = 19;

// ================================================================================================
// Memory Addresses
// ================================================================================================

/// Physical address of one column within one row of one bank
///
/// The canonical packed form is `(bank << 19) | (row << 6) | col`. The row
/// field spans 13 bits but only values below [`ROWS_PER_BANK`] are legal;
/// construction and unpacking both reject anything wider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MemoryAddress {
    bank: u8,
    row: u16,
    col: u8,
}

impl MemoryAddress {
    /// Create a validated address
    ///
    /// # Errors
    ///
    /// Returns `FieldOverflow` when `bank >= 8`, `row >= 512`, or `col >= 64`.
    pub fn new(bank: u8, row: u16, col: u8) -> Result<Self> {
        if bank >= NUM_BANKS {
            return Err(EncodingError::FieldOverflow {
                field: "bank",
                value: bank as u32,
                max: NUM_BANKS as u32 - 1,
            });
        }
        if row >= ROWS_PER_BANK {
            return Err(EncodingError::FieldOverflow {
                field: "row",
                value: row as u32,
                max: ROWS_PER_BANK as u32 - 1,
            });
        }
        if col >= COLS_PER_ROW {
            return Err(EncodingError::FieldOverflow {
                field: "col",
                value: col as u32,
                max: COLS_PER_ROW as u32 - 1,
            });
        }
        Ok(Self { bank, row, col })
    }

    /// Bank index (0-7)
    pub const fn bank(self) -> u8 {
        self.bank
    }

    /// Row index within the bank (0-511)
    pub const fn row(self) -> u16 {
        self.row
    }

    /// Column index within the row (0-63)
    pub const fn col(self) -> u8 {
        self.col
    }

    /// Canonical packed form: `(bank << 19) | (row << 6) | col`
    pub const fn pack(self) -> u32 {
        ((self.bank as u32) << BANK_SHIFT) | ((self.row as u32) << ROW_SHIFT) | self.col as u32
    }

    /// Inverse of [`pack`](Self::pack)
    ///
    /// # Errors
    ///
    /// Returns `FieldOverflow` when the row field holds a value >= 512 (the
    /// 13-bit field is wider than the legal row range) or the bank bits
    /// exceed 7.
    pub fn unpack(value: u32) -> Result<Self> {
        let col = (value & COL_MASK) as u8;
        let row = ((value >> ROW_SHIFT) & ROW_MASK) as u16;
        let bank = value >> BANK_SHIFT;
        if bank >= NUM_BANKS as u32 {
            return Err(EncodingError::FieldOverflow {
                field: "bank",
                value: bank,
                max: NUM_BANKS as u32 - 1,
            });
        }
        Self::new(bank as u8, row, col)
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.bank, self.row, self.col)
    }
}

// ================================================================================================
// Function Codes
// ================================================================================================

/// Function code for the programmable LUT cores
///
/// A core must be configured with `PROG` before any `EXE` referencing the
/// function is legal. `Mac` is the multiply-accumulate primitive; the
/// activation codes configure the elementwise nonlinearity applied by a
/// fused read-modify-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FuncCode {
    Mac,
    Relu,
    Sigmoid,
    Tanh,
}

impl FuncCode {
    /// 6-bit wire encoding of this function code
    pub const fn bits(self) -> u16 {
        match self {
            FuncCode::Mac => 0x01,
            FuncCode::Relu => 0x02,
            FuncCode::Sigmoid => 0x03,
            FuncCode::Tanh => 0x04,
        }
    }

    /// Decode a 6-bit function code
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0x01 => Some(FuncCode::Mac),
            0x02 => Some(FuncCode::Relu),
            0x03 => Some(FuncCode::Sigmoid),
            0x04 => Some(FuncCode::Tanh),
            _ => None,
        }
    }
}

impl fmt::Display for FuncCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuncCode::Mac => write!(f, "mac"),
            FuncCode::Relu => write!(f, "relu"),
            FuncCode::Sigmoid => write!(f, "sigmoid"),
            FuncCode::Tanh => write!(f, "tanh"),
        }
    }
}

// ================================================================================================
// Tests
// ================================================================================================
