//! Program descriptor consumed from the frontend
//!
//! The descriptor names the three matrices of a dense multiplication
//! `C = A x B` with their dimensions. Iteration order is fixed row-major:
//! `i` over C's rows, `j` over C's columns, `k` over the reduction
//! dimension.

use crate::error::{CompileError, Result};
use pimc_isa::FuncCode;

/// Name and logical dimensions of one matrix
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatrixSpec {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
}

impl MatrixSpec {
    /// Create a matrix spec
    pub fn new(name: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            name: name.into(),
            rows,
            cols,
        }
    }
}

/// Elementwise nonlinearity applied to the output matrix
///
/// When present, the generator fuses the activation into the accumulation
/// write of each output element (a read-modify-write against the
/// LUT-programmed function).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// LUT function code configuring this activation
    pub const fn func_code(self) -> FuncCode {
        match self {
            Activation::Relu => FuncCode::Relu,
            Activation::Sigmoid => FuncCode::Sigmoid,
            Activation::Tanh => FuncCode::Tanh,
        }
    }
}

/// Descriptor of one matmul compilation: `C = A x B`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatmulDescriptor {
    pub a: MatrixSpec,
    pub b: MatrixSpec,
    pub c: MatrixSpec,
    pub activation: Option<Activation>,
}

impl MatmulDescriptor {
    /// Create a descriptor without activation
    pub fn new(a: MatrixSpec, b: MatrixSpec, c: MatrixSpec) -> Self {
        Self {
            a,
            b,
            c,
            activation: None,
        }
    }

    /// Attach a fused output activation
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    /// Rows of A and C
    pub fn m(&self) -> usize {
        self.a.rows
    }

    /// Reduction dimension (columns of A, rows of B)
    pub fn k(&self) -> usize {
        self.a.cols
    }

    /// Columns of B and C
    pub fn n(&self) -> usize {
        self.b.cols
    }

    /// Check that the three shapes form a well-defined multiplication
    ///
    /// # Errors
    ///
    /// Returns `InvalidDescriptor` for empty or duplicate names, zero
    /// dimensions, or inconsistent shapes.
    pub fn validate(&self) -> Result<()> {
        for spec in [&self.a, &self.b, &self.c] {
            if spec.name.is_empty() {
                return Err(CompileError::InvalidDescriptor("empty matrix name".to_string()));
            }
            if spec.rows == 0 || spec.cols == 0 {
                return Err(CompileError::InvalidDescriptor(format!(
                    "matrix '{}' has zero dimension ({}x{})",
                    spec.name, spec.rows, spec.cols
                )));
            }
        }
        if self.a.name == self.b.name || self.a.name == self.c.name || self.b.name == self.c.name {
            return Err(CompileError::InvalidDescriptor(format!(
                "matrix names must be distinct: '{}', '{}', '{}'",
                self.a.name, self.b.name, self.c.name
            )));
        }
        if self.a.cols != self.b.rows {
            return Err(CompileError::InvalidDescriptor(format!(
                "reduction mismatch: '{}' is {}x{} but '{}' is {}x{}",
                self.a.name, self.a.rows, self.a.cols, self.b.name, self.b.rows, self.b.cols
            )));
        }
        if self.c.rows != self.a.rows || self.c.cols != self.b.cols {
            return Err(CompileError::InvalidDescriptor(format!(
                "output shape mismatch: '{}' is {}x{}, expected {}x{}",
                self.c.name, self.c.rows, self.c.cols, self.a.rows, self.b.cols
            )));
        }
        Ok(())
    }
}

// ================================================================================================
// Tests
// ================================================================================================
