//! Scalar trait for quantum-number tensors.
//!
//! This module defines the `QnScalar` trait that abstracts over f64 and Complex64
//! for block-sparse tensor elements.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use num_complex::Complex64;
use num_traits::{One, Zero};

/// Trait for scalar types stored in [`QnTensor`](crate::QnTensor) blocks.
pub trait QnScalar:
    Clone
    + Copy
    + Debug
    + Default
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + Send
    + Sync
    + 'static
{
    /// Absolute value (modulus for complex types) as f64.
    fn abs_f64(&self) -> f64;
}

impl QnScalar for f64 {
    fn abs_f64(&self) -> f64 {
        self.abs()
    }
}

impl QnScalar for Complex64 {
    fn abs_f64(&self) -> f64 {
        self.norm()
    }
}
