//! Dense storage for a single tensor block.

use mdarray::{DynRank, Shape, Tensor};

use crate::scalar::QnScalar;

/// Dense block data, wrapping mdarray's Tensor with dynamic rank.
///
/// Elements are laid out in row-major order; a multi-index inside the block
/// is called an *offset* to distinguish it from tensor coordinates.
#[derive(Debug, Clone)]
pub struct DenseBlock<T>(Tensor<T, DynRank>);

impl<T> DenseBlock<T> {
    /// Get the shape (dimensions) of the block.
    pub fn dims(&self) -> Vec<usize> {
        self.0.shape().with_dims(|d| d.to_vec())
    }

    /// Get the rank (number of dimensions).
    pub fn rank(&self) -> usize {
        self.0.rank()
    }

    /// Get the total number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the block is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get underlying data as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.0[..]
    }

    /// Get underlying data as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.0[..]
    }

    /// Row-major linear position of a block offset.
    pub fn linear_index(&self, offsets: &[usize]) -> usize {
        let dims = self.dims();
        debug_assert_eq!(dims.len(), offsets.len());
        offsets
            .iter()
            .zip(dims.iter())
            .fold(0, |acc, (&o, &d)| acc * d + o)
    }

    /// Block offset of a row-major linear position.
    pub fn offsets_of(&self, mut linear: usize) -> Vec<usize> {
        let dims = self.dims();
        let mut offsets = vec![0; dims.len()];
        for (axis, &d) in dims.iter().enumerate().rev() {
            offsets[axis] = linear % d;
            linear /= d;
        }
        offsets
    }
}

impl<T: QnScalar> DenseBlock<T> {
    /// Create a zero-filled block with the given shape.
    pub fn zeros(dims: &[usize]) -> Self {
        let len: usize = dims.iter().product();
        let tensor = Tensor::from(vec![T::zero(); len]).into_shape(DynRank::from_dims(dims));
        Self(tensor)
    }

    /// Get the element at a block offset.
    pub fn get(&self, offsets: &[usize]) -> T {
        self.0[self.linear_index(offsets)]
    }

    /// Set the element at a block offset.
    pub fn set(&mut self, offsets: &[usize], value: T) {
        let i = self.linear_index(offsets);
        self.0[i] = value;
    }

    /// Multiply every element by `factor`.
    pub fn scale(&self, factor: T) -> Self {
        let mut out = self.clone();
        for x in out.as_mut_slice() {
            *x = *x * factor;
        }
        out
    }

    /// Element-wise accumulation of a block with the same shape.
    pub fn add_assign_block(&mut self, other: &Self) {
        debug_assert_eq!(self.dims(), other.dims());
        for (a, b) in self.as_mut_slice().iter_mut().zip(other.as_slice()) {
            *a += *b;
        }
    }

    /// True if every element is zero.
    pub fn is_zero(&self) -> bool {
        self.as_slice().iter().all(|x| x.is_zero())
    }
}
