//! Generated matrix product operator.

use mdarray::DTensor;
use tensor4all_qn::{QnIndex, QnScalar, QnTensor, QuantumNumber};

use crate::error::{MpoGenError, Result};

/// A chain of quantum-number conserving site tensors.
///
/// Leg orders depend on the position in the chain:
/// - first site `(pb_in, rvb, pb_out)`
/// - interior sites `(lvb, pb_in, pb_out, rvb)`
/// - last site `(pb_in, lvb, pb_out)`
/// - a one-site chain `(pb_in, pb_out)`
#[derive(Debug, Clone)]
pub struct QnMpo<T, Q> {
    tensors: Vec<QnTensor<T, Q>>,
}

impl<T: QnScalar, Q: QuantumNumber> QnMpo<T, Q> {
    pub(crate) fn new(tensors: Vec<QnTensor<T, Q>>) -> Self {
        Self { tensors }
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Check if the chain has no sites.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Site tensor at position `i`.
    pub fn site_tensor(&self, i: usize) -> &QnTensor<T, Q> {
        &self.tensors[i]
    }

    /// All site tensors.
    pub fn site_tensors(&self) -> &[QnTensor<T, Q>] {
        &self.tensors
    }

    /// Hand the site tensors over to the caller.
    pub fn into_tensors(self) -> Vec<QnTensor<T, Q>> {
        self.tensors
    }

    /// Right virtual bond of site `i`, `None` for the last site.
    pub fn right_bond(&self, i: usize) -> Option<&QnIndex<Q>> {
        let n = self.len();
        if i + 1 >= n {
            return None;
        }
        let legs = self.tensors[i].indices();
        if i == 0 {
            legs.get(1)
        } else {
            legs.get(3)
        }
    }

    /// Dimension of every virtual bond, left to right.
    pub fn bond_dims(&self) -> Vec<usize> {
        (0..self.len().saturating_sub(1))
            .map(|i| self.right_bond(i).map_or(0, |b| b.dim()))
            .collect()
    }

    /// Largest virtual bond dimension (0 for a one-site chain).
    pub fn max_bond_dim(&self) -> usize {
        self.bond_dims().into_iter().max().unwrap_or(0)
    }

    /// Contract the whole chain into a dense matrix.
    ///
    /// Rows are the combined input multi-index, columns the combined output
    /// multi-index, with site 0 most significant.
    pub fn to_dense(&self) -> Result<DTensor<T, 2>> {
        if self.is_empty() {
            return Err(MpoGenError::Empty);
        }
        let n = self.len();

        // acc[[in, out, bond]] over the sites contracted so far
        let mut acc = DTensor::<T, 3>::from_fn([1, 1, 1], |_| T::one());
        let (mut rows, mut cols, mut bond) = (1usize, 1usize, 1usize);

        for (i, tensor) in self.tensors.iter().enumerate() {
            let shape = tensor.shape();
            // (left, in, out, right) position of each leg
            let (d, right_dim) = match (i, n) {
                (_, 1) => (shape[0], 1),
                (0, _) => (shape[0], shape[1]),
                (i, n) if i == n - 1 => (shape[0], 1),
                _ => (shape[1], shape[3]),
            };
            let mut next =
                DTensor::<T, 3>::from_fn([rows * d, cols * d, right_dim], |_| T::zero());
            for (coords, value) in tensor.nonzero_elems() {
                let (l, pi, po, r) = match (i, n) {
                    (_, 1) => (0, coords[0], coords[1], 0),
                    (0, _) => (0, coords[0], coords[2], coords[1]),
                    (i, n) if i == n - 1 => (coords[1], coords[0], coords[2], 0),
                    _ => (coords[0], coords[1], coords[2], coords[3]),
                };
                if l >= bond {
                    continue;
                }
                for a in 0..rows {
                    for b in 0..cols {
                        let prev = acc[[a, b, l]];
                        if prev.is_zero() {
                            continue;
                        }
                        next[[a * d + pi, b * d + po, r]] += prev * value;
                    }
                }
            }
            acc = next;
            rows *= d;
            cols *= d;
            bond = right_dim;
        }

        Ok(DTensor::<T, 2>::from_fn([rows, cols], |idx| acc[[idx[0], idx[1], 0]]))
    }
}
