//! Block-sparse tensors over quantum-number indices.

use std::collections::BTreeMap;

use crate::error::{QnError, Result};
use crate::index::QnIndex;
use crate::qn::QuantumNumber;
use crate::scalar::QnScalar;
use crate::storage::DenseBlock;

/// Block key: one sector position per leg.
pub type BlockKey = Vec<usize>;

/// A block-sparse tensor.
///
/// Every leg is a [`QnIndex`]; the tensor is partitioned into blocks by the
/// sectors of its legs, and only blocks that were written are stored. All
/// stored blocks share one divergence (`Σ_out qn − Σ_in qn`), which is fixed
/// by the first nonzero write.
#[derive(Debug, Clone)]
pub struct QnTensor<T, Q> {
    indices: Vec<QnIndex<Q>>,
    /// Non-zero blocks, ordered by block key.
    blocks: BTreeMap<BlockKey, DenseBlock<T>>,
    /// Divergence shared by the stored blocks.
    div: Option<Q>,
}

impl<T: QnScalar, Q: QuantumNumber> QnTensor<T, Q> {
    /// Create an all-zero tensor with the given legs.
    pub fn new(indices: Vec<QnIndex<Q>>) -> Self {
        Self {
            indices,
            blocks: BTreeMap::new(),
            div: None,
        }
    }

    /// Identity operator on `index`.
    ///
    /// The legs are `(index.inverse(), index)` and the diagonal is one.
    pub fn identity(index: &QnIndex<Q>) -> Self {
        let mut id = Self::new(vec![index.inverse(), index.clone()]);
        // Diagonal blocks all have zero divergence.
        for (pos, sector) in index.sectors().iter().enumerate() {
            let mut block = DenseBlock::zeros(&[sector.dim, sector.dim]);
            for k in 0..sector.dim {
                block.set(&[k, k], T::one());
            }
            id.blocks.insert(vec![pos, pos], block);
        }
        if !id.blocks.is_empty() {
            id.div = Some(Q::zero());
        }
        id
    }

    /// Build a tensor from row-major dense data over its full shape.
    ///
    /// Zero entries are not stored; nonzero entries must respect a common
    /// divergence.
    pub fn from_dense(indices: Vec<QnIndex<Q>>, data: &[T]) -> Result<Self> {
        let mut tensor = Self::new(indices);
        let shape = tensor.shape();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(QnError::DataLengthMismatch {
                expected,
                got: data.len(),
            });
        }
        for (linear, &value) in data.iter().enumerate() {
            if value.is_zero() {
                continue;
            }
            let mut coords = vec![0; shape.len()];
            let mut rest = linear;
            for (axis, &d) in shape.iter().enumerate().rev() {
                coords[axis] = rest % d;
                rest /= d;
            }
            tensor.set_elem(&coords, value)?;
        }
        Ok(tensor)
    }

    /// The legs of the tensor.
    pub fn indices(&self) -> &[QnIndex<Q>] {
        &self.indices
    }

    /// Number of legs.
    pub fn rank(&self) -> usize {
        self.indices.len()
    }

    /// Dimension of every leg.
    pub fn shape(&self) -> Vec<usize> {
        self.indices.iter().map(|i| i.dim()).collect()
    }

    /// Number of stored blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Divergence of the stored blocks; `None` when nothing is stored.
    pub fn div(&self) -> Option<Q> {
        self.div.clone()
    }

    /// Divergence a block with the given key would have.
    pub fn block_div(&self, key: &[usize]) -> Q {
        self.indices
            .iter()
            .zip(key)
            .fold(Q::zero(), |acc, (index, &pos)| acc + index.signed_qn(pos))
    }

    /// Split coordinates into a block key and offsets inside the block.
    fn locate(&self, coords: &[usize]) -> Result<(BlockKey, Vec<usize>)> {
        if coords.len() != self.rank() {
            return Err(QnError::RankMismatch {
                expected: self.rank(),
                got: coords.len(),
            });
        }
        let mut key = Vec::with_capacity(coords.len());
        let mut offsets = Vec::with_capacity(coords.len());
        for (axis, (index, &coord)) in self.indices.iter().zip(coords).enumerate() {
            let (pos, off) = index
                .coord_sector(coord)
                .ok_or(QnError::CoordOutOfRange {
                    axis,
                    coord,
                    dim: index.dim(),
                })?;
            key.push(pos);
            offsets.push(off);
        }
        Ok((key, offsets))
    }

    fn block_dims(&self, key: &[usize]) -> Vec<usize> {
        self.indices
            .iter()
            .zip(key)
            .map(|(index, &pos)| index.sectors()[pos].dim)
            .collect()
    }

    /// Read the element at `coords` (zero inside unstored blocks).
    pub fn elem(&self, coords: &[usize]) -> Result<T> {
        let (key, offsets) = self.locate(coords)?;
        Ok(self
            .blocks
            .get(&key)
            .map_or(T::zero(), |block| block.get(&offsets)))
    }

    /// Write the element at `coords`.
    ///
    /// Writing zero into an unstored block is a no-op. Creating a block whose
    /// divergence differs from the stored blocks fails with
    /// [`QnError::DivergenceMismatch`].
    pub fn set_elem(&mut self, coords: &[usize], value: T) -> Result<()> {
        let (key, offsets) = self.locate(coords)?;
        if let Some(block) = self.blocks.get_mut(&key) {
            block.set(&offsets, value);
            return Ok(());
        }
        if value.is_zero() {
            return Ok(());
        }
        self.ensure_div(&key)?;
        let mut block = DenseBlock::zeros(&self.block_dims(&key));
        block.set(&offsets, value);
        self.blocks.insert(key, block);
        Ok(())
    }

    fn ensure_div(&mut self, key: &[usize]) -> Result<()> {
        let div = self.block_div(key);
        match &self.div {
            Some(existing) if *existing != div => Err(QnError::DivergenceMismatch {
                expected: format!("{existing:?}"),
                got: format!("{div:?}"),
            }),
            Some(_) => Ok(()),
            None => {
                self.div = Some(div);
                Ok(())
            }
        }
    }

    /// Every stored nonzero element as `(coords, value)`, in block-key order.
    pub fn nonzero_elems(&self) -> Vec<(Vec<usize>, T)> {
        let mut out = Vec::new();
        for (key, block) in &self.blocks {
            let starts: Vec<usize> = self
                .indices
                .iter()
                .zip(key)
                .map(|(index, &pos)| index.sector_offset(pos))
                .collect();
            for (linear, &value) in block.as_slice().iter().enumerate() {
                if value.is_zero() {
                    continue;
                }
                let coords = block
                    .offsets_of(linear)
                    .into_iter()
                    .zip(&starts)
                    .map(|(off, &start)| start + off)
                    .collect();
                out.push((coords, value));
            }
        }
        out
    }

    /// Multiply every element by `factor`, returning a new tensor.
    pub fn scale(&self, factor: T) -> Self {
        Self {
            indices: self.indices.clone(),
            blocks: self
                .blocks
                .iter()
                .map(|(key, block)| (key.clone(), block.scale(factor)))
                .collect(),
            div: self.div.clone(),
        }
    }

    /// Element-wise sum of two tensors with the same legs.
    pub fn add(&self, other: &Self) -> Result<Self> {
        if self.indices != other.indices {
            return Err(QnError::IndexMismatch {
                message: "cannot add tensors with different indices".to_string(),
            });
        }
        let mut out = self.clone();
        for (key, block) in &other.blocks {
            if let Some(existing) = out.blocks.get_mut(key) {
                existing.add_assign_block(block);
            } else {
                out.ensure_div(key)?;
                out.blocks.insert(key.clone(), block.clone());
            }
        }
        Ok(out)
    }
}

impl<T: QnScalar, Q: QuantumNumber> PartialEq for QnTensor<T, Q> {
    /// Same legs and the same element values; unstored blocks count as zero.
    fn eq(&self, other: &Self) -> bool {
        if self.indices != other.indices {
            return false;
        }
        let matches = |a: &BTreeMap<BlockKey, DenseBlock<T>>,
                       b: &BTreeMap<BlockKey, DenseBlock<T>>| {
            a.iter().all(|(key, block)| match b.get(key) {
                Some(other_block) => block.as_slice() == other_block.as_slice(),
                None => block.is_zero(),
            })
        };
        matches(&self.blocks, &other.blocks) && matches(&other.blocks, &self.blocks)
    }
}
