//! Sparse matrix of operator representations.

use std::collections::BTreeMap;

use crate::op_repr::{OpRepr, SiteOpRepr};

/// One site's automaton transitions.
///
/// Rows are the states of the bond left of the site, columns the states of
/// the bond right of it. Only nonzero transitions are stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparOpReprMat {
    rows: usize,
    cols: usize,
    entries: BTreeMap<(usize, usize), OpRepr>,
}

impl SparOpReprMat {
    /// Create an empty `rows × cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: BTreeMap::new(),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Entry at `(x, y)`, if nonzero.
    pub fn get(&self, x: usize, y: usize) -> Option<&OpRepr> {
        self.entries.get(&(x, y))
    }

    /// Replace the entry at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the matrix.
    pub fn set(&mut self, x: usize, y: usize, repr: OpRepr) {
        assert!(
            x < self.rows && y < self.cols,
            "entry ({x}, {y}) outside {}x{} matrix",
            self.rows,
            self.cols
        );
        self.entries.insert((x, y), repr);
    }

    /// Add a summand to the entry at `(x, y)`, creating it if needed.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the matrix.
    pub fn accumulate(&mut self, x: usize, y: usize, term: SiteOpRepr) {
        match self.entries.get_mut(&(x, y)) {
            Some(repr) => repr.push(term),
            None => self.set(x, y, OpRepr::new(term)),
        }
    }

    /// Nonzero entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &OpRepr)> + '_ {
        self.entries.iter().map(|(&pos, repr)| (pos, repr))
    }

    /// Nonzero entries of row `x`, by column.
    pub fn row(&self, x: usize) -> impl Iterator<Item = (usize, &OpRepr)> + '_ {
        self.entries
            .range((x, 0)..(x + 1, 0))
            .map(|(&(_, y), repr)| (y, repr))
    }

    /// Nonzero entries of column `y`, by row.
    pub fn column(&self, y: usize) -> impl Iterator<Item = (usize, &OpRepr)> + '_ {
        self.entries
            .iter()
            .filter(move |(pos, _)| pos.1 == y)
            .map(|(&(x, _), repr)| (x, repr))
    }

    /// Reorder rows so that new row `k` is old row `perm[k]`.
    ///
    /// Rows not listed in `perm` are dropped.
    pub fn transpose_rows(&mut self, perm: &[usize]) {
        let new_pos = inverse_perm(perm, self.rows);
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .filter_map(|((x, y), repr)| new_pos[x].map(|k| ((k, y), repr)))
            .collect();
        self.rows = perm.len();
    }

    /// Reorder columns so that new column `k` is old column `perm[k]`.
    ///
    /// Columns not listed in `perm` are dropped.
    pub fn transpose_cols(&mut self, perm: &[usize]) {
        let new_pos = inverse_perm(perm, self.cols);
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .filter_map(|((x, y), repr)| new_pos[y].map(|k| ((x, k), repr)))
            .collect();
        self.cols = perm.len();
    }
}

/// `result[old] = Some(new)` for every position listed in `perm`.
fn inverse_perm(perm: &[usize], len: usize) -> Vec<Option<usize>> {
    let mut result = vec![None; len];
    for (new, &old) in perm.iter().enumerate() {
        assert!(old < len, "permutation entry {old} out of range {len}");
        result[old] = Some(new);
    }
    result
}
