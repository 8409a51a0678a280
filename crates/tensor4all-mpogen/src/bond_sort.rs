//! Quantum-number sorting of virtual bonds.
//!
//! A transition `(x, y)` at a site carries the local operator `op`. For the
//! site tensor to keep divergence `zero_div`, the right-bond state `y` must
//! carry
//!
//! ```text
//! qn(y) = zero_div − div(op) + qn(x)
//! ```
//!
//! where `qn(x)` is the quantum number of the left-bond sector holding row
//! `x`. All transitions into one column must agree. Columns are then grouped
//! into sectors so that the right bond becomes a proper [`QnIndex`].

use tensor4all_qn::{Direction, QnIndex, QnScalar, QnSector, QnTensor, QuantumNumber};

use crate::error::{MpoGenError, Result};
use crate::op_repr::lookup_op;
use crate::spar_mat::SparOpReprMat;

/// Target quantum number of every column, `None` for columns without a
/// nonzero transition.
///
/// Summands whose operator stores no block contribute nothing and are
/// ignored.
pub fn column_target_qns<T: QnScalar, Q: QuantumNumber>(
    site: usize,
    mat: &SparOpReprMat,
    left_bond: &QnIndex<Q>,
    ops: &[QnTensor<T, Q>],
    zero_div: &Q,
) -> Result<Vec<Option<Q>>> {
    let mut targets: Vec<Option<Q>> = vec![None; mat.cols()];
    for ((x, y), repr) in mat.iter() {
        let left_qn = left_bond
            .coord_qn(x)
            .ok_or(MpoGenError::BondMismatch {
                site,
                row: x,
                dim: left_bond.dim(),
            })?
            .clone();
        for term in repr.terms() {
            let Some(div) = lookup_op(ops, term.op)?.div() else {
                continue;
            };
            let target = zero_div.clone() - div + left_qn.clone();
            match &targets[y] {
                Some(existing) if *existing != target => {
                    return Err(MpoGenError::QnMismatch {
                        site,
                        column: y,
                        expected: format!("{existing:?}"),
                        found: format!("{target:?}"),
                    });
                }
                Some(_) => {}
                None => targets[y] = Some(target),
            }
        }
    }
    Ok(targets)
}

/// Group the columns of `mat` by target quantum number.
///
/// Sectors are created in the order their quantum number is first met when
/// scanning columns left to right; later columns with the same quantum number
/// join that sector. Columns without a target are dropped. The columns of
/// `mat` are reordered in place, and the returned permutation (new column `k`
/// is old column `perm[k]`) must be applied to the rows of the next site.
pub fn sort_cols_by_qn<T: QnScalar, Q: QuantumNumber>(
    site: usize,
    mat: &mut SparOpReprMat,
    left_bond: &QnIndex<Q>,
    ops: &[QnTensor<T, Q>],
    zero_div: &Q,
) -> Result<(QnIndex<Q>, Vec<usize>)> {
    let targets = column_target_qns(site, mat, left_bond, ops, zero_div)?;

    let mut groups: Vec<(Q, Vec<usize>)> = Vec::new();
    for (col, target) in targets.into_iter().enumerate() {
        let Some(qn) = target else {
            continue;
        };
        match groups.iter_mut().find(|(q, _)| *q == qn) {
            Some((_, cols)) => cols.push(col),
            None => groups.push((qn, vec![col])),
        }
    }

    let sectors = groups
        .iter()
        .map(|(qn, cols)| QnSector::new(qn.clone(), cols.len()))
        .collect();
    let perm: Vec<usize> = groups.into_iter().flat_map(|(_, cols)| cols).collect();
    mat.transpose_cols(&perm);
    Ok((QnIndex::new(sectors, Direction::Out), perm))
}

/// Check the last site against its trivial right bond: every transition
/// must target `zero_div`.
pub fn check_last_site<T: QnScalar, Q: QuantumNumber>(
    site: usize,
    mat: &SparOpReprMat,
    left_bond: &QnIndex<Q>,
    ops: &[QnTensor<T, Q>],
    zero_div: &Q,
) -> Result<()> {
    let targets = column_target_qns(site, mat, left_bond, ops, zero_div)?;
    for (column, target) in targets.into_iter().enumerate() {
        match target {
            Some(qn) if qn != *zero_div => {
                return Err(MpoGenError::QnMismatch {
                    site,
                    column,
                    expected: format!("{zero_div:?}"),
                    found: format!("{qn:?}"),
                });
            }
            _ => {}
        }
    }
    Ok(())
}
