//! Site tensor assembly.
//!
//! Leg orders:
//! - head `(pb_in, rvb, pb_out)`
//! - center `(lvb, pb_in, pb_out, rvb)`
//! - tail `(pb_in, lvb, pb_out)`
//! - single site `(pb_in, pb_out)`

use tensor4all_qn::{QnIndex, QnScalar, QnTensor, QuantumNumber};

use crate::error::Result;
use crate::op_repr::OpRepr;
use crate::spar_mat::SparOpReprMat;

/// Realizes matrix entries through the interned labels and scatters them into
/// site tensors.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a, T, Q> {
    coefs: &'a [T],
    ops: &'a [QnTensor<T, Q>],
    elem_cutoff: f64,
}

impl<'a, T: QnScalar, Q: QuantumNumber> Assembler<'a, T, Q> {
    /// `coefs` and `ops` are the dense label → value mappings.
    pub fn new(coefs: &'a [T], ops: &'a [QnTensor<T, Q>], elem_cutoff: f64) -> Self {
        Self {
            coefs,
            ops,
            elem_cutoff,
        }
    }

    /// Write every element of `repr` above the cutoff; `place` maps the
    /// operator coordinates `(in, out)` to tensor coordinates.
    fn scatter<F>(&self, tensor: &mut QnTensor<T, Q>, repr: &OpRepr, place: F) -> Result<()>
    where
        F: Fn(usize, usize) -> Vec<usize>,
    {
        let local = repr.realize(self.coefs, self.ops)?;
        for (coords, value) in local.nonzero_elems() {
            if value.abs_f64() > self.elem_cutoff {
                tensor.set_elem(&place(coords[0], coords[1]), value)?;
            }
        }
        Ok(())
    }

    /// First site of a chain with at least two sites; only row 0 is used.
    pub fn assemble_head(
        &self,
        mat: &SparOpReprMat,
        pb_in: &QnIndex<Q>,
        rvb: &QnIndex<Q>,
        pb_out: &QnIndex<Q>,
    ) -> Result<QnTensor<T, Q>> {
        let mut tensor = QnTensor::new(vec![pb_in.clone(), rvb.clone(), pb_out.clone()]);
        for (y, repr) in mat.row(0) {
            self.scatter(&mut tensor, repr, |i, o| vec![i, y, o])?;
        }
        Ok(tensor)
    }

    /// Last site of a chain with at least two sites; only column 0 is used.
    pub fn assemble_tail(
        &self,
        mat: &SparOpReprMat,
        pb_in: &QnIndex<Q>,
        lvb: &QnIndex<Q>,
        pb_out: &QnIndex<Q>,
    ) -> Result<QnTensor<T, Q>> {
        let mut tensor = QnTensor::new(vec![pb_in.clone(), lvb.clone(), pb_out.clone()]);
        for (x, repr) in mat.column(0) {
            self.scatter(&mut tensor, repr, |i, o| vec![i, x, o])?;
        }
        Ok(tensor)
    }

    /// Interior site.
    pub fn assemble_center(
        &self,
        mat: &SparOpReprMat,
        lvb: &QnIndex<Q>,
        pb_in: &QnIndex<Q>,
        pb_out: &QnIndex<Q>,
        rvb: &QnIndex<Q>,
    ) -> Result<QnTensor<T, Q>> {
        let mut tensor = QnTensor::new(vec![
            lvb.clone(),
            pb_in.clone(),
            pb_out.clone(),
            rvb.clone(),
        ]);
        for ((x, y), repr) in mat.iter() {
            self.scatter(&mut tensor, repr, |i, o| vec![x, i, o, y])?;
        }
        Ok(tensor)
    }

    /// The only site of a one-site chain: the transition `(0, 0)`.
    pub fn assemble_single(
        &self,
        mat: &SparOpReprMat,
        pb_in: &QnIndex<Q>,
        pb_out: &QnIndex<Q>,
    ) -> Result<QnTensor<T, Q>> {
        let mut tensor = QnTensor::new(vec![pb_in.clone(), pb_out.clone()]);
        if let Some(repr) = mat.get(0, 0) {
            self.scatter(&mut tensor, repr, |i, o| vec![i, o])?;
        }
        Ok(tensor)
    }
}
