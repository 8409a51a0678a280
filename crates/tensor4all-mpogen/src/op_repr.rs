//! Symbolic operator representations.
//!
//! - [`SiteOpRepr`]: one site of an operator string, `coef × op` or just `op`
//! - [`OpPath`]: the dense per-site sequence of one term
//! - [`OpRepr`]: an automaton transition, a sum of [`SiteOpRepr`]s

use tensor4all_qn::{QnScalar, QnTensor, QuantumNumber};

use crate::error::{MpoGenError, Result};
use crate::label::{CoefLabel, Label, OpLabel};

/// One site of an operator string.
///
/// Only the leading site of a term carries a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteOpRepr {
    /// Coefficient label, if this is the leading site of a term
    pub coef: Option<CoefLabel>,
    /// Operator label
    pub op: OpLabel,
}

impl SiteOpRepr {
    /// A bare operator.
    pub fn op(op: OpLabel) -> Self {
        Self { coef: None, op }
    }

    /// An operator carrying a coefficient.
    pub fn with_coef(coef: CoefLabel, op: OpLabel) -> Self {
        Self {
            coef: Some(coef),
            op,
        }
    }
}

/// Dense per-site sequence of one term, from its first to its last site.
pub type OpPath = Vec<SiteOpRepr>;

/// A nonzero automaton transition: the sum of one or more [`SiteOpRepr`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpRepr {
    terms: Vec<SiteOpRepr>,
}

impl OpRepr {
    /// A transition with a single summand.
    pub fn new(term: SiteOpRepr) -> Self {
        Self { terms: vec![term] }
    }

    /// Add a summand.
    pub fn push(&mut self, term: SiteOpRepr) {
        self.terms.push(term);
    }

    /// The summands, leading one first.
    pub fn terms(&self) -> &[SiteOpRepr] {
        &self.terms
    }

    /// Operator label of the leading summand.
    pub fn leading_op(&self) -> OpLabel {
        self.terms[0].op
    }

    /// Resolve the labels and compute `Σ coef × op`.
    pub fn realize<T: QnScalar, Q: QuantumNumber>(
        &self,
        coefs: &[T],
        ops: &[QnTensor<T, Q>],
    ) -> Result<QnTensor<T, Q>> {
        let (first, rest) = self
            .terms
            .split_first()
            .ok_or(MpoGenError::EmptyTerm)?;
        let mut acc = realize_term(first, coefs, ops)?;
        for term in rest {
            acc = acc.add(&realize_term(term, coefs, ops)?)?;
        }
        Ok(acc)
    }
}

fn realize_term<T: QnScalar, Q: QuantumNumber>(
    term: &SiteOpRepr,
    coefs: &[T],
    ops: &[QnTensor<T, Q>],
) -> Result<QnTensor<T, Q>> {
    let op = lookup_op(ops, term.op)?;
    match term.coef {
        Some(label) => {
            let coef = coefs
                .get(label.index())
                .ok_or(MpoGenError::UnknownLabel {
                    kind: "coefficient",
                    label: label.index(),
                })?;
            Ok(op.scale(*coef))
        }
        None => Ok(op.clone()),
    }
}

/// Resolve an operator label.
pub(crate) fn lookup_op<T, Q>(ops: &[QnTensor<T, Q>], label: OpLabel) -> Result<&QnTensor<T, Q>> {
    ops.get(label.index()).ok_or(MpoGenError::UnknownLabel {
        kind: "operator",
        label: label.index(),
    })
}
