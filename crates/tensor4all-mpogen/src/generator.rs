//! MPO generator.
//!
//! [`MpoGenerator`] collects a sum of operator strings (terms) and turns it
//! into a [`QnMpo`] whose site tensors conserve the quantum number of the
//! local Hilbert spaces.
//!
//! Each term is decomposed into a dense path of interned labels, with the
//! coefficient attached to the first site and identities filling the gaps.
//! The paths are merged by an [`OpStringAutomaton`]. [`MpoGenerator::gen`]
//! then walks the sites left to right: the rows of each transition matrix are
//! permuted to match the previous right bond, its columns are sorted into
//! quantum-number sectors, and the site tensor is assembled.

use log::{debug, trace};
use tensor4all_qn::{Direction, QnIndex, QnScalar, QnSector, QnTensor, QuantumNumber};

use crate::assemble::Assembler;
use crate::automaton::{OpStringAutomaton, PrefixTreeFsm};
use crate::bond_sort::{check_last_site, sort_cols_by_qn};
use crate::error::{MpoGenError, Result};
use crate::label::{CoefLabel, LabelConverter, OpLabel};
use crate::mpo::QnMpo;
use crate::op_repr::{OpPath, SiteOpRepr};
use crate::site::SiteVec;

/// Options for MPO generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MpoGenOptions {
    /// Realized elements with magnitude at or below this value are not
    /// written into the site tensors.
    pub elem_cutoff: f64,
}

impl Default for MpoGenOptions {
    fn default() -> Self {
        Self { elem_cutoff: 0.0 }
    }
}

impl MpoGenOptions {
    /// Set the element cutoff.
    pub fn with_elem_cutoff(mut self, elem_cutoff: f64) -> Self {
        self.elem_cutoff = elem_cutoff;
        self
    }
}

/// Insertion operator of a two-body term.
#[derive(Debug, Clone, Copy)]
pub enum Insertion<'a, T, Q> {
    /// No insertion
    None,
    /// On every site strictly between the two operators
    Uniform(&'a QnTensor<T, Q>),
    /// On the listed sites only
    AtSites(&'a QnTensor<T, Q>, &'a [usize]),
}

/// Builds a quantum-number conserving MPO from a sum of terms.
///
/// # Example
///
/// ```
/// use tensor4all_mpogen::{MpoGenerator, SiteVec};
/// use tensor4all_qn::{Direction, QnIndex, QnSector, QnTensor, U1Qn};
///
/// let pb = QnIndex::new(
///     vec![QnSector::new(U1Qn(1), 1), QnSector::new(U1Qn(-1), 1)],
///     Direction::Out,
/// );
/// let sz = QnTensor::<f64, U1Qn>::from_dense(
///     vec![pb.inverse(), pb.clone()],
///     &[0.5, 0.0, 0.0, -0.5],
/// )
/// .unwrap();
///
/// let sites = SiteVec::uniform(4, pb).unwrap();
/// let mut gen = MpoGenerator::new(&sites, U1Qn(0));
/// for i in 0..3 {
///     gen.add_term(1.0, &[sz.clone(), sz.clone()], &[i, i + 1]).unwrap();
/// }
/// let mpo = gen.gen().unwrap();
/// assert_eq!(mpo.len(), 4);
/// assert_eq!(mpo.max_bond_dim(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MpoGenerator<T, Q, A = PrefixTreeFsm> {
    n_sites: usize,
    zero_div: Q,
    pb_out: Vec<QnIndex<Q>>,
    pb_in: Vec<QnIndex<Q>>,
    id_ops: Vec<QnTensor<T, Q>>,
    id_op_labels: Vec<OpLabel>,
    op_labels: LabelConverter<QnTensor<T, Q>, OpLabel>,
    coef_labels: LabelConverter<T, CoefLabel>,
    fsm: A,
    options: MpoGenOptions,
    n_terms: usize,
}

impl<T: QnScalar, Q: QuantumNumber> MpoGenerator<T, Q, PrefixTreeFsm> {
    /// Generator for the chain `sites` whose MPO has divergence `zero_div`.
    ///
    /// `zero_div` must be the identity of `Q` (`Q::zero()`): every virtual
    /// bond starts from it and every site tensor ends up with it as its
    /// divergence. [`gen`](MpoGenerator::gen) rejects any other value.
    pub fn new(sites: &SiteVec<Q>, zero_div: Q) -> Self {
        Self::with_options(sites, zero_div, MpoGenOptions::default())
    }

    /// Generator with explicit options.
    pub fn with_options(sites: &SiteVec<Q>, zero_div: Q, options: MpoGenOptions) -> Self {
        Self::with_automaton(sites, zero_div, options, PrefixTreeFsm::new(sites.len()))
    }
}

impl<T: QnScalar, Q: QuantumNumber, A: OpStringAutomaton> MpoGenerator<T, Q, A> {
    /// Generator merging terms with a custom automaton.
    pub fn with_automaton(
        sites: &SiteVec<Q>,
        zero_div: Q,
        options: MpoGenOptions,
        mut fsm: A,
    ) -> Self {
        let pb_out = sites.sites().to_vec();
        let pb_in: Vec<QnIndex<Q>> = pb_out.iter().map(|pb| pb.inverse()).collect();
        let id_ops: Vec<QnTensor<T, Q>> = pb_out.iter().map(QnTensor::identity).collect();

        let mut op_labels = LabelConverter::new();
        let id_op_labels: Vec<OpLabel> = id_ops.iter().map(|id| op_labels.convert(id)).collect();
        fsm.replace_id_op_labels(id_op_labels.clone());

        Self {
            n_sites: sites.len(),
            zero_div,
            pb_out,
            pb_in,
            id_ops,
            id_op_labels,
            op_labels,
            coef_labels: LabelConverter::with_initial(T::one()),
            fsm,
            options,
            n_terms: 0,
        }
    }

    /// Number of sites.
    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    /// Identity operator of site `i`, legs `(pb_in, pb_out)`.
    pub fn id_op(&self, i: usize) -> &QnTensor<T, Q> {
        &self.id_ops[i]
    }

    /// Incoming physical index of site `i`.
    pub fn pb_in(&self, i: usize) -> &QnIndex<Q> {
        &self.pb_in[i]
    }

    /// Outgoing physical index of site `i`.
    pub fn pb_out(&self, i: usize) -> &QnIndex<Q> {
        &self.pb_out[i]
    }

    /// The options in use.
    pub fn options(&self) -> &MpoGenOptions {
        &self.options
    }

    /// Number of nonzero terms added so far.
    pub fn num_terms(&self) -> usize {
        self.n_terms
    }

    /// The automaton collecting the terms.
    pub fn automaton(&self) -> &A {
        &self.fsm
    }

    /// Add `coef × ops[0]@sites[0] × ops[1]@sites[1] × ...`.
    ///
    /// `sites` must be strictly ascending and inside the chain, and every
    /// operator must have the legs `(pb_in, pb_out)` of its site. A zero
    /// coefficient adds nothing.
    pub fn add_term(&mut self, coef: T, ops: &[QnTensor<T, Q>], sites: &[usize]) -> Result<()> {
        let ops: Vec<&QnTensor<T, Q>> = ops.iter().collect();
        self.add_term_refs(coef, &ops, sites)
    }

    /// Add a term with insertion operators between its physical operators.
    ///
    /// `inst_ops[k]` is placed between `phys_ops[k]` and `phys_ops[k + 1]`.
    /// With as many insertion operators as physical ones, the last insertion
    /// operator forms a string after the last physical operator, up to the
    /// end of the chain. Without `inst_sites` every site of a gap receives the
    /// insertion operator; otherwise gap `k` receives it on `inst_sites[k]`
    /// only, and the merged site list must still be strictly ascending.
    pub fn add_term_with_insertions(
        &mut self,
        coef: T,
        phys_ops: &[QnTensor<T, Q>],
        phys_sites: &[usize],
        inst_ops: &[QnTensor<T, Q>],
        inst_sites: Option<&[Vec<usize>]>,
    ) -> Result<()> {
        let phys: Vec<&QnTensor<T, Q>> = phys_ops.iter().collect();
        let inst: Vec<&QnTensor<T, Q>> = inst_ops.iter().collect();
        self.insert_term_refs(coef, &phys, phys_sites, &inst, inst_sites)
    }

    /// Add `coef × op@site`.
    pub fn add_one_body_term(&mut self, coef: T, op: &QnTensor<T, Q>, site: usize) -> Result<()> {
        self.add_term_refs(coef, &[op], &[site])
    }

    /// Add `coef × op1@site1 × op2@site2`, `site1 < site2`, with an optional
    /// insertion operator in between.
    pub fn add_two_body_term(
        &mut self,
        coef: T,
        op1: &QnTensor<T, Q>,
        site1: usize,
        op2: &QnTensor<T, Q>,
        site2: usize,
        insertion: Insertion<'_, T, Q>,
    ) -> Result<()> {
        if site2 <= site1 {
            return Err(MpoGenError::NotAscending {
                sites: vec![site1, site2],
            });
        }
        match insertion {
            Insertion::None => self.add_term_refs(coef, &[op1, op2], &[site1, site2]),
            Insertion::Uniform(inst) => {
                self.insert_term_refs(coef, &[op1, op2], &[site1, site2], &[inst], None)
            }
            Insertion::AtSites(inst, sites) => {
                let gaps = [sites.to_vec()];
                self.insert_term_refs(coef, &[op1, op2], &[site1, site2], &[inst], Some(&gaps))
            }
        }
    }

    fn insert_term_refs(
        &mut self,
        coef: T,
        phys_ops: &[&QnTensor<T, Q>],
        phys_sites: &[usize],
        inst_ops: &[&QnTensor<T, Q>],
        inst_sites: Option<&[Vec<usize>]>,
    ) -> Result<()> {
        let n_phys = phys_ops.len();
        if phys_sites.len() != n_phys {
            return Err(MpoGenError::LengthMismatch {
                what: "physical operators and sites",
                expected: n_phys,
                got: phys_sites.len(),
            });
        }
        if n_phys < 2 {
            return Err(MpoGenError::TooFewPhysicalOperators { got: n_phys });
        }
        if inst_ops.len() + 1 != n_phys && inst_ops.len() != n_phys {
            return Err(MpoGenError::InsertionCountMismatch {
                phys: n_phys,
                inst: inst_ops.len(),
            });
        }
        if let Some(lists) = inst_sites {
            if lists.len() != inst_ops.len() {
                return Err(MpoGenError::LengthMismatch {
                    what: "insertion operators and insertion site lists",
                    expected: inst_ops.len(),
                    got: lists.len(),
                });
            }
        }
        self.check_sites(phys_sites)?;

        let mut ops = Vec::new();
        let mut sites = Vec::new();
        for (k, (&op, &site)) in phys_ops.iter().zip(phys_sites).enumerate() {
            ops.push(op);
            sites.push(site);
            let Some(&inst) = inst_ops.get(k) else {
                continue;
            };
            let gap: Vec<usize> = match inst_sites {
                Some(lists) => lists[k].clone(),
                None => {
                    let end = phys_sites.get(k + 1).copied().unwrap_or(self.n_sites);
                    (site + 1..end).collect()
                }
            };
            for s in gap {
                ops.push(inst);
                sites.push(s);
            }
        }
        self.add_term_refs(coef, &ops, &sites)
    }

    /// Sites must be non-empty, strictly ascending and inside the chain.
    fn check_sites(&self, sites: &[usize]) -> Result<()> {
        if sites.is_empty() {
            return Err(MpoGenError::EmptyTerm);
        }
        if sites.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MpoGenError::NotAscending {
                sites: sites.to_vec(),
            });
        }
        let last = sites[sites.len() - 1];
        if last >= self.n_sites {
            return Err(MpoGenError::SiteOutOfRange {
                site: last,
                n_sites: self.n_sites,
            });
        }
        Ok(())
    }

    fn add_term_refs(&mut self, coef: T, ops: &[&QnTensor<T, Q>], sites: &[usize]) -> Result<()> {
        if ops.len() != sites.len() {
            return Err(MpoGenError::LengthMismatch {
                what: "operators and sites",
                expected: ops.len(),
                got: sites.len(),
            });
        }
        self.check_sites(sites)?;
        for (op, &site) in ops.iter().zip(sites) {
            let legs = op.indices();
            if legs.len() != 2 || legs[0] != self.pb_in[site] || legs[1] != self.pb_out[site] {
                return Err(MpoGenError::OperatorIndexMismatch { site });
            }
        }
        if coef.is_zero() {
            debug!("skipping term with zero coefficient on sites {sites:?}");
            return Ok(());
        }

        let head = sites[0];
        let tail = sites[sites.len() - 1];
        let coef_label = self.coef_labels.convert(&coef);
        let mut explicit = ops.iter().zip(sites).peekable();
        let mut path: OpPath = Vec::with_capacity(tail - head + 1);
        for site in head..=tail {
            let op = match explicit.next_if(|&(_, &s)| s == site) {
                Some((op, _)) => self.op_labels.convert(op),
                None => self.id_op_labels[site],
            };
            path.push(if site == head {
                SiteOpRepr::with_coef(coef_label, op)
            } else {
                SiteOpRepr::op(op)
            });
        }

        self.fsm.add_path(head, tail, path)?;
        self.n_terms += 1;
        trace!("added term on sites {head}..={tail} ({} explicit operators)", ops.len());
        Ok(())
    }

    /// Build the MPO, consuming the generator.
    pub fn gen(self) -> Result<QnMpo<T, Q>> {
        if !self.zero_div.is_zero() {
            return Err(MpoGenError::NonIdentityDivergence {
                found: format!("{:?}", self.zero_div),
            });
        }
        if self.n_terms == 0 {
            return Err(MpoGenError::NoTerms);
        }
        let n = self.n_sites;
        let mats = self.fsm.gen_compressed_mat_repr()?;
        if mats.len() != n {
            return Err(MpoGenError::LengthMismatch {
                what: "automaton matrices and sites",
                expected: n,
                got: mats.len(),
            });
        }

        let ops = self.op_labels.label_obj_mapping();
        let coefs = self.coef_labels.label_obj_mapping();
        let assembler = Assembler::new(coefs, ops, self.options.elem_cutoff);
        let zero_div = &self.zero_div;

        // Bond left of the current site, as seen from its left neighbour.
        let mut trans_vb = QnIndex::new(vec![QnSector::new(zero_div.clone(), 1)], Direction::Out);
        let mut perm: Vec<usize> = Vec::new();
        let mut tensors = Vec::with_capacity(n);

        for (site, mut mat) in mats.into_iter().enumerate() {
            if site > 0 {
                mat.transpose_rows(&perm);
            }
            let lvb = trans_vb.inverse();
            let (pb_in, pb_out) = (&self.pb_in[site], &self.pb_out[site]);

            if site == n - 1 {
                check_last_site(site, &mat, &lvb, ops, zero_div)?;
                let tensor = if n == 1 {
                    assembler.assemble_single(&mat, pb_in, pb_out)?
                } else {
                    assembler.assemble_tail(&mat, pb_in, &lvb, pb_out)?
                };
                tensors.push(tensor);
                break;
            }

            let (rvb, new_perm) = sort_cols_by_qn(site, &mut mat, &lvb, ops, zero_div)?;
            debug!("site {site}: right bond dimension {}", rvb.dim());
            let tensor = if site == 0 {
                assembler.assemble_head(&mat, pb_in, &rvb, pb_out)?
            } else {
                assembler.assemble_center(&mat, &lvb, pb_in, pb_out, &rvb)?
            };
            tensors.push(tensor);
            trans_vb = rvb;
            perm = new_perm;
        }

        Ok(QnMpo::new(tensors))
    }
}
