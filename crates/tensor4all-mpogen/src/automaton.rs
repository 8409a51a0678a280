//! Operator-string automaton.
//!
//! Every term is a path of [`SiteOpRepr`]s through the sites of the chain.
//! The automaton merges the paths into one finite-state machine whose states
//! live on the bonds between sites; the transitions crossing site `i` form
//! that site's [`SparOpReprMat`].

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::error::{MpoGenError, Result};
use crate::label::OpLabel;
use crate::op_repr::{OpPath, OpRepr, SiteOpRepr};
use crate::spar_mat::SparOpReprMat;

/// Accumulates operator strings and compresses them into per-site matrices.
pub trait OpStringAutomaton {
    /// Declare the identity operator label of every site.
    fn replace_id_op_labels(&mut self, labels: Vec<OpLabel>);

    /// Add the path of one term covering sites `head..=tail`.
    ///
    /// `path` has exactly `tail - head + 1` entries.
    fn add_path(&mut self, head: usize, tail: usize, path: OpPath) -> Result<()>;

    /// One transition matrix per site.
    ///
    /// Rows of matrix `i` are the states of bond `i`, columns the states of
    /// bond `i + 1`. The outermost bonds have one state each.
    fn gen_compressed_mat_repr(&self) -> Result<Vec<SparOpReprMat>>;
}

/// Automaton state on a bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FsmState {
    /// No operator of the term applied yet
    Ready,
    /// In-flight prefix-tree node
    Node(usize),
    /// Term completed
    Finished,
}

/// Prefix-tree automaton with suffix merging.
///
/// Paths are first inserted into a prefix tree. Bond `b` (left of site `b`)
/// then carries:
/// - `Ready` if `b == 0` or some term starts at a site `>= b`,
/// - one node per distinct term prefix crossing the bond,
/// - `Finished` if `b == N` or some term ends at a site `< b`,
///
/// in that order, nodes in creation order. Terms sharing their leading
/// coefficient and leading operators share nodes; terms sharing everything
/// but the last operator share the final transition, which then holds the
/// sum of their last operators.
///
/// [`gen_compressed_mat_repr`](OpStringAutomaton::gen_compressed_mat_repr)
/// afterwards merges, bond by bond from the right, every pair of states
/// with identical outgoing transitions. The incoming transitions of merged
/// states are summed, so `c1·A⊗B + c2·A⊗B` crosses its bond with a single
/// state entered through `c1·A + c2·A`.
#[derive(Debug, Clone)]
pub struct PrefixTreeFsm {
    n_sites: usize,
    id_labels: Vec<OpLabel>,
    /// Bond of every node, indexed by node id
    node_bonds: Vec<usize>,
    /// `(site, from, repr) -> node`
    edges: HashMap<(usize, FsmState, SiteOpRepr), usize>,
    /// `(site, from) -> sum of last operators`
    final_edges: BTreeMap<(usize, FsmState), OpRepr>,
    max_head: Option<usize>,
    min_tail: Option<usize>,
}

impl PrefixTreeFsm {
    /// Create an empty automaton for `n_sites` sites.
    pub fn new(n_sites: usize) -> Self {
        Self {
            n_sites,
            id_labels: Vec::new(),
            node_bonds: Vec::new(),
            edges: HashMap::new(),
            final_edges: BTreeMap::new(),
            max_head: None,
            min_tail: None,
        }
    }

    /// Number of sites.
    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    /// Number of in-flight states over all bonds.
    pub fn num_nodes(&self) -> usize {
        self.node_bonds.len()
    }

    fn has_ready(&self, bond: usize) -> bool {
        bond == 0 || self.max_head.is_some_and(|h| h >= bond)
    }

    fn has_finished(&self, bond: usize) -> bool {
        bond == self.n_sites || self.min_tail.is_some_and(|t| t < bond)
    }

    fn child(&mut self, site: usize, from: FsmState, repr: SiteOpRepr) -> FsmState {
        let next_id = self.node_bonds.len();
        let id = *self.edges.entry((site, from, repr)).or_insert(next_id);
        if id == next_id {
            self.node_bonds.push(site + 1);
        }
        FsmState::Node(id)
    }
}

impl OpStringAutomaton for PrefixTreeFsm {
    fn replace_id_op_labels(&mut self, labels: Vec<OpLabel>) {
        self.id_labels = labels;
    }

    fn add_path(&mut self, head: usize, tail: usize, path: OpPath) -> Result<()> {
        if head > tail || tail >= self.n_sites || path.len() != tail - head + 1 {
            return Err(MpoGenError::InvalidPath {
                head,
                tail,
                len: path.len(),
            });
        }

        let mut state = FsmState::Ready;
        for (site, repr) in (head..tail).zip(&path) {
            state = self.child(site, state, *repr);
        }
        let last = path[path.len() - 1];
        self.final_edges
            .entry((tail, state))
            .and_modify(|sum| sum.push(last))
            .or_insert_with(|| OpRepr::new(last));

        self.max_head = Some(self.max_head.map_or(head, |h| h.max(head)));
        self.min_tail = Some(self.min_tail.map_or(tail, |t| t.min(tail)));
        Ok(())
    }

    fn gen_compressed_mat_repr(&self) -> Result<Vec<SparOpReprMat>> {
        let n = self.n_sites;
        if self.id_labels.len() != n {
            return Err(MpoGenError::MissingIdentity {
                expected: n,
                got: self.id_labels.len(),
            });
        }

        // Position of every node inside its bond, after the ready state.
        let mut nodes_per_bond = vec![0usize; n + 1];
        let mut node_pos = Vec::with_capacity(self.node_bonds.len());
        for &bond in &self.node_bonds {
            node_pos.push(nodes_per_bond[bond]);
            nodes_per_bond[bond] += 1;
        }
        let dims: Vec<usize> = (0..=n)
            .map(|b| {
                usize::from(self.has_ready(b)) + nodes_per_bond[b] + usize::from(self.has_finished(b))
            })
            .collect();
        let pos = |bond: usize, state: FsmState| match state {
            FsmState::Ready => 0,
            FsmState::Node(id) => usize::from(self.has_ready(bond)) + node_pos[id],
            FsmState::Finished => dims[bond] - 1,
        };

        let mut mats: Vec<SparOpReprMat> =
            (0..n).map(|i| SparOpReprMat::new(dims[i], dims[i + 1])).collect();

        for (site, mat) in mats.iter_mut().enumerate() {
            let id = OpRepr::new(SiteOpRepr::op(self.id_labels[site]));
            if self.has_ready(site) && self.has_ready(site + 1) {
                mat.set(0, 0, id.clone());
            }
            if self.has_finished(site) {
                mat.set(
                    pos(site, FsmState::Finished),
                    pos(site + 1, FsmState::Finished),
                    id,
                );
            }
        }
        for (&(site, from, repr), &to) in &self.edges {
            mats[site].accumulate(pos(site, from), pos(site + 1, FsmState::Node(to)), repr);
        }
        for (&(site, from), sum) in &self.final_edges {
            mats[site].set(
                pos(site, from),
                pos(site + 1, FsmState::Finished),
                sum.clone(),
            );
        }
        merge_equivalent_states(&mut mats);
        Ok(mats)
    }
}

/// Outgoing transitions of one state, with every sum in canonical order.
type RowSignature = Vec<(usize, Vec<SiteOpRepr>)>;

fn row_signature(mat: &SparOpReprMat, x: usize) -> RowSignature {
    mat.row(x)
        .map(|(y, repr)| {
            let mut terms = repr.terms().to_vec();
            terms.sort_unstable();
            (y, terms)
        })
        .collect()
}

/// Merge the states of every inner bond whose outgoing transitions coincide.
///
/// Bonds are visited right to left, so the targets of bond `b` are already
/// merged when bond `b` is compared. The first state of each class is kept;
/// the incoming transitions of the others are added to its column.
fn merge_equivalent_states(mats: &mut [SparOpReprMat]) {
    for bond in (1..mats.len()).rev() {
        let (left, right) = mats.split_at_mut(bond);
        let (incoming, outgoing) = (&mut left[bond - 1], &mut right[0]);

        let mut classes: HashMap<RowSignature, usize> = HashMap::new();
        let mut keep = Vec::with_capacity(outgoing.rows());
        let mut merged = Vec::new();
        for x in 0..outgoing.rows() {
            match classes.entry(row_signature(outgoing, x)) {
                Entry::Occupied(rep) => merged.push((x, *rep.get())),
                Entry::Vacant(slot) => {
                    slot.insert(x);
                    keep.push(x);
                }
            }
        }
        if merged.is_empty() {
            continue;
        }

        for (state, rep) in merged {
            let moved: Vec<(usize, OpRepr)> = incoming
                .column(state)
                .map(|(x, repr)| (x, repr.clone()))
                .collect();
            for (x, repr) in moved {
                for &term in repr.terms() {
                    incoming.accumulate(x, rep, term);
                }
            }
        }
        incoming.transpose_cols(&keep);
        outgoing.transpose_rows(&keep);
    }
}
