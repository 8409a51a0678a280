//! Integration tests for tensor4all-mpogen
//!
//! Tests cover:
//! - Term decomposition (dense paths, coefficient placement, insertions)
//! - Zero-coefficient terms and duplicate terms
//! - End-to-end MPOs against brute-force dense Hamiltonians
//! - Quantum-number conservation for U(1), Z2 and U(1)×U(1) charges
//! - Both f64 and Complex64 coefficients

use mdarray::DTensor;
use num_complex::Complex64;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tensor4all_mpogen::{
    Insertion, MpoGenError, MpoGenOptions, MpoGenerator, OpLabel, OpPath, OpStringAutomaton,
    PrefixTreeFsm, SiteVec, SparOpReprMat,
};
use tensor4all_qn::{
    Direction, QnIndex, QnPair, QnScalar, QnSector, QnTensor, QuantumNumber, U1Qn, ZnQn,
};

/// Test helper module for building local operators and dense references
mod test_helpers {
    use super::*;

    /// A local operator, both as a block-sparse tensor and as row-major
    /// `[in, out]` dense data.
    pub struct LocalOp<T, Q> {
        pub tensor: QnTensor<T, Q>,
        pub data: Vec<T>,
    }

    impl<T: QnScalar, Q: QuantumNumber> LocalOp<T, Q> {
        pub fn new(pb: &QnIndex<Q>, data: Vec<T>) -> Self {
            let tensor = QnTensor::from_dense(vec![pb.inverse(), pb.clone()], &data).unwrap();
            Self { tensor, data }
        }
    }

    /// `a ∘ b`: apply `b`, then `a`.
    pub fn compose<T: QnScalar>(a: &[T], b: &[T], d: usize) -> Vec<T> {
        let mut out = vec![T::zero(); d * d];
        for i in 0..d {
            for o in 0..d {
                for m in 0..d {
                    out[i * d + o] += b[i * d + m] * a[m * d + o];
                }
            }
        }
        out
    }

    /// Transpose of row-major `[in, out]` data.
    pub fn transpose<T: QnScalar>(a: &[T], d: usize) -> Vec<T> {
        (0..d * d).map(|k| a[(k % d) * d + k / d]).collect()
    }

    /// Brute-force dense operator on `n` sites of dimension `d`, indexed
    /// `[combined in, combined out]` with site 0 most significant.
    pub struct Reference<T> {
        pub n: usize,
        pub d: usize,
        pub dense: DTensor<T, 2>,
    }

    impl<T: QnScalar> Reference<T> {
        pub fn new(n: usize, d: usize) -> Self {
            let total = d.pow(n as u32);
            Self {
                n,
                d,
                dense: DTensor::<T, 2>::from_fn([total, total], |_| T::zero()),
            }
        }

        /// Add `coef × ⊗ ops`, identity on the sites not listed.
        pub fn add<Q>(&mut self, coef: T, ops: &[(usize, &LocalOp<T, Q>)]) {
            let (n, d) = (self.n, self.d);
            let total = d.pow(n as u32);
            for row in 0..total {
                for col in 0..total {
                    let mut value = coef;
                    for site in 0..n {
                        let shift = d.pow((n - 1 - site) as u32);
                        let (i, o) = ((row / shift) % d, (col / shift) % d);
                        let elem = match ops.iter().find(|(s, _)| *s == site) {
                            Some((_, op)) => op.data[i * d + o],
                            None if i == o => T::one(),
                            None => T::zero(),
                        };
                        value = value * elem;
                        if value.is_zero() {
                            break;
                        }
                    }
                    self.dense[[row, col]] += value;
                }
            }
        }
    }

    pub fn assert_dense_close<T: QnScalar>(a: &DTensor<T, 2>, b: &DTensor<T, 2>, tol: f64) {
        assert_eq!((a.dim(0), a.dim(1)), (b.dim(0), b.dim(1)));
        for i in 0..a.dim(0) {
            for j in 0..a.dim(1) {
                let diff = (a[[i, j]] - b[[i, j]]).abs_f64();
                assert!(
                    diff < tol,
                    "mismatch at ({i}, {j}): {:?} vs {:?}",
                    a[[i, j]],
                    b[[i, j]]
                );
            }
        }
    }

    /// Coordinate of `site` inside a combined index.
    pub fn digit(combined: usize, site: usize, n: usize, d: usize) -> usize {
        (combined / d.pow((n - 1 - site) as u32)) % d
    }

    pub fn random_coef(rng: &mut impl Rng) -> f64 {
        rng.gen::<f64>() * 2.0 - 1.0
    }

    // ========================================================================
    // Local Hilbert spaces
    // ========================================================================

    /// Spin 1/2 with 2Sz: |up> = +1, |down> = -1.
    pub fn spin_half() -> QnIndex<U1Qn> {
        QnIndex::new(
            vec![QnSector::new(U1Qn(1), 1), QnSector::new(U1Qn(-1), 1)],
            Direction::Out,
        )
    }

    pub struct SpinOps<T> {
        pub sz: LocalOp<T, U1Qn>,
        pub sp: LocalOp<T, U1Qn>,
        pub sm: LocalOp<T, U1Qn>,
    }

    pub fn spin_ops<T: QnScalar + From<f64>>() -> SpinOps<T> {
        let pb = spin_half();
        let f = |x: f64| T::from(x);
        SpinOps {
            sz: LocalOp::new(&pb, vec![f(0.5), f(0.0), f(0.0), f(-0.5)]),
            sp: LocalOp::new(&pb, vec![f(0.0), f(0.0), f(1.0), f(0.0)]),
            sm: LocalOp::new(&pb, vec![f(0.0), f(1.0), f(0.0), f(0.0)]),
        }
    }

    /// Spinless fermion mode: |0> with N = 0, |1> with N = 1.
    pub fn fermion_site() -> QnIndex<U1Qn> {
        QnIndex::new(
            vec![QnSector::new(U1Qn(0), 1), QnSector::new(U1Qn(1), 1)],
            Direction::Out,
        )
    }

    pub struct FermionOps {
        pub cdag: LocalOp<f64, U1Qn>,
        pub c: LocalOp<f64, U1Qn>,
        pub n: LocalOp<f64, U1Qn>,
        /// Jordan-Wigner string operator `1 - 2n`
        pub f: LocalOp<f64, U1Qn>,
    }

    pub fn fermion_ops() -> FermionOps {
        let pb = fermion_site();
        FermionOps {
            cdag: LocalOp::new(&pb, vec![0.0, 1.0, 0.0, 0.0]),
            c: LocalOp::new(&pb, vec![0.0, 0.0, 1.0, 0.0]),
            n: LocalOp::new(&pb, vec![0.0, 0.0, 0.0, 1.0]),
            f: LocalOp::new(&pb, vec![1.0, 0.0, 0.0, -1.0]),
        }
    }

    /// Records every path handed to the automaton.
    #[derive(Debug)]
    pub struct RecordingFsm {
        pub inner: PrefixTreeFsm,
        pub id_labels: Vec<OpLabel>,
        pub paths: Vec<(usize, usize, OpPath)>,
    }

    impl RecordingFsm {
        pub fn new(n_sites: usize) -> Self {
            Self {
                inner: PrefixTreeFsm::new(n_sites),
                id_labels: Vec::new(),
                paths: Vec::new(),
            }
        }
    }

    impl OpStringAutomaton for RecordingFsm {
        fn replace_id_op_labels(&mut self, labels: Vec<OpLabel>) {
            self.id_labels = labels.clone();
            self.inner.replace_id_op_labels(labels);
        }

        fn add_path(&mut self, head: usize, tail: usize, path: OpPath) -> tensor4all_mpogen::Result<()> {
            self.paths.push((head, tail, path.clone()));
            self.inner.add_path(head, tail, path)
        }

        fn gen_compressed_mat_repr(&self) -> tensor4all_mpogen::Result<Vec<SparOpReprMat>> {
            self.inner.gen_compressed_mat_repr()
        }
    }

    pub fn recording_generator(
        n: usize,
        pb: QnIndex<U1Qn>,
    ) -> MpoGenerator<f64, U1Qn, RecordingFsm> {
        let sites = SiteVec::uniform(n, pb).unwrap();
        MpoGenerator::with_automaton(&sites, U1Qn(0), MpoGenOptions::default(), RecordingFsm::new(n))
    }
}

use test_helpers::*;

// ============================================================================
// Term decomposition
// ============================================================================

#[test]
fn test_dense_path_spans_term() {
    let ops = spin_ops::<f64>();
    let mut gen = recording_generator(6, spin_half());
    gen.add_term(
        0.7,
        &[ops.sz.tensor.clone(), ops.sp.tensor.clone(), ops.sm.tensor.clone()],
        &[1, 3, 4],
    )
    .unwrap();

    let fsm = gen.automaton();
    let (head, tail, path) = &fsm.paths[0];
    assert_eq!((*head, *tail), (1, 4));
    assert_eq!(path.len(), 4);

    // gap filled with that site's identity
    assert_eq!(path[1].op, fsm.id_labels[2]);
    let explicit = [path[0].op, path[2].op, path[3].op];
    assert!(explicit.iter().all(|op| !fsm.id_labels.contains(op)));
    assert_ne!(explicit[0], explicit[1]);
    assert_ne!(explicit[1], explicit[2]);

    // coefficient only on the first entry
    assert!(path[0].coef.is_some());
    assert!(path[1..].iter().all(|s| s.coef.is_none()));
}

#[test]
fn test_labels_are_reused() {
    let ops = spin_ops::<f64>();
    let mut gen = recording_generator(6, spin_half());
    gen.add_term(0.7, &[ops.sz.tensor.clone(), ops.sz.tensor.clone()], &[0, 2])
        .unwrap();
    gen.add_one_body_term(0.7, &ops.sz.tensor, 5).unwrap();
    gen.add_one_body_term(1.0, &ops.sz.tensor, 4).unwrap();

    let paths = &gen.automaton().paths;
    let first = paths[0].2[0];
    assert_eq!(paths[0].2[2].op, first.op);
    assert_eq!(paths[1].2[0], first);
    assert_eq!(paths[2].2[0].op, first.op);
    assert_ne!(paths[2].2[0].coef, first.coef);
}

#[test]
fn test_uniform_and_explicit_insertions_match() {
    let ops = fermion_ops();
    let (cdag, c, f) = (&ops.cdag.tensor, &ops.c.tensor, &ops.f.tensor);

    let mut uniform = recording_generator(6, fermion_site());
    uniform
        .add_two_body_term(1.0, cdag, 1, c, 4, Insertion::Uniform(f))
        .unwrap();

    let mut explicit = recording_generator(6, fermion_site());
    explicit
        .add_two_body_term(1.0, cdag, 1, c, 4, Insertion::AtSites(f, &[2, 3]))
        .unwrap();

    let mut lists = recording_generator(6, fermion_site());
    lists
        .add_term_with_insertions(
            1.0,
            &[cdag.clone(), c.clone()],
            &[1, 4],
            &[f.clone()],
            Some(&[vec![2, 3]]),
        )
        .unwrap();

    let mut dense = recording_generator(6, fermion_site());
    dense
        .add_term(1.0, &[cdag.clone(), f.clone(), f.clone(), c.clone()], &[1, 2, 3, 4])
        .unwrap();

    let expected = &dense.automaton().paths;
    assert_eq!(&uniform.automaton().paths, expected);
    assert_eq!(&explicit.automaton().paths, expected);
    assert_eq!(&lists.automaton().paths, expected);
}

#[test]
fn test_explicit_insertion_subset() {
    let ops = fermion_ops();
    let mut gen = recording_generator(6, fermion_site());
    gen.add_two_body_term(
        1.0,
        &ops.cdag.tensor,
        1,
        &ops.c.tensor,
        4,
        Insertion::AtSites(&ops.f.tensor, &[3]),
    )
    .unwrap();

    let fsm = gen.automaton();
    let path = &fsm.paths[0].2;
    assert_eq!(path.len(), 4);
    assert_eq!(path[1].op, fsm.id_labels[2]);
    assert_ne!(path[2].op, fsm.id_labels[3]);
}

#[test]
fn test_trailing_insertion_string() {
    let ops = fermion_ops();
    let (cdag, c, f) = (&ops.cdag.tensor, &ops.c.tensor, &ops.f.tensor);

    let mut trailing = recording_generator(6, fermion_site());
    trailing
        .add_term_with_insertions(
            1.0,
            &[cdag.clone(), c.clone()],
            &[1, 3],
            &[f.clone(), f.clone()],
            None,
        )
        .unwrap();

    let mut dense = recording_generator(6, fermion_site());
    dense
        .add_term(
            1.0,
            &[cdag.clone(), f.clone(), c.clone(), f.clone(), f.clone()],
            &[1, 2, 3, 4, 5],
        )
        .unwrap();

    assert_eq!(trailing.automaton().paths, dense.automaton().paths);
    assert_eq!(trailing.automaton().paths[0].1, 5);
}

// ============================================================================
// Zero and duplicate terms
// ============================================================================

fn heisenberg_terms(gen: &mut MpoGenerator<f64, U1Qn>, ops: &SpinOps<f64>, n: usize) {
    for i in 0..n - 1 {
        gen.add_two_body_term(0.5, &ops.sp.tensor, i, &ops.sm.tensor, i + 1, Insertion::None)
            .unwrap();
        gen.add_two_body_term(0.5, &ops.sm.tensor, i, &ops.sp.tensor, i + 1, Insertion::None)
            .unwrap();
        gen.add_two_body_term(1.0, &ops.sz.tensor, i, &ops.sz.tensor, i + 1, Insertion::None)
            .unwrap();
    }
}

#[test]
fn test_zero_coefficient_idempotence() {
    let n = 4;
    let ops = spin_ops::<f64>();
    let sites = SiteVec::uniform(n, spin_half()).unwrap();

    let mut plain = MpoGenerator::new(&sites, U1Qn(0));
    heisenberg_terms(&mut plain, &ops, n);

    let mut padded = MpoGenerator::new(&sites, U1Qn(0));
    padded
        .add_term(0.0, &[ops.sp.tensor.clone(), ops.sm.tensor.clone()], &[0, 3])
        .unwrap();
    heisenberg_terms(&mut padded, &ops, n);
    padded.add_one_body_term(0.0, &ops.sz.tensor, 2).unwrap();
    padded
        .add_two_body_term(
            0.0,
            &ops.sp.tensor,
            1,
            &ops.sm.tensor,
            3,
            Insertion::Uniform(&ops.sz.tensor),
        )
        .unwrap();
    assert_eq!(padded.num_terms(), plain.num_terms());

    let a = plain.gen().unwrap();
    let b = padded.gen().unwrap();
    assert_eq!(a.bond_dims(), b.bond_dims());
    assert_eq!(a.site_tensors(), b.site_tensors());
}

#[test]
fn test_duplicate_terms_accumulate() {
    let n = 3;
    let ops = spin_ops::<f64>();
    let sites = SiteVec::uniform(n, spin_half()).unwrap();
    let term = [ops.sp.tensor.clone(), ops.sm.tensor.clone()];

    let mut twice = MpoGenerator::new(&sites, U1Qn(0));
    twice.add_term(0.25, &term, &[0, 2]).unwrap();
    twice.add_term(0.25, &term, &[0, 2]).unwrap();

    let mut once = MpoGenerator::new(&sites, U1Qn(0));
    once.add_term(0.5, &term, &[0, 2]).unwrap();

    let twice = twice.gen().unwrap();
    let once = once.gen().unwrap();
    assert_eq!(twice.bond_dims(), once.bond_dims());
    assert_dense_close(&twice.to_dense().unwrap(), &once.to_dense().unwrap(), 1e-14);
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_two_site_product() {
    let j = 1.3;
    let ops = spin_ops::<f64>();
    let sites = SiteVec::uniform(2, spin_half()).unwrap();
    let mut gen = MpoGenerator::new(&sites, U1Qn(0));
    gen.add_term(j, &[ops.sp.tensor.clone(), ops.sm.tensor.clone()], &[0, 1])
        .unwrap();

    let mpo = gen.gen().unwrap();
    assert_eq!(mpo.len(), 2);
    assert_eq!(mpo.bond_dims(), vec![1]);

    let (head, tail) = (mpo.site_tensor(0), mpo.site_tensor(1));
    for i0 in 0..2 {
        for o0 in 0..2 {
            for i1 in 0..2 {
                for o1 in 0..2 {
                    let got = head.elem(&[i0, 0, o0]).unwrap() * tail.elem(&[i1, 0, o1]).unwrap();
                    let expected = j * ops.sp.data[i0 * 2 + o0] * ops.sm.data[i1 * 2 + o1];
                    assert!((got - expected).abs() < 1e-14);
                }
            }
        }
    }
}

#[test]
fn test_same_operators_with_different_coefficients_share_bond() {
    let ops = spin_ops::<f64>();
    let sites = SiteVec::uniform(2, spin_half()).unwrap();
    let mut gen = MpoGenerator::new(&sites, U1Qn(0));
    let mut reference = Reference::new(2, 2);
    for coef in [1.0, 2.0] {
        gen.add_term(coef, &[ops.sz.tensor.clone(), ops.sz.tensor.clone()], &[0, 1])
            .unwrap();
        reference.add(coef, &[(0, &ops.sz), (1, &ops.sz)]);
    }

    let mpo = gen.gen().unwrap();
    assert_eq!(mpo.bond_dims(), vec![1]);
    assert_dense_close(&mpo.to_dense().unwrap(), &reference.dense, 1e-14);
}

#[test]
fn test_non_conserving_term_is_rejected() {
    let ops = spin_ops::<f64>();
    let sites = SiteVec::uniform(3, spin_half()).unwrap();
    let mut gen = MpoGenerator::new(&sites, U1Qn(0));
    heisenberg_terms(&mut gen, &ops, 3);
    gen.add_term(1.0, &[ops.sp.tensor.clone(), ops.sp.tensor.clone()], &[0, 2])
        .unwrap();
    assert!(matches!(gen.gen().unwrap_err(), MpoGenError::QnMismatch { .. }));
}

#[test]
fn test_xxz_chain_matches_dense() {
    let n = 5;
    let ops = spin_ops::<f64>();
    let sites = SiteVec::uniform(n, spin_half()).unwrap();
    let mut gen = MpoGenerator::new(&sites, U1Qn(0));
    let mut reference = Reference::new(n, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for i in 0..n - 1 {
        let jxy = random_coef(&mut rng);
        let jz = random_coef(&mut rng);
        for (coef, a, b) in [
            (0.5 * jxy, &ops.sp, &ops.sm),
            (0.5 * jxy, &ops.sm, &ops.sp),
            (jz, &ops.sz, &ops.sz),
        ] {
            gen.add_two_body_term(coef, &a.tensor, i, &b.tensor, i + 1, Insertion::None)
                .unwrap();
            reference.add(coef, &[(i, a), (i + 1, b)]);
        }
    }
    for i in 0..n {
        let h = random_coef(&mut rng);
        gen.add_one_body_term(h, &ops.sz.tensor, i).unwrap();
        reference.add(h, &[(i, &ops.sz)]);
    }

    let mpo = gen.gen().unwrap();
    assert_eq!(mpo.bond_dims(), vec![5, 5, 5, 5]);

    // ready, S+ string, S- string, Sz string, finished
    let bond = mpo.right_bond(1).unwrap();
    assert_eq!(
        bond.sectors(),
        &[
            QnSector::new(U1Qn(0), 3),
            QnSector::new(U1Qn(-2), 1),
            QnSector::new(U1Qn(2), 1),
        ]
    );
    assert!(mpo.site_tensors().iter().all(|t| t.div() == Some(U1Qn(0))));

    let dense = mpo.to_dense().unwrap();
    assert_dense_close(&dense, &reference.dense, 1e-12);

    // nonzero elements connect states of equal magnetization only
    let magnetization = |s: usize| -> i64 {
        (0..n)
            .map(|site| if digit(s, site, n, 2) == 0 { 1 } else { -1 })
            .sum()
    };
    for row in 0..dense.dim(0) {
        for col in 0..dense.dim(1) {
            if dense[[row, col]].abs() > 0.0 {
                assert_eq!(magnetization(row), magnetization(col));
            }
        }
    }
}

#[test]
fn test_long_range_terms_match_dense() {
    let n = 5;
    let ops = spin_ops::<f64>();
    let sites = SiteVec::uniform(n, spin_half()).unwrap();
    let mut gen = MpoGenerator::new(&sites, U1Qn(0));
    let mut reference = Reference::new(n, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for i in 0..n {
        for j in i + 1..n {
            let coef = random_coef(&mut rng);
            gen.add_two_body_term(coef, &ops.sp.tensor, i, &ops.sm.tensor, j, Insertion::None)
                .unwrap();
            reference.add(coef, &[(i, &ops.sp), (j, &ops.sm)]);
            gen.add_two_body_term(coef, &ops.sm.tensor, i, &ops.sp.tensor, j, Insertion::None)
                .unwrap();
            reference.add(coef, &[(i, &ops.sm), (j, &ops.sp)]);
        }
    }
    gen.add_term(
        0.3,
        &[ops.sz.tensor.clone(), ops.sz.tensor.clone(), ops.sz.tensor.clone()],
        &[0, 2, 4],
    )
    .unwrap();
    reference.add(0.3, &[(0, &ops.sz), (2, &ops.sz), (4, &ops.sz)]);

    let mpo = gen.gen().unwrap();
    // ready, one state per pending (site, S+/S-) pair, the Sz string, finished
    assert_eq!(mpo.bond_dims(), vec![10, 9, 7, 4]);
    assert!(mpo.site_tensors().iter().all(|t| t.div() == Some(U1Qn(0))));
    assert_dense_close(&mpo.to_dense().unwrap(), &reference.dense, 1e-12);
}

#[test]
fn test_transverse_ising_with_parity() {
    // In the X eigenbasis the transverse field is diagonal and Z flips the
    // Z2 parity of a site.
    let n = 5;
    let pb = QnIndex::new(
        vec![
            QnSector::new(ZnQn::<2>::new(0), 1),
            QnSector::new(ZnQn::<2>::new(1), 1),
        ],
        Direction::Out,
    );
    let x = LocalOp::new(&pb, vec![1.0, 0.0, 0.0, -1.0]);
    let z = LocalOp::new(&pb, vec![0.0, 1.0, 1.0, 0.0]);
    assert_eq!(z.tensor.div(), Some(ZnQn::new(1)));

    let sites = SiteVec::uniform(n, pb).unwrap();
    let mut gen = MpoGenerator::new(&sites, ZnQn::<2>::new(0));
    let mut reference = Reference::new(n, 2);
    let (j, h) = (1.0, 0.7);
    for i in 0..n - 1 {
        gen.add_two_body_term(-j, &z.tensor, i, &z.tensor, i + 1, Insertion::None)
            .unwrap();
        reference.add(-j, &[(i, &z), (i + 1, &z)]);
    }
    for i in 0..n {
        gen.add_one_body_term(-h, &x.tensor, i).unwrap();
        reference.add(-h, &[(i, &x)]);
    }

    let mpo = gen.gen().unwrap();
    assert_eq!(mpo.max_bond_dim(), 3);
    assert!(mpo
        .site_tensors()
        .iter()
        .all(|t| t.div() == Some(ZnQn::new(0))));
    assert_dense_close(&mpo.to_dense().unwrap(), &reference.dense, 1e-12);
}

#[test]
fn test_spinless_fermion_hopping() {
    let n = 5;
    let ops = fermion_ops();
    let sites = SiteVec::uniform(n, fermion_site()).unwrap();
    let mut gen = MpoGenerator::new(&sites, U1Qn(0));
    let mut reference = Reference::new(n, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(1234);

    // hopping over one and two bonds, with Jordan-Wigner strings in between
    let mut hoppings = Vec::new();
    for range in 1..=2 {
        for i in 0..n - range {
            let j = i + range;
            let t = random_coef(&mut rng);
            hoppings.push((i, j, t));
            let strings: Vec<(usize, &LocalOp<f64, U1Qn>)> = (i + 1..j).map(|k| (k, &ops.f)).collect();

            gen.add_two_body_term(t, &ops.cdag.tensor, i, &ops.c.tensor, j, Insertion::Uniform(&ops.f.tensor))
                .unwrap();
            let mut term = vec![(i, &ops.cdag), (j, &ops.c)];
            term.extend(strings.iter().copied());
            reference.add(t, &term);

            gen.add_two_body_term(t, &ops.c.tensor, i, &ops.cdag.tensor, j, Insertion::Uniform(&ops.f.tensor))
                .unwrap();
            let mut term = vec![(i, &ops.c), (j, &ops.cdag)];
            term.extend(strings.iter().copied());
            reference.add(t, &term);
        }
    }
    for i in 0..n {
        gen.add_one_body_term(-0.4, &ops.n.tensor, i).unwrap();
        reference.add(-0.4, &[(i, &ops.n)]);
    }

    let mpo = gen.gen().unwrap();
    assert!(mpo.site_tensors().iter().all(|t| t.div() == Some(U1Qn(0))));
    let dense = mpo.to_dense().unwrap();
    assert_dense_close(&dense, &reference.dense, 1e-12);

    // symmetric, and the one-particle block is the hopping matrix
    for row in 0..dense.dim(0) {
        for col in 0..dense.dim(1) {
            assert!((dense[[row, col]] - dense[[col, row]]).abs() < 1e-12);
        }
    }
    let one_particle = |site: usize| 1usize << (n - 1 - site);
    for &(i, j, t) in &hoppings {
        // c†_i c_j moves the particle from j (input) to i (output)
        assert!((dense[[one_particle(j), one_particle(i)]] - t).abs() < 1e-12);
    }
    assert!((dense[[one_particle(2), one_particle(2)]] + 0.4).abs() < 1e-12);
}

#[test]
fn test_trailing_string_matches_dense() {
    let n = 5;
    let ops = fermion_ops();
    let sites = SiteVec::uniform(n, fermion_site()).unwrap();
    let mut gen = MpoGenerator::new(&sites, U1Qn(0));
    gen.add_term_with_insertions(
        0.8,
        &[ops.cdag.tensor.clone(), ops.c.tensor.clone()],
        &[0, 2],
        &[ops.f.tensor.clone(), ops.f.tensor.clone()],
        None,
    )
    .unwrap();

    let mut reference = Reference::new(n, 2);
    reference.add(
        0.8,
        &[(0, &ops.cdag), (1, &ops.f), (2, &ops.c), (3, &ops.f), (4, &ops.f)],
    );
    assert_dense_close(&gen.gen().unwrap().to_dense().unwrap(), &reference.dense, 1e-14);
}

#[test]
fn test_hubbard_chain_with_pair_charges() {
    type Charge = QnPair<U1Qn, U1Qn>;
    let n = 3;
    let d = 4;
    let q = |particles: i64, two_sz: i64| QnPair(U1Qn(particles), U1Qn(two_sz));
    // |0>, |up>, |dn>, |up dn>
    let pb: QnIndex<Charge> = QnIndex::new(
        vec![
            QnSector::new(q(0, 0), 1),
            QnSector::new(q(1, 1), 1),
            QnSector::new(q(1, -1), 1),
            QnSector::new(q(2, 0), 1),
        ],
        Direction::Out,
    );

    let mut adag_up = vec![0.0; 16];
    adag_up[1] = 1.0; // |0> -> |up>
    adag_up[2 * d + 3] = 1.0; // |dn> -> |up dn>
    let mut adag_dn = vec![0.0; 16];
    adag_dn[2] = 1.0; // |0> -> |dn>
    adag_dn[d + 3] = -1.0; // |up> -> |up dn>, passing the up electron
    let mut f = vec![0.0; 16];
    for (k, sign) in [1.0, -1.0, -1.0, 1.0].into_iter().enumerate() {
        f[k * d + k] = sign;
    }
    let mut double = vec![0.0; 16];
    double[3 * d + 3] = 1.0;

    let f_op = LocalOp::new(&pb, f.clone());
    let double_op = LocalOp::new(&pb, double);

    let sites = SiteVec::uniform(n, pb.clone()).unwrap();
    let mut gen = MpoGenerator::new(&sites, q(0, 0));
    let mut reference = Reference::new(n, d);
    let t = -1.0;
    let u = 2.5;

    for adag in [&adag_up, &adag_dn] {
        let a = transpose(adag, d);
        // c†_i c_j = (a† F)_i F..F a_j, and c†_j c_i = (F a)_i F..F a†_j
        let left_create = LocalOp::new(&pb, compose(adag, &f, d));
        let right_annihilate = LocalOp::new(&pb, a.clone());
        let left_annihilate = LocalOp::new(&pb, compose(&f, &a, d));
        let right_create = LocalOp::new(&pb, adag.clone());
        for (i, j) in [(0, 1), (1, 2), (0, 2)] {
            let strings: Vec<(usize, &LocalOp<f64, Charge>)> = (i + 1..j).map(|k| (k, &f_op)).collect();
            for (l, r) in [(&left_create, &right_annihilate), (&left_annihilate, &right_create)] {
                gen.add_two_body_term(t, &l.tensor, i, &r.tensor, j, Insertion::Uniform(&f_op.tensor))
                    .unwrap();
                let mut term = vec![(i, l), (j, r)];
                term.extend(strings.iter().copied());
                reference.add(t, &term);
            }
        }
    }
    for i in 0..n {
        gen.add_one_body_term(u, &double_op.tensor, i).unwrap();
        reference.add(u, &[(i, &double_op)]);
    }

    let mpo = gen.gen().unwrap();
    assert!(mpo.site_tensors().iter().all(|t| t.div() == Some(q(0, 0))));
    let dense = mpo.to_dense().unwrap();
    assert_dense_close(&dense, &reference.dense, 1e-12);
    for row in 0..dense.dim(0) {
        for col in 0..dense.dim(1) {
            assert!((dense[[row, col]] - dense[[col, row]]).abs() < 1e-12);
        }
    }
}

#[test]
fn test_complex_coefficients() {
    let n = 4;
    let ops = spin_ops::<Complex64>();
    let sites = SiteVec::uniform(n, spin_half()).unwrap();
    let mut gen = MpoGenerator::<Complex64, U1Qn>::new(&sites, U1Qn(0));
    let mut reference = Reference::<Complex64>::new(n, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for i in 0..n - 1 {
        let z = Complex64::new(random_coef(&mut rng), random_coef(&mut rng));
        gen.add_two_body_term(z, &ops.sp.tensor, i, &ops.sm.tensor, i + 1, Insertion::None)
            .unwrap();
        reference.add(z, &[(i, &ops.sp), (i + 1, &ops.sm)]);
        gen.add_two_body_term(z.conj(), &ops.sm.tensor, i, &ops.sp.tensor, i + 1, Insertion::None)
            .unwrap();
        reference.add(z.conj(), &[(i, &ops.sm), (i + 1, &ops.sp)]);
    }
    let h = Complex64::new(0.3, 0.0);
    for i in 0..n {
        gen.add_one_body_term(h, &ops.sz.tensor, i).unwrap();
        reference.add(h, &[(i, &ops.sz)]);
    }

    let dense = gen.gen().unwrap().to_dense().unwrap();
    assert_dense_close(&dense, &reference.dense, 1e-12);
    for row in 0..dense.dim(0) {
        for col in 0..dense.dim(1) {
            assert!((dense[[row, col]] - dense[[col, row]].conj()).norm() < 1e-12);
        }
    }
}
