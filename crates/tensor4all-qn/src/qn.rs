//! Abelian quantum numbers.
//!
//! A quantum number labels how a basis state transforms under a conserved
//! abelian symmetry. Divergences of operators and sectors of indices are both
//! quantum numbers, combined with the group law (`+`, `-`, unary `-`) and
//! compared for equality. `Zero::zero()` is the group identity.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Add, Neg, Sub};

use num_traits::Zero;

/// Trait for conserved abelian charges.
///
/// Any type forming an abelian group under `+` with identity `Zero::zero()`
/// qualifies; the blanket implementation below makes this automatic.
pub trait QuantumNumber:
    Clone
    + Debug
    + PartialEq
    + Eq
    + Hash
    + Zero
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
}

impl<Q> QuantumNumber for Q where
    Q: Clone
        + Debug
        + PartialEq
        + Eq
        + Hash
        + Zero
        + Add<Output = Q>
        + Sub<Output = Q>
        + Neg<Output = Q>
        + Send
        + Sync
        + 'static
{
}

/// U(1) charge (particle number, 2Sz, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct U1Qn(pub i64);

impl Add for U1Qn {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        U1Qn(self.0 + rhs.0)
    }
}

impl Sub for U1Qn {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        U1Qn(self.0 - rhs.0)
    }
}

impl Neg for U1Qn {
    type Output = Self;

    fn neg(self) -> Self {
        U1Qn(-self.0)
    }
}

impl Zero for U1Qn {
    fn zero() -> Self {
        U1Qn(0)
    }

    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Z_N charge (parity for `N = 2`).
///
/// The stored value is always the canonical representative in `0..N`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZnQn<const N: i64>(i64);

impl<const N: i64> ZnQn<N> {
    /// Create a Z_N charge, reducing `value` modulo `N`.
    pub fn new(value: i64) -> Self {
        ZnQn(value.rem_euclid(N))
    }

    /// Canonical representative in `0..N`.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl<const N: i64> Add for ZnQn<N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        ZnQn::new(self.0 + rhs.0)
    }
}

impl<const N: i64> Sub for ZnQn<N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        ZnQn::new(self.0 - rhs.0)
    }
}

impl<const N: i64> Neg for ZnQn<N> {
    type Output = Self;

    fn neg(self) -> Self {
        ZnQn::new(-self.0)
    }
}

impl<const N: i64> Zero for ZnQn<N> {
    fn zero() -> Self {
        ZnQn(0)
    }

    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Direct product of two quantum numbers, e.g. `(N, 2Sz)` for spinful fermions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QnPair<A, B>(pub A, pub B);

impl<A: Add<Output = A>, B: Add<Output = B>> Add for QnPair<A, B> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        QnPair(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl<A: Sub<Output = A>, B: Sub<Output = B>> Sub for QnPair<A, B> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        QnPair(self.0 - rhs.0, self.1 - rhs.1)
    }
}

impl<A: Neg<Output = A>, B: Neg<Output = B>> Neg for QnPair<A, B> {
    type Output = Self;

    fn neg(self) -> Self {
        QnPair(-self.0, -self.1)
    }
}

impl<A: Zero, B: Zero> Zero for QnPair<A, B> {
    fn zero() -> Self {
        QnPair(A::zero(), B::zero())
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero() && self.1.is_zero()
    }
}
