//! Quantum-number graded indices.
//!
//! An index is an ordered list of [`QnSector`]s (a [`QnSpace`]) together with a
//! [`Direction`]. Basis states of a sector are stored contiguously, sectors in
//! the order given at construction, so a coordinate on the index maps to a
//! unique `(sector, offset)` pair.

use crate::qn::QuantumNumber;

/// A block of basis states sharing one quantum number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QnSector<Q> {
    /// Quantum number carried by every state of the sector
    pub qn: Q,
    /// Number of basis states in the sector
    pub dim: usize,
}

impl<Q> QnSector<Q> {
    /// Create a new sector.
    pub fn new(qn: Q, dim: usize) -> Self {
        Self { qn, dim }
    }
}

/// Ordered list of quantum-number sectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QnSpace<Q> {
    sectors: Vec<QnSector<Q>>,
}

impl<Q: QuantumNumber> QnSpace<Q> {
    /// Create a space from its sectors.
    pub fn new(sectors: Vec<QnSector<Q>>) -> Self {
        Self { sectors }
    }

    /// The sectors, in storage order.
    pub fn sectors(&self) -> &[QnSector<Q>] {
        &self.sectors
    }

    /// Sum of all sector dimensions.
    pub fn total_dim(&self) -> usize {
        self.sectors.iter().map(|s| s.dim).sum()
    }

    /// Coordinate of the first basis state of sector `pos`.
    pub fn sector_offset(&self, pos: usize) -> usize {
        self.sectors[..pos].iter().map(|s| s.dim).sum()
    }

    /// Locate the sector containing `coord`.
    ///
    /// Returns `(sector position, offset inside the sector)`, or `None` if
    /// `coord` is outside the space.
    pub fn sector_of(&self, coord: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (pos, sector) in self.sectors.iter().enumerate() {
            if coord < start + sector.dim {
                return Some((pos, coord - start));
            }
            start += sector.dim;
        }
        None
    }
}

/// Direction of a tensor leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Incoming leg: contributes `-qn` to a divergence
    In,
    /// Outgoing leg: contributes `+qn` to a divergence
    Out,
}

impl Direction {
    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

/// Directed quantum-number index.
///
/// **Equality**: two indices are equal when they have the same sectors in the
/// same order and the same direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QnIndex<Q> {
    space: QnSpace<Q>,
    dir: Direction,
}

impl<Q: QuantumNumber> QnIndex<Q> {
    /// Create a new index from its sectors and direction.
    pub fn new(sectors: Vec<QnSector<Q>>, dir: Direction) -> Self {
        Self {
            space: QnSpace::new(sectors),
            dir,
        }
    }

    /// Total dimension (sum of sector dimensions).
    pub fn dim(&self) -> usize {
        self.space.total_dim()
    }

    /// Direction of the index.
    pub fn dir(&self) -> Direction {
        self.dir
    }

    /// The underlying quantum-number space.
    pub fn space(&self) -> &QnSpace<Q> {
        &self.space
    }

    /// The sectors, in storage order.
    pub fn sectors(&self) -> &[QnSector<Q>] {
        self.space.sectors()
    }

    /// Number of sectors.
    pub fn num_sectors(&self) -> usize {
        self.space.sectors().len()
    }

    /// Same sectors, opposite direction.
    pub fn inverse(&self) -> Self {
        Self {
            space: self.space.clone(),
            dir: self.dir.reverse(),
        }
    }

    /// Locate the sector containing `coord`; see [`QnSpace::sector_of`].
    pub fn coord_sector(&self, coord: usize) -> Option<(usize, usize)> {
        self.space.sector_of(coord)
    }

    /// Quantum number of the basis state at `coord`.
    pub fn coord_qn(&self, coord: usize) -> Option<&Q> {
        self.coord_sector(coord)
            .map(|(pos, _)| &self.space.sectors()[pos].qn)
    }

    /// Coordinate of the first basis state of sector `pos`.
    pub fn sector_offset(&self, pos: usize) -> usize {
        self.space.sector_offset(pos)
    }

    /// Contribution of sector `pos` to a divergence, signed by direction.
    pub fn signed_qn(&self, pos: usize) -> Q {
        let qn = self.space.sectors()[pos].qn.clone();
        match self.dir {
            Direction::Out => qn,
            Direction::In => -qn,
        }
    }
}
