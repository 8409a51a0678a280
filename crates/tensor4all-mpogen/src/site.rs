//! Local Hilbert spaces of a 1-D chain.

use tensor4all_qn::{Direction, QnIndex, QuantumNumber};

use crate::error::{MpoGenError, Result};

/// The outgoing physical index of every site of the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteVec<Q> {
    sites: Vec<QnIndex<Q>>,
}

impl<Q: QuantumNumber> SiteVec<Q> {
    /// Create a site list; every index must be outgoing.
    pub fn new(sites: Vec<QnIndex<Q>>) -> Result<Self> {
        if sites.is_empty() {
            return Err(MpoGenError::NoSites);
        }
        for (site, index) in sites.iter().enumerate() {
            if index.dir() != Direction::Out {
                return Err(MpoGenError::InvalidSite {
                    site,
                    message: "physical index must be outgoing".to_string(),
                });
            }
            if index.dim() == 0 {
                return Err(MpoGenError::InvalidSite {
                    site,
                    message: "physical index has dimension 0".to_string(),
                });
            }
        }
        Ok(Self { sites })
    }

    /// `n` copies of the same local Hilbert space.
    pub fn uniform(n: usize, index: QnIndex<Q>) -> Result<Self> {
        Self::new(vec![index; n])
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Check if empty (never true for a constructed list).
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Outgoing physical index of site `i`.
    pub fn site(&self, i: usize) -> &QnIndex<Q> {
        &self.sites[i]
    }

    /// All outgoing physical indices.
    pub fn sites(&self) -> &[QnIndex<Q>] {
        &self.sites
    }
}
