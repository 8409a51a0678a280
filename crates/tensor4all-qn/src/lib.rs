#![warn(missing_docs)]
//! Quantum-number graded indices and block-sparse tensors.
//!
//! This crate provides the symmetry-aware tensor algebra needed to build
//! operators that conserve an abelian quantum number:
//! - [`QuantumNumber`]: abelian group of conserved charges ([`U1Qn`], [`ZnQn`], [`QnPair`])
//! - [`QnSpace`] / [`QnIndex`]: ordered quantum-number sectors with a direction
//! - [`QnTensor`]: block-sparse tensor whose stored blocks share one divergence
//!
//! # Example
//!
//! ```
//! use tensor4all_qn::{Direction, QnIndex, QnSector, QnTensor, U1Qn};
//!
//! // Spin-1/2 site: |up> carries 2Sz = +1, |down> carries 2Sz = -1
//! let phys = QnIndex::new(
//!     vec![QnSector::new(U1Qn(1), 1), QnSector::new(U1Qn(-1), 1)],
//!     Direction::Out,
//! );
//! let mut sp = QnTensor::<f64, U1Qn>::new(vec![phys.inverse(), phys.clone()]);
//! sp.set_elem(&[1, 0], 1.0).unwrap();
//!
//! assert_eq!(sp.div(), Some(U1Qn(2)));
//! assert_eq!(sp.elem(&[1, 0]).unwrap(), 1.0);
//! ```

pub mod error;
pub mod index;
pub mod qn;
pub mod scalar;
pub mod storage;
pub mod tensor;

pub use error::{QnError, Result};
pub use index::{Direction, QnIndex, QnSector, QnSpace};
pub use qn::{QnPair, QuantumNumber, U1Qn, ZnQn};
pub use scalar::QnScalar;
pub use storage::DenseBlock;
pub use tensor::QnTensor;
