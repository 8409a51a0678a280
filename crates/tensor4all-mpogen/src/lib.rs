#![warn(missing_docs)]
//! Quantum-number conserving MPO generation
//!
//! This crate turns a Hamiltonian written as a sum of local operator strings
//! into a matrix product operator (MPO) whose site tensors are block-sparse
//! [`QnTensor`](tensor4all_qn::QnTensor)s:
//! - `MpoGenerator`: collects terms and builds the MPO
//! - `PrefixTreeFsm`: merges the operator strings of all terms into a
//!   finite-state automaton, one transition matrix per site
//! - `sort_cols_by_qn`: groups virtual bond states into quantum-number sectors
//! - `QnMpo`: the resulting chain of site tensors
//!
//! # Example
//!
//! ```
//! use tensor4all_mpogen::{Insertion, MpoGenerator, SiteVec};
//! use tensor4all_qn::{Direction, QnIndex, QnSector, QnTensor, U1Qn};
//!
//! // spin-1/2 sites, quantum number 2Sz
//! let pb = QnIndex::new(
//!     vec![QnSector::new(U1Qn(1), 1), QnSector::new(U1Qn(-1), 1)],
//!     Direction::Out,
//! );
//! let legs = vec![pb.inverse(), pb.clone()];
//! let sp = QnTensor::<f64, U1Qn>::from_dense(legs.clone(), &[0.0, 0.0, 1.0, 0.0]).unwrap();
//! let sm = QnTensor::<f64, U1Qn>::from_dense(legs, &[0.0, 1.0, 0.0, 0.0]).unwrap();
//!
//! let sites = SiteVec::uniform(3, pb).unwrap();
//! let mut gen = MpoGenerator::new(&sites, U1Qn(0));
//! for i in 0..2 {
//!     gen.add_two_body_term(0.5, &sp, i, &sm, i + 1, Insertion::None).unwrap();
//!     gen.add_two_body_term(0.5, &sm, i, &sp, i + 1, Insertion::None).unwrap();
//! }
//! let mpo = gen.gen().unwrap();
//!
//! assert_eq!(mpo.bond_dims(), vec![3, 3]);
//! assert!(mpo.site_tensors().iter().all(|t| t.div() == Some(U1Qn(0))));
//! ```

pub mod assemble;
pub mod automaton;
pub mod bond_sort;
pub mod error;
pub mod generator;
pub mod label;
pub mod mpo;
pub mod op_repr;
pub mod site;
pub mod spar_mat;

// Re-export main types
pub use assemble::Assembler;
pub use automaton::{FsmState, OpStringAutomaton, PrefixTreeFsm};
pub use bond_sort::{check_last_site, column_target_qns, sort_cols_by_qn};
pub use error::{MpoGenError, Result};
pub use generator::{Insertion, MpoGenOptions, MpoGenerator};
pub use label::{CoefLabel, Label, LabelConverter, OpLabel};
pub use mpo::QnMpo;
pub use op_repr::{OpPath, OpRepr, SiteOpRepr};
pub use site::SiteVec;
pub use spar_mat::SparOpReprMat;
