//! Error types for MPO generation

use tensor4all_qn::QnError;
use thiserror::Error;

/// Result type for MPO generation
pub type Result<T> = std::result::Result<T, MpoGenError>;

/// Errors that can occur while adding terms or generating an MPO
#[derive(Error, Debug)]
pub enum MpoGenError {
    /// Two lists that must be parallel have different lengths
    #[error("Length mismatch in {what}: expected {expected}, got {got}")]
    LengthMismatch {
        /// Which lists were compared
        what: &'static str,
        /// The expected length
        expected: usize,
        /// The actual length provided
        got: usize,
    },

    /// A term without any operator
    #[error("Term has no operators")]
    EmptyTerm,

    /// Site indices of a term are not strictly ascending
    #[error("Site indices must be strictly ascending, got {sites:?}")]
    NotAscending {
        /// The offending site list
        sites: Vec<usize>,
    },

    /// Site index outside the chain
    #[error("Site {site} out of range (number of sites: {n_sites})")]
    SiteOutOfRange {
        /// The invalid site index
        site: usize,
        /// The number of sites of the chain
        n_sites: usize,
    },

    /// Operator legs differ from the physical legs of its site
    #[error("Operator at site {site} does not act on that site's physical indices")]
    OperatorIndexMismatch {
        /// The site the operator was placed on
        site: usize,
    },

    /// The insertion overload needs at least two physical operators
    #[error("At least 2 physical operators are required, got {got}")]
    TooFewPhysicalOperators {
        /// The number of physical operators provided
        got: usize,
    },

    /// Insertion operator count is neither n−1 nor n
    #[error("Insertion operator count {inst} must be one less than or equal to the physical operator count {phys}")]
    InsertionCountMismatch {
        /// The number of physical operators
        phys: usize,
        /// The number of insertion operators
        inst: usize,
    },

    /// Invalid local Hilbert space
    #[error("Invalid site {site}: {message}")]
    InvalidSite {
        /// The site index
        site: usize,
        /// Description of the problem
        message: String,
    },

    /// A chain without sites
    #[error("Site list is empty")]
    NoSites,

    /// A path that does not span its declared site range
    #[error("Invalid path: sites {head}..={tail} with {len} entries")]
    InvalidPath {
        /// First site of the path
        head: usize,
        /// Last site of the path
        tail: usize,
        /// Number of entries in the path
        len: usize,
    },

    /// Identity labels were not declared for every site
    #[error("Identity operator labels missing: expected {expected}, got {got}")]
    MissingIdentity {
        /// The number of sites
        expected: usize,
        /// The number of declared identity labels
        got: usize,
    },

    /// A label with no interned value
    #[error("Unknown {kind} label {label}")]
    UnknownLabel {
        /// "operator" or "coefficient"
        kind: &'static str,
        /// The label value
        label: usize,
    },

    /// Entries of one automaton column disagree on the target quantum number
    #[error("Quantum number mismatch at site {site}, column {column}: expected {expected}, found {found}")]
    QnMismatch {
        /// The site of the transition matrix
        site: usize,
        /// The column (right-bond state) in question
        column: usize,
        /// The quantum number already assigned to the column
        expected: String,
        /// The conflicting quantum number
        found: String,
    },

    /// A matrix row outside the left virtual bond
    #[error("Bond mismatch at site {site}: row {row} outside left bond of dimension {dim}")]
    BondMismatch {
        /// The site of the transition matrix
        site: usize,
        /// The offending row
        row: usize,
        /// The dimension of the left virtual bond
        dim: usize,
    },

    /// The MPO divergence given at construction is not the group identity
    #[error("MPO divergence must be the identity quantum number, got {found}")]
    NonIdentityDivergence {
        /// The divergence that was supplied
        found: String,
    },

    /// Generation requested before any nonzero term was added
    #[error("No nonzero term has been added")]
    NoTerms,

    /// Empty MPO
    #[error("MPO is empty")]
    Empty,

    /// Quantum-number tensor error
    #[error("Tensor error: {0}")]
    Qn(#[from] QnError),
}
