pub mod error;
pub mod format;
pub mod generator;
pub mod problem;
pub mod record;
pub mod session;
pub mod set;
pub mod stats;
pub mod store;

pub use error::{DrillError, DrillResult};
pub use generator::generate;
pub use problem::{
    OperandLengths, Operands, Operation, Problem, ResolvedOperation, MAX_SUPPORTED_OPERAND_LENGTH,
};
pub use record::{default_catalog, BestResult, CalculationMethod, RecordFormat};
pub use session::{parse_answer, InputDirection, SetSettings, Session, Submission};
pub use set::{RecordEntry, SetCategory, SetOverview, SolvedSet, StoreStats};
pub use stats::{compute_bests, compute_bests_from_times, NoHistory, PriorBests, SetSummary};
pub use store::RecordStore;
