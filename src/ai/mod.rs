pub mod engine;
pub mod evaluation;
pub mod ordering;
pub mod transposition;

pub use engine::{AiEngine, Analysis, MinimaxAi, RandomAi, SearchError, SearchOutcome, SearchStats};
pub use transposition::{TTEntry, TTFlag, TranspositionTable};
