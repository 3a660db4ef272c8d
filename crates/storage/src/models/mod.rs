mod elimination;
mod match_result;
mod qualified;
mod standing;

pub use elimination::EliminationRecord;
pub use match_result::MatchRecord;
pub use qualified::QualifiedManager;
pub use standing::StandingRecord;
