pub mod matches;
pub mod standings;
pub mod tournament;
