pub mod league_writes;
