//! Repetition detection: generic maximal-motif search plus the
//! statement-level application used for repetitive-region marking.

pub mod equator;
pub mod finder;
pub mod params;
pub mod statements;
