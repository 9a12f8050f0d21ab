//! Side-effecting boundaries: the git adapter and the console.

pub mod git;
pub mod prompt;
pub mod style;
