pub mod cli;
pub mod session;
