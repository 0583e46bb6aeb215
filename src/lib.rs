pub mod cli;
pub mod config;
pub mod errors;
pub mod git;
pub mod stack;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use errors::StackError;
