//! The `arbor` command-line tool: reads flat records or a nested tree from a file or stdin,
//! runs one conversion from the [`arbor`] crate and writes the result as a JSON array.
mod cli;
pub mod config;

pub use cli::Cli;
