// Comment matcher: all-pairs similarity of transaction comments via an LLM.
//
// This is the library root. The binary in main.rs wires configuration,
// dataset loading, the comparator and report output together.

pub mod config;
pub mod dataset;
pub mod error;
pub mod matching;
pub mod oracle;
pub mod output;

#[cfg(feature = "web")]
pub mod web;
