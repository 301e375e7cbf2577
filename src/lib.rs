//! # lexfa
//!
//! A finite automaton library and longest-match tokenizer.
//!
//! This library provides functionality to:
//! - Load DFAs and NFAs from specification files and simulate them on input strings
//! - Compute epsilon closures and convert NFAs to DFAs using Subset Construction
//! - Parse regular expressions and compile them to NFAs fragment by fragment
//! - Tokenize source text with an ordered list of token types, longest match first
//! - Export any automaton as a Graphviz DOT graph

pub mod dfa;
pub mod fa;
pub mod format;
pub mod lex;
pub mod nfa;
pub mod regex;
pub mod visualizer;

// Re-export commonly used types for convenience
pub use dfa::DFA;
pub use fa::{Symbol, FA};
pub use lex::{Lex, LexError, Token};
pub use nfa::NFA;
pub use regex::RegEx;
pub use visualizer::to_dot;
