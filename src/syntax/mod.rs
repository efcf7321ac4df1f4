//! Syntax trees for graded source files.
//!
//! Each language normalizer turns a parser's concrete tree into the shared
//! [`SyntaxNode`] representation, so heuristics are written once against the
//! tagged tree instead of against every grammar.

pub mod normalizer;
pub mod python;
pub mod tree;

pub use normalizer::{normalizer_for, SourceLanguage, SourceNormalizer};
pub use tree::{walk, SyntaxNode, Visitor};
