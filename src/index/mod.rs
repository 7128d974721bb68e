//! The in-memory inverted index.

mod inverted;

pub use inverted::{IndexStats, InvertedIndex};
