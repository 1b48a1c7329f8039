pub mod config;
pub mod error;
pub mod evaluate;
pub mod guide_tree;
mod io;
pub mod library;
pub mod metrics;
pub mod model;
pub mod multiple;
pub mod pairwise;
pub mod profile;
pub mod progressive;
pub mod prosody;
pub mod refine;
pub mod residue;
pub mod scorer;
pub mod swap;
pub mod tokenizer;
pub mod unique;


pub use multiple::Multiple;
