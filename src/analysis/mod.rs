pub mod analyzer;
pub mod filter;
pub mod filters;
pub mod language;
pub mod token;
pub mod tokenizer;
