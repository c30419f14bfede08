//! Code listing and tokenizer collaborators.

pub mod source;
pub mod tokenize;
