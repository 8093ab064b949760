//! Front-end pipeline: source buffer, lexer, parser, and the arena AST.

pub mod ast;
pub mod context;
pub mod declspec;
pub mod dump;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod source;
pub mod token;
pub mod types;
