//! Core of the interpreter: lexer, parser, type checker, and tree-walking
//! evaluator for a small statically typed imperative language.

pub mod ast;
pub mod error;
pub mod heap;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod symbol_table;
pub mod token;
pub mod typechecker;
pub mod value;

use error::MplError;

/// Lex, parse, type-check, and run a complete source program, in order.
/// Returns the process exit code on success.
pub fn run_source(source: &str) -> Result<i32, MplError> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    let program = parser::parse(tokens)?;
    typechecker::check(&program)?;
    interpreter::run(&program)
}
