// PlayCode Language Interpreter Library
//
// Lexer, recursive-descent parser and tree-walking evaluator for PlayCode, a
// small imperative language with integers, booleans, vectors, SWAP and
// re-invocable tagged statements.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{BinaryOp, Expr, Program, Stmt, Target};
pub use error::{ErrorKind, PlayError, Span};
pub use evaluator::{Evaluator, Output, SymbolTable, TagTable};
pub use lexer::{tokenize, Lexer, Token, TokenType};
pub use parser::Parser;
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{capture, execute, run, RunOptions};
