use crate::ast::Program;
use crate::error::PlayError;
use crate::evaluator::{Evaluator, Output, DEFAULT_MAX_TAG_DEPTH};
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;
use crate::value::Value;

/// What to dump after a file has run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub show_tokens: bool,
    pub show_ast: bool,
    pub show_symbols: bool,
    pub max_tag_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            show_tokens: false,
            show_ast: false,
            show_symbols: false,
            max_tag_depth: DEFAULT_MAX_TAG_DEPTH,
        }
    }
}

/// Lex and parse a complete source text.
pub fn parse_source(source: &str) -> Result<(Vec<Token>, Program), PlayError> {
    let tokens = Lexer::new(source).scan_tokens()?;
    let program = Parser::new(tokens.clone()).parse()?;
    Ok((tokens, program))
}

/// Run `source` on a fresh evaluator writing to `output`, returning the
/// evaluator so callers can inspect the final tables.
pub fn execute(source: &str, output: Output) -> Result<Evaluator, PlayError> {
    let (_, program) = parse_source(source)?;
    let mut evaluator = Evaluator::with_output(output);
    evaluator.evaluate_program(&program)?;
    Ok(evaluator)
}

/// Run `source` with printed values captured rather than written.
pub fn capture(source: &str) -> Result<Vec<Value>, PlayError> {
    let evaluator = execute(source, Output::captured())?;
    Ok(evaluator.captured().to_vec())
}

/// Run a program for the command line, reporting any error against the
/// source. Returns whether the program ran to completion.
pub fn run(source: &str, filename: Option<&str>, options: &RunOptions) -> bool {
    // Lexing and parsing
    let (tokens, program) = match parse_source(source) {
        Ok(parsed) => parsed,
        Err(error) => {
            error.report(source, filename);
            return false;
        }
    };

    // Evaluation
    let mut evaluator = Evaluator::new();
    evaluator.set_max_tag_depth(options.max_tag_depth);
    let result = evaluator.evaluate_program(&program);
    if let Err(ref error) = result {
        error.report(source, filename);
    }

    if options.show_tokens {
        for token in &tokens {
            println!("{}", token);
        }
    }
    if options.show_ast {
        print!("{}", program);
    }
    if options.show_symbols {
        print_tables(&evaluator);
    }

    result.is_ok()
}

/// Dump the symbol and tag tables.
pub fn print_tables(evaluator: &Evaluator) {
    print_symbols(evaluator);
    print_tags(evaluator);
}

pub fn print_symbols(evaluator: &Evaluator) {
    println!("Symbols:");
    for (name, value) in evaluator.symbols().iter() {
        println!("  {} = {}", name, value);
    }
}

pub fn print_tags(evaluator: &Evaluator) {
    println!("Tags:");
    for (name, body) in evaluator.tags().iter() {
        match body {
            Some(body) => println!("  @{} {}", name, body),
            None => println!("  @{} <unbound>", name),
        }
    }
}
