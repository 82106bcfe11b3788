use crate::evaluator::Evaluator;
use crate::lexer::{Lexer, Token, TokenType};
use crate::parser::Parser;
use crate::runner::{print_symbols, print_tags, RunOptions};
use std::io::{self, Write};

/// Interactive session. One evaluator lives for the whole session, so
/// variables and tags persist between lines.
pub fn start(options: &RunOptions) {
    println!("PlayCode Interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+C to quit, ':symbols' or ':tags' to inspect state");
    println!();

    let mut evaluator = session_evaluator(options);

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                match line {
                    "" => continue,
                    "exit" | "quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    ":symbols" => print_symbols(&evaluator),
                    ":tags" => print_tags(&evaluator),
                    ":reset" => {
                        evaluator.reset();
                        println!("State cleared.");
                    }
                    _ => run_repl_command(line, &mut evaluator),
                }
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn session_evaluator(options: &RunOptions) -> Evaluator {
    let mut evaluator = Evaluator::new();
    evaluator.set_max_tag_depth(options.max_tag_depth);
    evaluator
}

fn run_repl_command(source: &str, evaluator: &mut Evaluator) {
    // A lone tag name on the last line needs its terminating newline.
    let source = format!("{}\n", source);

    let tokens = match Lexer::new(&source).scan_tokens() {
        Ok(tokens) => tokens,
        Err(error) => {
            error.report(&source, None);
            return;
        }
    };

    if is_expression_line(&tokens) {
        let result = Parser::new(tokens)
            .parse_comparison()
            .and_then(|expr| evaluator.evaluate_expression(&expr));
        match result {
            Ok(value) => println!("{}", value),
            Err(error) => error.report(&source, None),
        }
        return;
    }

    let program = match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(error) => {
            error.report(&source, None);
            return;
        }
    };

    if let Err(error) = evaluator.evaluate_program(&program) {
        error.report(&source, None);
    }
}

/// Lines that cannot start a statement are echoed as expressions. A leading
/// variable only starts one when an assignment '=' follows on the line.
fn is_expression_line(tokens: &[Token]) -> bool {
    match tokens.first() {
        None => false,
        Some(token) if token.token_type == TokenType::Identifier => !tokens
            .iter()
            .any(|token| token.token_type == TokenType::Equal),
        Some(token) => !Parser::starts_statement(token.token_type),
    }
}
