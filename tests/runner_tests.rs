use playcode::evaluator::{Evaluator, Output};
use playcode::runner::{self, print_symbols, print_tables, print_tags, RunOptions};

fn all_dumps() -> RunOptions {
    RunOptions {
        show_tokens: true,
        show_ast: true,
        show_symbols: true,
        ..RunOptions::default()
    }
}

#[test]
fn run_succeeds_on_a_valid_program() {
    let source = "x = 2*2\ny = 2\nswap x y\nprint 1 + (x*y) - (6/x)";
    assert!(runner::run(source, Some("swap.pc"), &RunOptions::default()));
}

#[test]
fn run_succeeds_with_every_dump_enabled() {
    let source = "v = [3, 1]\n@sort IF v[0] > v[1] { SWAP v[0] v[1] }\n@sort\nPRINT v";
    assert!(runner::run(source, Some("sort.pc"), &all_dumps()));
}

#[test]
fn run_fails_on_lex_error() {
    assert!(!runner::run("x = 1 $", None, &RunOptions::default()));
}

#[test]
fn run_fails_on_parse_error() {
    assert!(!runner::run("x = (1 + 2", Some("broken.pc"), &RunOptions::default()));
    assert!(!runner::run("IF TRUE { x = 1", None, &all_dumps()));
}

#[test]
fn run_fails_on_runtime_error() {
    assert!(!runner::run("PRINT y", Some("undefined.pc"), &RunOptions::default()));
    // Dumps still run after a failed evaluation
    assert!(!runner::run("x = 1\nPRINT x / 0", None, &all_dumps()));
}

#[test]
fn run_honours_the_tag_depth_limit() {
    let source = "@again @again\n@again\n";
    let options = RunOptions {
        max_tag_depth: 8,
        ..RunOptions::default()
    };
    assert!(!runner::run(source, None, &options));
}

#[test]
fn default_options_dump_nothing_and_allow_deep_tags() {
    let options = RunOptions::default();
    assert!(!options.show_tokens);
    assert!(!options.show_ast);
    assert!(!options.show_symbols);
    assert_eq!(
        options.max_tag_depth,
        playcode::evaluator::DEFAULT_MAX_TAG_DEPTH
    );
}

#[test]
fn table_dumps_accept_empty_and_filled_tables() {
    let empty = Evaluator::with_output(Output::captured());
    print_tables(&empty);

    let evaluator = runner::execute("@t x = x + 1\nx = 5\n@t\n", Output::captured())
        .expect("program should run");
    print_symbols(&evaluator);
    print_tags(&evaluator);
    assert_eq!(evaluator.symbols().len(), 1);
    assert_eq!(evaluator.tags().len(), 1);
}
