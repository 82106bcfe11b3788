// Whole programs under tests/programs, each run on a fresh evaluator.

use playcode::evaluator::{Evaluator, Output};
use playcode::runner::execute;
use playcode::value::Value;

const SWAP: &str = include_str!("programs/swap.pc");
const IF: &str = include_str!("programs/if.pc");
const TAGS: &str = include_str!("programs/tags.pc");
const WHILE: &str = include_str!("programs/while.pc");
const BUBBLE_SORT: &str = include_str!("programs/bubblesort.pc");

fn run_program(name: &str, source: &str) -> Evaluator {
    match execute(source, Output::captured()) {
        Ok(evaluator) => evaluator,
        Err(error) => panic!("{} failed: {}", name, error),
    }
}

fn symbol(evaluator: &Evaluator, name: &str) -> Option<Value> {
    evaluator.symbols().get(name).cloned()
}

#[test]
fn swap_program() {
    let evaluator = run_program("swap.pc", SWAP);
    assert_eq!(evaluator.captured(), &[Value::Integer(6)]);
    assert_eq!(symbol(&evaluator, "x"), Some(Value::Integer(2)));
    assert_eq!(symbol(&evaluator, "y"), Some(Value::Integer(4)));
}

#[test]
fn if_program() {
    let evaluator = run_program("if.pc", IF);
    assert_eq!(
        evaluator.captured(),
        &[Value::Integer(12), Value::Boolean(true)]
    );
}

#[test]
fn tags_program() {
    let evaluator = run_program("tags.pc", TAGS);
    assert_eq!(
        evaluator.captured(),
        &[Value::Integer(1), Value::Integer(3), Value::Integer(0)]
    );

    let tags: Vec<String> = evaluator
        .tags()
        .iter()
        .map(|(name, body)| match body {
            Some(body) => format!("@{} {}", name, body),
            None => format!("@{}", name),
        })
        .collect();
    assert_eq!(
        tags,
        vec![
            "@inc count = (count + 1)",
            "@reset count = 0",
            "@twice IF TRUE {\n@inc\n@inc\n}",
        ]
    );
}

#[test]
fn while_program() {
    let evaluator = run_program("while.pc", WHILE);
    assert_eq!(
        evaluator.captured(),
        &[Value::Integer(120), Value::Integer(108)]
    );
    assert_eq!(symbol(&evaluator, "n"), Some(Value::Integer(1)));
    assert_eq!(symbol(&evaluator, "i"), Some(Value::Integer(6)));
}

#[test]
fn bubble_sort_program() {
    let evaluator = run_program("bubblesort.pc", BUBBLE_SORT);
    let sorted = Value::Vector(vec![2, 3, 4, 5, 8]);
    assert_eq!(evaluator.captured(), &[sorted.clone()]);
    assert_eq!(symbol(&evaluator, "x"), Some(sorted));
}

#[test]
fn each_program_starts_with_empty_tables() {
    // Running tags.pc first must not leak `count` or `@inc` into the next run
    run_program("tags.pc", TAGS);
    let evaluator = run_program("swap.pc", SWAP);
    assert_eq!(symbol(&evaluator, "count"), None);
    assert!(evaluator.tags().is_empty());
    assert_eq!(evaluator.symbols().len(), 2);
}

#[test]
fn programs_render_and_rerun_identically() {
    for (name, source) in [
        ("swap.pc", SWAP),
        ("if.pc", IF),
        ("tags.pc", TAGS),
        ("while.pc", WHILE),
        ("bubblesort.pc", BUBBLE_SORT),
    ] {
        let (_, program) = playcode::runner::parse_source(source).unwrap();
        let rendered = program.to_string();
        let direct = run_program(name, source);
        let reparsed = run_program(name, &rendered);
        assert_eq!(direct.captured(), reparsed.captured(), "{}", name);
    }
}
