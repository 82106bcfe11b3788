use playcode::error::ErrorKind;
use playcode::evaluator::{Evaluator, Output};
use playcode::runner::{capture, execute, parse_source};
use playcode::value::Value;

fn run(source: &str) -> Evaluator {
    match execute(source, Output::captured()) {
        Ok(evaluator) => evaluator,
        Err(error) => panic!("program failed: {}", error),
    }
}

fn printed(source: &str) -> Vec<Value> {
    match capture(source) {
        Ok(values) => values,
        Err(error) => panic!("program failed: {}", error),
    }
}

fn runtime_error(source: &str) -> String {
    match execute(source, Output::captured()) {
        Ok(_) => panic!("expected a runtime error"),
        Err(error) => {
            assert_eq!(error.kind, ErrorKind::RuntimeError, "{}", error);
            error.message
        }
    }
}

fn var(evaluator: &Evaluator, name: &str) -> Value {
    evaluator
        .symbols()
        .get(name)
        .cloned()
        .unwrap_or_else(|| panic!("'{}' is not defined", name))
}

// === Expressions ===

#[test]
fn precedence_and_associativity() {
    assert_eq!(printed("PRINT 1 + 2 * 3"), vec![Value::Integer(7)]);
    assert_eq!(printed("PRINT (1 + 2) * 3"), vec![Value::Integer(9)]);
    assert_eq!(printed("PRINT 10 - 4 - 3"), vec![Value::Integer(3)]);
    assert_eq!(printed("PRINT 2 * 3 - 4 * 5 + 6"), vec![Value::Integer(-8)]);
}

#[test]
fn division_is_true_division() {
    assert_eq!(printed("PRINT 7 / 2"), vec![Value::Real(3.5)]);
    assert_eq!(printed("PRINT 6 / 3"), vec![Value::Real(2.0)]);
}

#[test]
fn quotients_truncate_when_used_as_operands() {
    assert_eq!(printed("PRINT 7 / 2 + 1"), vec![Value::Integer(4)]);
    assert_eq!(printed("PRINT 7 / 2 == 3"), vec![Value::Boolean(true)]);
}

#[test]
fn division_by_zero_fails() {
    assert_eq!(runtime_error("PRINT 1 / 0"), "Division by zero");
}

#[test]
fn overflow_fails_instead_of_wrapping() {
    let message = runtime_error("x = 9223372036854775807\nPRINT x + 1");
    assert!(message.contains("overflow"), "{}", message);
}

#[test]
fn comparisons_yield_booleans() {
    assert_eq!(printed("PRINT TRUE == TRUE"), vec![Value::Boolean(true)]);
    assert_eq!(printed("PRINT 3 < 2"), vec![Value::Boolean(false)]);
    assert_eq!(printed("PRINT 3 > 2"), vec![Value::Boolean(true)]);
    assert_eq!(printed("PRINT 3 != 3"), vec![Value::Boolean(false)]);
    // Left-deep: (1 < 2) == TRUE
    assert_eq!(printed("PRINT 1 < 2 == TRUE"), vec![Value::Boolean(true)]);
}

#[test]
fn booleans_count_as_one_and_zero() {
    assert_eq!(printed("PRINT TRUE + TRUE"), vec![Value::Integer(2)]);
    assert_eq!(printed("PRINT FALSE == 0"), vec![Value::Boolean(true)]);
}

#[test]
fn printed_values_render_in_language_syntax() {
    let values = printed("v = [1, 2]\nPRINT v\nPRINT 1 < 2\nPRINT 3 / 2\nPRINT 4 / 2\nPRINT 5");
    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["[1, 2]", "TRUE", "1.5", "2.0", "5"]);
}

#[test]
fn repeated_evaluation_of_pure_expression_is_stable() {
    let values = printed("x = 4\nPRINT (x * 3) - 2 / x\nPRINT (x * 3) - 2 / x\nPRINT (x * 3) - 2 / x");
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| *v == values[0]));
}

// === Variables and vectors ===

#[test]
fn assignment_overwrites() {
    let evaluator = run("x = 1\nx = x + 41\nX = x * 1");
    assert_eq!(var(&evaluator, "x"), Value::Integer(42));
    assert_eq!(evaluator.symbols().len(), 1);
}

#[test]
fn undefined_variable_is_a_runtime_error() {
    assert_eq!(runtime_error("PRINT y"), "Undefined variable 'y'");
}

#[test]
fn vector_literal_evaluates_elements_at_assignment() {
    let evaluator = run("a = 2\nv = [a, a * 2, 9 / 2, TRUE]\na = 100");
    assert_eq!(var(&evaluator, "v"), Value::Vector(vec![2, 4, 4, 1]));
}

#[test]
fn empty_vector() {
    let evaluator = run("v = []");
    assert_eq!(var(&evaluator, "v"), Value::Vector(vec![]));
}

#[test]
fn indexed_read_and_write() {
    let evaluator = run("v = [10, 20, 0]\ni = 1\nv[i + 1] = v[i] + v[0]\nfirst = v[0]");
    assert_eq!(var(&evaluator, "v"), Value::Vector(vec![10, 20, 30]));
    assert_eq!(var(&evaluator, "first"), Value::Integer(10));
}

#[test]
fn indexing_errors() {
    assert!(runtime_error("x = 1\nPRINT x[0]").contains("Cannot index integer 'x'"));
    assert!(runtime_error("x = TRUE\nx[0] = 1").contains("Cannot index boolean 'x'"));
    assert!(runtime_error("v[0] = 1").contains("Undefined variable 'v'"));
    assert!(runtime_error("v = [1]\nPRINT v[1]").contains("out of range"));
    assert!(runtime_error("v = [1]\nPRINT v[0 - 1]").contains("must not be negative"));
}

#[test]
fn whole_vector_cannot_be_used_as_a_number() {
    let message = runtime_error("v = [1, 2]\nPRINT v + 1");
    assert_eq!(message, "Expected a number, got vector");
    assert!(runtime_error("v = [1]\nw = [v]").contains("got vector"));
}

#[test]
fn assigning_a_vector_copies_it() {
    let evaluator = run("v = [1, 2]\nw = v\nw[0] = 9");
    assert_eq!(var(&evaluator, "v"), Value::Vector(vec![1, 2]));
    assert_eq!(var(&evaluator, "w"), Value::Vector(vec![9, 2]));
}

// === Swap ===

#[test]
fn swap_scalars_then_print() {
    assert_eq!(
        printed("x = 2*2\ny = 2\nswap x y\nprint 1 + (x*y) - (6/x)"),
        vec![Value::Integer(6)]
    );
}

#[test]
fn swap_is_an_involution() {
    let pairs = [("3", "7"), ("TRUE", "5"), ("0", "0"), ("[1, 2]", "FALSE")];
    for (a, b) in pairs {
        let source = format!("a = {}\nb = {}\nSWAP a b\nSWAP a b", a, b);
        let once = run(&format!("a = {}\nb = {}", a, b));
        let twice = run(&source);
        assert_eq!(var(&twice, "a"), var(&once, "a"));
        assert_eq!(var(&twice, "b"), var(&once, "b"));
    }
}

#[test]
fn swap_two_elements_of_one_vector() {
    let evaluator = run("x = [1, 2, 3, 4]\nSWAP x[0] x[3]");
    assert_eq!(var(&evaluator, "x"), Value::Vector(vec![4, 2, 3, 1]));

    let evaluator = run("x = [1, 2, 3, 4]\ni = 2\nSWAP x[i] x[i]");
    assert_eq!(var(&evaluator, "x"), Value::Vector(vec![1, 2, 3, 4]));
}

#[test]
fn swap_elements_across_vectors() {
    let evaluator = run("a = [1, 2]\nb = [8, 9]\nSWAP a[1] b[0]");
    assert_eq!(var(&evaluator, "a"), Value::Vector(vec![1, 8]));
    assert_eq!(var(&evaluator, "b"), Value::Vector(vec![2, 9]));
}

#[test]
fn swap_element_with_scalar() {
    let evaluator = run("v = [5, 6]\nn = 1\nSWAP v[0] n");
    assert_eq!(var(&evaluator, "v"), Value::Vector(vec![1, 6]));
    assert_eq!(var(&evaluator, "n"), Value::Integer(5));

    let evaluator = run("v = [5, 6]\nn = 1\nSWAP n v[1]");
    assert_eq!(var(&evaluator, "v"), Value::Vector(vec![5, 1]));
    assert_eq!(var(&evaluator, "n"), Value::Integer(6));
}

#[test]
fn swap_element_with_non_integer_is_rejected_without_writing() {
    let source = "v = [5, 6]\nflag = TRUE\nSWAP v[0] flag";
    let message = runtime_error(source);
    assert!(message.contains("Cannot swap boolean 'flag'"), "{}", message);

    // Nothing is written when the exchange is refused
    let mut evaluator = Evaluator::capturing();
    let (_, program) = parse_source(source).unwrap();
    assert!(evaluator.evaluate_program(&program).is_err());
    assert_eq!(var(&evaluator, "v"), Value::Vector(vec![5, 6]));
    assert_eq!(var(&evaluator, "flag"), Value::Boolean(true));
}

#[test]
fn swap_element_with_real_truncates_like_assignment() {
    let assigned = run("v = [5, 6]\nv[0] = 7 / 2");
    let swapped = run("v = [5, 6]\nq = 7 / 2\nSWAP v[0] q");
    assert_eq!(var(&assigned, "v"), Value::Vector(vec![3, 6]));
    assert_eq!(var(&swapped, "v"), Value::Vector(vec![3, 6]));
    assert_eq!(var(&swapped, "q"), Value::Integer(5));

    let evaluator = run("v = [5, 6]\nq = 6 / 3\nSWAP q v[1]");
    assert_eq!(var(&evaluator, "v"), Value::Vector(vec![5, 2]));
    assert_eq!(var(&evaluator, "q"), Value::Integer(6));
}

#[test]
fn swap_element_with_vector_is_rejected() {
    let message = runtime_error("v = [5, 6]\nw = [1]\nSWAP v[0] w");
    assert!(message.contains("Cannot swap vector 'w'"), "{}", message);
}

#[test]
fn swap_with_undefined_variable_fails() {
    assert!(runtime_error("a = 1\nSWAP a b").contains("Undefined variable 'b'"));
}

// === Control flow ===

#[test]
fn if_takes_only_the_true_branch() {
    assert_eq!(
        printed("IF 1 < 2 { PRINT 1 } ELSE { PRINT 2 }"),
        vec![Value::Integer(1)]
    );
}

#[test]
fn if_takes_only_the_else_branch() {
    assert_eq!(
        printed("IF 1 > 2 { PRINT 1 } ELSE { PRINT 2 }"),
        vec![Value::Integer(2)]
    );
}

#[test]
fn if_without_else_does_nothing_when_false() {
    assert!(printed("IF FALSE { PRINT 1 }").is_empty());
}

#[test]
fn numeric_conditions_are_true_when_non_zero() {
    assert_eq!(printed("IF 3 { PRINT 1 }"), vec![Value::Integer(1)]);
    assert!(printed("IF 0 { PRINT 1 }").is_empty());
}

#[test]
fn vector_condition_is_a_runtime_error() {
    let message = runtime_error("v = [1]\nIF v { PRINT 1 }");
    assert_eq!(message, "Condition must be a boolean, got vector");
}

#[test]
fn while_false_never_runs_its_body() {
    let evaluator = run("x = 0\nWHILE FALSE { x = x + 1 }\nWHILE x > 5 { x = 99 }");
    assert_eq!(var(&evaluator, "x"), Value::Integer(0));
}

#[test]
fn while_repeats_until_condition_fails() {
    assert_eq!(
        printed("i = 0\nWHILE i < 4 { i = i + 1 }\nPRINT i"),
        vec![Value::Integer(4)]
    );
}

#[test]
fn nested_blocks_share_one_symbol_table() {
    let evaluator = run("i = 0\ntotal = 0\nWHILE i < 3 {\n  IF i == 1 { inner = 5 }\n  total = total + i\n  i = i + 1\n}");
    assert_eq!(var(&evaluator, "total"), Value::Integer(3));
    assert_eq!(var(&evaluator, "inner"), Value::Integer(5));
}

// === Tags ===

#[test]
fn declared_tag_runs_only_when_invoked() {
    let evaluator = run("@inc x = x + 1\nx = 1\n@inc\n");
    assert_eq!(var(&evaluator, "x"), Value::Integer(2));
}

#[test]
fn tag_can_be_invoked_repeatedly() {
    assert_eq!(
        printed("x = 0\n@inc x = x + 1\n@inc\n@inc\n@inc\nPRINT x"),
        vec![Value::Integer(3)]
    );
}

#[test]
fn tag_invocation_inside_loop() {
    assert_eq!(
        printed("@step i = i + 2\ni = 0\nWHILE i < 10 { @step }\nPRINT i"),
        vec![Value::Integer(10)]
    );
}

#[test]
fn last_declaration_in_source_order_wins() {
    // Both invocations see the final body, bound before the program runs
    assert_eq!(
        printed("@say PRINT 1\n@say\n@say PRINT 2\n@say\n"),
        vec![Value::Integer(2), Value::Integer(2)]
    );
}

#[test]
fn tag_can_be_invoked_before_its_declaration() {
    assert_eq!(printed("@t\n@t PRINT 7\n"), vec![Value::Integer(7)]);
}

#[test]
fn tag_declared_in_a_skipped_block_is_still_bound() {
    assert_eq!(
        printed("IF FALSE { @t PRINT 1 }\n@t\n"),
        vec![Value::Integer(1)]
    );
    assert_eq!(
        printed("WHILE FALSE { @t x = 3 }\n@t\nPRINT x"),
        vec![Value::Integer(3)]
    );
}

#[test]
fn running_a_declaration_does_not_run_its_body() {
    let evaluator = run("x = 1\n@inc x = x + 1\ni = 0\nWHILE i < 3 { @dec x = x - 1\n i = i + 1 }");
    assert_eq!(var(&evaluator, "x"), Value::Integer(1));
}

#[test]
fn tag_body_can_be_a_block_statement() {
    assert_eq!(
        printed("@clamp IF x > 10 { x = 10 }\nx = 50\n@clamp\nPRINT x"),
        vec![Value::Integer(10)]
    );
}

#[test]
fn invoking_a_tag_never_given_a_body_fails() {
    assert_eq!(runtime_error("@later\n"), "Tag '@later' has no body");
    assert_eq!(
        runtime_error("x = 1\nIF FALSE { @other x = 2 }\n@later\n"),
        "Tag '@later' has no body"
    );
}

#[test]
fn all_tag_names_are_registered_before_running() {
    let evaluator = run("@a PRINT 1\nIF FALSE { @b PRINT 2\n@c }");
    let names: Vec<(String, bool)> = evaluator
        .tags()
        .iter()
        .map(|(name, body)| (name.clone(), body.is_some()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("a".to_string(), true),
            ("b".to_string(), true),
            ("c".to_string(), false),
        ]
    );
}

#[test]
fn self_invoking_tag_hits_the_depth_limit() {
    let source = "@forever @forever\n@forever\n";
    let (_, program) = parse_source(source).unwrap();
    let mut evaluator = Evaluator::capturing();
    evaluator.set_max_tag_depth(16);
    let error = evaluator.evaluate_program(&program).unwrap_err();
    assert_eq!(error.kind, ErrorKind::RuntimeError);
    assert!(error.message.contains("nested deeper than 16"), "{}", error.message);
}

// === Run lifecycle ===

#[test]
fn errors_keep_earlier_side_effects() {
    let mut evaluator = Evaluator::capturing();
    let (_, program) = parse_source("x = 1\nPRINT x\nPRINT y\nx = 2").unwrap();
    assert!(evaluator.evaluate_program(&program).is_err());
    assert_eq!(evaluator.captured(), &[Value::Integer(1)]);
    assert_eq!(var(&evaluator, "x"), Value::Integer(1));
}

#[test]
fn reset_clears_tables_and_captured_output() {
    let mut evaluator = Evaluator::capturing();
    let (_, program) = parse_source("@t PRINT 1\nx = 1\n@t\n").unwrap();
    evaluator.evaluate_program(&program).unwrap();
    assert_eq!(evaluator.captured().len(), 1);

    evaluator.reset();
    assert!(evaluator.symbols().is_empty());
    assert!(evaluator.tags().is_empty());
    assert!(evaluator.captured().is_empty());
}

#[test]
fn console_output_captures_nothing() {
    let mut evaluator = Evaluator::new();
    assert_eq!(evaluator.output(), &Output::Console);
    let (_, program) = parse_source("x = 3").unwrap();
    evaluator.evaluate_program(&program).unwrap();
    assert!(evaluator.captured().is_empty());
}

// === Canonical rendering ===

#[test]
fn rendering_reparses_to_the_same_shape() {
    let source = "x = 2*2\ny = [1, x, 3]\n@inc x = x + 1\n@inc\nSWAP x y[1]\nIF x < 3 == FALSE { PRINT (x - 1) * 2 } ELSE { WHILE x > 0 { x = x - 1 } }\nPRINT y[0] / 2";
    let (_, program) = parse_source(source).unwrap();
    let rendered = program.to_string();
    let (_, reparsed) = parse_source(&rendered).unwrap();
    assert_eq!(reparsed.to_string(), rendered);
    assert_eq!(reparsed.statements.len(), program.statements.len());
    assert!(rendered.contains("x = (2 * 2)"));
    assert!(rendered.contains("IF x < 3 == FALSE {"));
}
