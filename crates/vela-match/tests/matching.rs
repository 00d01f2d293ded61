use std::time::{Duration, Instant};

use vela_core::value::Value;
use vela_match::{compile_pattern, compile_pattern_nfa, CompileError, Pattern, Strategy};

fn sym(s: &str) -> Value { Value::Symbol(s.into()) }
fn int(n: i64) -> Value { Value::Integer(n) }
fn list(items: Vec<Value>) -> Value { Value::List(items) }
fn ints(ns: &[i64]) -> Vec<Value> { ns.iter().copied().map(Value::Integer).collect() }
fn call(h: &str, args: Vec<Value>) -> Value { Value::expr(sym(h), args) }

#[test]
fn greedy_capture_takes_everything_first() {
    // (x:_Integer*, y:_Integer*) against {1, 2, 3}: x wins the tie.
    let pattern = Pattern::sequence(vec![
        Pattern::named("x", Pattern::zero_or_more(Pattern::head("Integer"), true)),
        Pattern::named("y", Pattern::zero_or_more(Pattern::head("Integer"), true)),
    ]);
    let m = compile_pattern(&pattern).unwrap();
    assert_eq!(m.strategy(), Strategy::Nfa);

    let r = m.match_expr(&list(ints(&[1, 2, 3])));
    assert!(r.matched);
    assert_eq!(r.bindings.get("x"), Some(&list(ints(&[1, 2, 3]))));
    assert_eq!(r.bindings.get("y"), None);
    assert_eq!(r.consumed, 3);
}

#[test]
fn lazy_capture_takes_as_little_as_possible() {
    let pattern = Pattern::sequence(vec![
        Pattern::named("x", Pattern::zero_or_more(Pattern::head("Integer"), false)),
        Pattern::named("y", Pattern::zero_or_more(Pattern::head("Integer"), true)),
    ]);
    let m = compile_pattern(&pattern).unwrap();

    let r = m.match_expr(&list(ints(&[1, 2, 3])));
    assert!(r.matched);
    assert_eq!(r.bindings.get("x"), None);
    assert_eq!(r.bindings.get("y"), Some(&list(ints(&[1, 2, 3]))));
}

#[test]
fn trailing_one_or_more_requires_an_element() {
    let pattern = Pattern::sequence(vec![
        Pattern::literal(Value::string("prefix")),
        Pattern::one_or_more(Pattern::head("Integer"), true),
    ]);
    let m = compile_pattern(&pattern).unwrap();
    assert_eq!(m.strategy(), Strategy::Direct);

    assert!(!m.match_expr(&list(vec![Value::string("prefix")])).matched);
    let r = m.match_expr(&list(vec![Value::string("prefix"), int(1), int(2)]));
    assert!(r.matched);
    assert_eq!(r.consumed, 3);
}

#[test]
fn single_then_rest_scenario() {
    // (x:_Integer, y:_Integer+) against {1, 2, 3} binds x = 1, y = {2, 3}.
    let pattern = Pattern::sequence(vec![
        Pattern::named("x", Pattern::head("Integer")),
        Pattern::named("y", Pattern::one_or_more(Pattern::head("Integer"), true)),
    ]);
    let m = compile_pattern(&pattern).unwrap();

    let r = m.match_expr(&list(ints(&[1, 2, 3])));
    assert!(r.matched);
    assert_eq!(r.bindings.get("x"), Some(&int(1)));
    assert_eq!(r.bindings.get("y"), Some(&list(ints(&[2, 3]))));
}

#[test]
fn match_children_takes_a_sibling_sequence() {
    let pattern = Pattern::sequence(vec![
        Pattern::named("x", Pattern::head("Integer")),
        Pattern::named("y", Pattern::one_or_more(Pattern::head("Integer"), true)),
    ]);
    let m = compile_pattern(&pattern).unwrap();

    let r = m.match_children(&ints(&[1, 2, 3]));
    assert!(r.matched);
    assert_eq!(r.bindings.get("x"), Some(&int(1)));
    assert_eq!(r.bindings.get("y"), Some(&list(ints(&[2, 3]))));
}

#[test]
fn alternation_rejects_other_heads() {
    let pattern = Pattern::alt(vec![Pattern::head("Integer"), Pattern::head("String")]);
    let m = compile_pattern(&pattern).unwrap();
    assert_eq!(m.strategy(), Strategy::Nfa);

    assert!(!m.match_expr(&sym("s")).matched);
    assert!(m.match_expr(&int(3)).matched);
    assert!(m.match_expr(&Value::string("s")).matched);
}

#[test]
fn alternation_binds_the_matching_arm() {
    let pattern = Pattern::alt(vec![
        Pattern::named("n", Pattern::head("Integer")),
        Pattern::named("s", Pattern::head("String")),
    ]);
    let m = compile_pattern(&pattern).unwrap();

    let r = m.match_expr(&Value::string("hi"));
    assert!(r.matched);
    assert_eq!(r.bindings.get("n"), None);
    assert_eq!(r.bindings.get("s"), Some(&Value::string("hi")));
}

#[test]
fn sublist_captures_are_isolated_from_the_enclosing_level() {
    // {{x:_Integer, x:_Integer}} against {{1, 2}}: both captures live in
    // the sub-list's own slots; at one level the same name is one slot and
    // the later capture wins.
    let pattern = Pattern::sequence(vec![Pattern::sequence(vec![
        Pattern::named("x", Pattern::head("Integer")),
        Pattern::named("x", Pattern::head("Integer")),
    ])]);
    let m = compile_pattern(&pattern).unwrap();

    let r = m.match_expr(&list(vec![list(ints(&[1, 2]))]));
    assert!(r.matched);
    assert_eq!(r.bindings.get("x"), Some(&int(2)));
    // Deterministic across repeated matches on the same compiled pattern.
    assert_eq!(m.match_expr(&list(vec![list(ints(&[1, 2]))])), r);
}

#[test]
fn sublist_bindings_merge_next_to_enclosing_ones() {
    let pattern = Pattern::sequence(vec![
        Pattern::named("a", Pattern::any()),
        Pattern::sequence(vec![
            Pattern::named("b", Pattern::head("Integer")),
            Pattern::named("c", Pattern::head("Integer")),
        ]),
    ]);
    let m = compile_pattern(&pattern).unwrap();

    let r = m.match_expr(&list(vec![sym("outer"), list(ints(&[1, 2]))]));
    assert!(r.matched);
    assert_eq!(r.bindings.get("a"), Some(&sym("outer")));
    assert_eq!(r.bindings.get("b"), Some(&int(1)));
    assert_eq!(r.bindings.get("c"), Some(&int(2)));
}

#[test]
fn quantifier_stack_matches_in_polynomial_time() {
    // (a?){k} followed by a{k} against k literal a's: the classic
    // backtracking killer. The simulation stays linear in k.
    let k = 30;
    let a = sym("a");
    let mut items = Vec::new();
    for _ in 0..k {
        items.push(Pattern::optional(Pattern::literal(a.clone()), true));
    }
    for _ in 0..k {
        items.push(Pattern::literal(a.clone()));
    }
    let m = compile_pattern(&Pattern::sequence(items)).unwrap();
    assert_eq!(m.strategy(), Strategy::Nfa);

    let input = list(vec![a; k]);
    let start = Instant::now();
    let r = m.match_expr(&input);
    assert!(r.matched);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn results_are_deterministic() {
    let pattern = Pattern::sequence(vec![
        Pattern::named("x", Pattern::zero_or_more(Pattern::head("Integer"), true)),
        Pattern::named("y", Pattern::any()),
    ]);
    let input = list(vec![int(1), int(2), sym("t")]);

    let m1 = compile_pattern(&pattern).unwrap();
    let m2 = compile_pattern(&pattern).unwrap();
    let r1 = m1.match_expr(&input);
    let r2 = m2.match_expr(&input);
    assert_eq!(r1, r2);
    assert_eq!(m1.match_expr(&input), r1);
}

#[test]
fn structurally_invalid_patterns_fail_compilation() {
    assert!(matches!(
        compile_pattern(&Pattern::Sequence(vec![])).unwrap_err(),
        CompileError::EmptySequence
    ));
    assert!(matches!(
        compile_pattern(&Pattern::Alt(vec![])).unwrap_err(),
        CompileError::EmptyAlternation
    ));
    assert!(matches!(
        compile_pattern(&Pattern::not(Pattern::one_or_more(Pattern::any(), true))).unwrap_err(),
        CompileError::UnsupportedPatternKind(_)
    ));
}

#[test]
fn negation_of_a_head_test() {
    let m = compile_pattern(&Pattern::not(Pattern::head("String"))).unwrap();
    assert!(m.match_expr(&int(1)).matched);
    assert!(!m.match_expr(&Value::string("s")).matched);
}

#[test]
fn negation_of_a_composite_runs_it_as_a_sub_program() {
    // !(_Integer | _Real) accepts anything non-numeric.
    let numeric = Pattern::alt(vec![Pattern::head("Integer"), Pattern::head("Real")]);
    let m = compile_pattern(&Pattern::not(numeric)).unwrap();
    assert!(m.match_expr(&sym("t")).matched);
    assert!(!m.match_expr(&int(1)).matched);
    assert!(!m.match_expr(&Value::Real(1.5)).matched);
}

#[test]
fn negation_of_a_sequence_means_not_such_a_sublist() {
    let m = compile_pattern(&Pattern::not(Pattern::sequence(vec![Pattern::head("Integer")])))
        .unwrap();
    // A one-integer list is exactly the negated shape.
    assert!(!m.match_expr(&list(ints(&[1]))).matched);
    assert!(m.match_expr(&list(ints(&[1, 2]))).matched);
    assert!(m.match_expr(&int(1)).matched);
}

#[test]
fn predicate_runs_only_after_the_structural_test() {
    let positive = |v: &Value| matches!(v, Value::Integer(n) if *n > 0);
    let pattern = Pattern::predicate(Pattern::head("Integer"), "positive", positive);
    let m = compile_pattern(&pattern).unwrap();
    assert_eq!(m.strategy(), Strategy::Direct);

    assert!(m.match_expr(&int(5)).matched);
    assert!(!m.match_expr(&int(-5)).matched);
    assert!(!m.match_expr(&sym("p")).matched);
}

#[test]
fn panicking_predicate_is_a_non_match_on_both_engines() {
    let pattern = Pattern::predicate(Pattern::any(), "boom", |_| panic!("boom"));
    let direct = compile_pattern(&pattern).unwrap();
    assert_eq!(direct.strategy(), Strategy::Direct);
    assert!(!direct.match_expr(&int(1)).matched);

    let nfa = compile_pattern_nfa(&pattern).unwrap();
    assert!(!nfa.match_expr(&int(1)).matched);
}

#[test]
fn compound_requires_its_head() {
    let pattern = Pattern::compound(
        Some("Plus".into()),
        vec![Pattern::named("a", Pattern::any()), Pattern::literal(int(0))],
    );
    let m = compile_pattern(&pattern).unwrap();
    assert_eq!(m.strategy(), Strategy::Direct);

    let r = m.match_expr(&call("Plus", vec![sym("t"), int(0)]));
    assert!(r.matched);
    assert_eq!(r.bindings.get("a"), Some(&sym("t")));

    assert!(!m.match_expr(&call("Times", vec![sym("t"), int(0)])).matched);
    assert!(!m.match_expr(&int(3)).matched);
}

#[test]
fn headless_compound_matches_any_list_like_node() {
    let pattern = Pattern::compound(None, vec![Pattern::named("a", Pattern::any())]);
    let m = compile_pattern(&pattern).unwrap();
    assert!(m.match_expr(&list(vec![int(9)])).matched);
    assert!(m.match_expr(&call("f", vec![int(9)])).matched);
    assert!(!m.match_expr(&int(9)).matched);
}

#[test]
fn compound_inside_a_sequence_matches_one_child() {
    let pattern = Pattern::sequence(vec![
        Pattern::head("Integer"),
        Pattern::compound(Some("f".into()), vec![Pattern::named("x", Pattern::any())]),
    ]);
    let m = compile_pattern(&pattern).unwrap();

    let r = m.match_expr(&list(vec![int(1), call("f", vec![int(42)])]));
    assert!(r.matched);
    assert_eq!(r.bindings.get("x"), Some(&int(42)));
    assert!(!m.match_expr(&list(vec![int(1), call("g", vec![int(42)])])).matched);
}

#[test]
fn optional_tail_takes_zero_or_one() {
    let pattern = Pattern::sequence(vec![
        Pattern::literal(int(1)),
        Pattern::optional(Pattern::head("Integer"), true),
    ]);
    let m = compile_pattern(&pattern).unwrap();
    assert_eq!(m.strategy(), Strategy::Direct);

    assert!(m.match_expr(&list(ints(&[1]))).matched);
    assert!(m.match_expr(&list(ints(&[1, 2]))).matched);
    assert!(!m.match_expr(&list(ints(&[1, 2, 3]))).matched);
}

#[test]
fn named_sequence_binds_the_whole_node() {
    let pattern = Pattern::named("xs", Pattern::sequence(vec![Pattern::any(), Pattern::any()]));
    let m = compile_pattern(&pattern).unwrap();
    assert_eq!(m.strategy(), Strategy::Direct);

    let input = list(vec![int(1), int(2)]);
    let r = m.match_expr(&input);
    assert!(r.matched);
    assert_eq!(r.bindings.get("xs"), Some(&input));
    assert_eq!(r.consumed, 1);
}

#[test]
fn lazy_one_or_more_stops_early() {
    let pattern = Pattern::sequence(vec![
        Pattern::named("x", Pattern::one_or_more(Pattern::any(), false)),
        Pattern::named("y", Pattern::zero_or_more(Pattern::any(), true)),
    ]);
    let m = compile_pattern(&pattern).unwrap();

    let r = m.match_expr(&list(ints(&[1, 2, 3])));
    assert!(r.matched);
    assert_eq!(r.bindings.get("x"), Some(&int(1)));
    assert_eq!(r.bindings.get("y"), Some(&list(ints(&[2, 3]))));
}

#[test]
fn empty_capture_yields_no_binding_and_one_element_binds_directly() {
    let pattern = Pattern::sequence(vec![
        Pattern::named("xs", Pattern::zero_or_more(Pattern::head("Integer"), true)),
    ]);
    let m = compile_pattern(&pattern).unwrap();

    let empty = m.match_expr(&list(vec![]));
    assert!(empty.matched);
    assert!(empty.bindings.is_empty());
    assert_eq!(empty.consumed, 0);

    let one = m.match_expr(&list(ints(&[7])));
    assert!(one.matched);
    assert_eq!(one.bindings.get("xs"), Some(&int(7)));
}

#[test]
fn nesting_beyond_the_depth_bound_is_a_non_match() {
    let mut pattern = Pattern::sequence(vec![Pattern::head("Integer")]);
    let mut input = list(ints(&[1]));
    for _ in 0..8 {
        pattern = Pattern::sequence(vec![pattern]);
        input = list(vec![input]);
    }

    let m = compile_pattern(&pattern).unwrap();
    assert!(m.match_expr(&input).matched);
    let shallow = compile_pattern(&pattern).unwrap().with_max_depth(4);
    assert!(!shallow.match_expr(&input).matched);

    let nfa = compile_pattern_nfa(&pattern).unwrap();
    assert!(nfa.match_expr(&input).matched);
    let shallow_nfa = compile_pattern_nfa(&pattern).unwrap().with_max_depth(4);
    assert!(!shallow_nfa.match_expr(&input).matched);
}

#[test]
fn type_mismatch_is_a_plain_non_match() {
    let pattern = Pattern::sequence(vec![Pattern::head("Integer")]);
    let m = compile_pattern(&pattern).unwrap();
    // Atoms have no children to match a sequence against.
    assert!(!m.match_expr(&int(1)).matched);
    assert!(!m.match_expr(&Value::assoc(vec![("k", int(1))])).matched);
}
