use indexmap::IndexMap;
use indoc::indoc;

use super::*;

fn compute(source: &str) -> Replacements {
    let grammar = parse_grammar(source).unwrap();
    compute_replacements(&grammar, &IndexMap::new()).unwrap()
}

#[test]
fn literal_token_is_its_own_replacement() {
    let reps = compute("grammar g; a : NL ; NL : '\\n' ;");
    assert_eq!(reps.token("NL"), Some("\n"));
}

#[test]
fn regex_token_shortest_string() {
    let reps = compute("grammar g; a : N ; N : /[0-9]+/ ;");
    assert_eq!(reps.token("N"), Some("0"));
}

#[test]
fn regex_accepting_empty_yields_empty() {
    let reps = compute("grammar g; a : V B ; V : /[a-z]*/ ; B : 'b' ;");
    assert_eq!(reps.token("V"), Some(""));
}

#[test]
fn regex_alternation_prefers_shortest_then_earliest() {
    let reps = compute("grammar g; a : K ; K : /abc|xy|zz/ ;");
    assert_eq!(reps.token("K"), Some("xy"));
}

#[test]
fn bounded_repetition_repeats_minimum() {
    let reps = compute("grammar g; a : H ; H : /[a]{3}/ ;");
    assert_eq!(reps.token("H"), Some("aaa"));
}

#[test]
fn rule_takes_shortest_alternative() {
    let reps = compute(indoc! {"
        grammar g;
        a : long | short ;
        long  : X X X ;
        short : X ;
        X : 'x' ;
    "});
    assert_eq!(reps.rule("a"), Some("x"));
    assert_eq!(reps.rule("long"), Some("xxx"));
}

#[test]
fn equal_length_ties_take_the_first_alternative() {
    let reps = compute(indoc! {"
        grammar g;
        a : B | C ;
        B : 'b' ;
        C : 'c' ;
    "});
    assert_eq!(reps.rule("a"), Some("b"));
}

#[test]
fn optional_and_star_parts_contribute_nothing() {
    let reps = compute("grammar g; a : B? C* D ; B : 'b' ; C : 'c' ; D : 'd' ;");
    assert_eq!(reps.rule("a"), Some("d"));
}

#[test]
fn plus_contributes_one_occurrence() {
    let reps = compute("grammar g; a : B+ ; B : 'bb' ;");
    assert_eq!(reps.rule("a"), Some("bb"));
}

#[test]
fn left_recursive_rule_resolves_through_base_case() {
    let reps = compute("grammar g; e : e '+' t | t ; t : N ; N : /[0-9]+/ ;");
    assert_eq!(reps.rule("e"), Some("0"));
    assert_eq!(reps.rule("t"), Some("0"));
}

#[test]
fn inline_literals_are_keyed_by_quoted_name() {
    let reps = compute("grammar g; a : '[' B ']' ; B : 'b' ;");
    assert_eq!(reps.token(&literal_token_name("[")), Some("["));
    assert_eq!(reps.token(&literal_token_name("]")), Some("]"));
}

#[test]
fn overrides_pin_rule_replacements() {
    let grammar = parse_grammar("grammar g; a : B+ ; B : 'b' ;").unwrap();
    let mut overrides = IndexMap::new();
    overrides.insert("a".to_owned(), "bbb".to_owned());
    let reps = compute_replacements(&grammar, &overrides).unwrap();
    assert_eq!(reps.rule("a"), Some("bbb"));
}

#[test]
fn recursion_without_base_case_is_unresolvable() {
    let grammar = parse_grammar("grammar g; a : a X ; X : 'x' ;").unwrap();
    let err = compute_replacements(&grammar, &IndexMap::new()).unwrap_err();
    assert!(matches!(err, GrammarError::ReplacementUnresolvable(_)));
}

#[test]
fn mutual_recursion_without_base_case_is_unresolvable() {
    let grammar = parse_grammar("grammar g; a : b ; b : a ;").unwrap();
    let err = compute_replacements(&grammar, &IndexMap::new()).unwrap_err();
    assert!(matches!(err, GrammarError::ReplacementUnresolvable(_)));
}

#[test]
fn unresolvable_rule_in_optional_position_is_tolerated() {
    // `loop` has no finite derivation but can never be forced.
    let reps = compute(indoc! {"
        grammar g;
        a : X rec? ;
        rec : rec X ;
        X : 'x' ;
    "});
    assert_eq!(reps.rule("a"), Some("x"));
    assert_eq!(reps.rule("rec"), Some(""));
}

#[test]
fn mandatory_reference_to_unresolvable_rule_is_fatal() {
    let grammar =
        parse_grammar("grammar g; a : X b ; b : rec ; rec : rec X ; X : 'x' ;").unwrap();
    let err = compute_replacements(&grammar, &IndexMap::new()).unwrap_err();
    assert!(matches!(err, GrammarError::ReplacementUnresolvable(_)));
}
