use indoc::indoc;

use super::*;

const INI: &str = indoc! {r"
    grammar ini;

    document : line* ;
    line     : section | pair | comment ;
    section  : '[' NAME ']' NL ;
    pair     : NAME '=' VALUE NL ;
    comment  : COMMENT NL ;

    NAME    : /[A-Za-z_][A-Za-z0-9_.-]*/ ;
    COMMENT : /;[^\n]*/ ;
    VALUE   : /[^\n;=\[\]]+/ ;
    NL      : '\n' ;
    WS      : /[ \t]+/ -> hidden ;
"};

#[test]
fn parses_ini_grammar() {
    let grammar = parse_grammar(INI).unwrap();
    assert_eq!(grammar.name(), "ini");
    assert_eq!(grammar.start(), "document");
    assert_eq!(grammar.rules().count(), 5);
    assert_eq!(grammar.tokens().count(), 5);
}

#[test]
fn first_rule_is_start() {
    let grammar = parse_grammar("grammar g; a : B ; b : B ; B : 'x' ;").unwrap();
    assert_eq!(grammar.start(), "a");
}

#[test]
fn channel_directives() {
    let grammar = parse_grammar(indoc! {r"
        grammar g;
        a : B ;
        B  : 'b' ;
        WS : /[ ]+/ -> hidden ;
        BOM : /\x{feff}/ -> skip ;
    "})
    .unwrap();
    assert_eq!(grammar.token("B").unwrap().channel, Channel::Default);
    assert_eq!(grammar.token("WS").unwrap().channel, Channel::Hidden);
    assert_eq!(grammar.token("BOM").unwrap().channel, Channel::Skip);
}

#[test]
fn literal_escapes_are_interpreted() {
    let grammar = parse_grammar("grammar g; a : NL ; NL : '\\n' ;").unwrap();
    assert_eq!(
        grammar.token("NL").unwrap().pattern,
        TokenPattern::Literal("\n".to_owned())
    );
}

#[test]
fn regex_slash_escape() {
    let grammar = parse_grammar(r"grammar g; a : P ; P : /a\/b/ ;").unwrap();
    assert_eq!(
        grammar.token("P").unwrap().pattern,
        TokenPattern::Regex("a/b".to_owned())
    );
}

#[test]
fn quantifiers_and_groups() {
    let grammar = parse_grammar("grammar g; a : B? (C | D)* E+ ; B : 'b' ; C : 'c' ; D : 'd' ; E : 'e' ;")
        .unwrap();
    let rule = grammar.rule("a").unwrap();
    let terms = &rule.alts[0].terms;
    assert_eq!(terms.len(), 3);
    assert_eq!(terms[0].quant, Quant::Opt);
    assert_eq!(terms[1].quant, Quant::Star);
    assert!(matches!(terms[1].atom, Atom::Group(ref alts) if alts.len() == 2));
    assert_eq!(terms[2].quant, Quant::Plus);
}

#[test]
fn inline_literals_are_collected_once() {
    let grammar = parse_grammar("grammar g; a : '[' b '[' ; b : ']' ;").unwrap();
    assert_eq!(grammar.inline_literals(), vec!["[", "]"]);
}

#[test]
fn line_comments_are_skipped() {
    let grammar = parse_grammar(indoc! {"
        grammar g; // a grammar
        a : B ; // the rule
        B : 'b' ;
    "})
    .unwrap();
    assert_eq!(grammar.rules().count(), 1);
}

#[test]
fn classifies_left_recursion() {
    let grammar = parse_grammar("grammar g; e : e '+' t | t ; t : N ; N : /[0-9]+/ ;").unwrap();
    assert_eq!(grammar.rule("e").unwrap().recursion, Recursion::Left);
    assert_eq!(grammar.rule("t").unwrap().recursion, Recursion::None);
}

#[test]
fn classifies_right_recursion() {
    let grammar = parse_grammar("grammar g; l : X ',' l | X ; X : 'x' ;").unwrap();
    assert_eq!(grammar.rule("l").unwrap().recursion, Recursion::Right);
}

#[test]
fn undefined_reference_is_rejected() {
    let err = parse_grammar("grammar g; a : missing ;").unwrap_err();
    assert!(matches!(err, GrammarError::Undefined { .. }));
}

#[test]
fn duplicate_rule_is_rejected() {
    let err = parse_grammar("grammar g; a : B ; a : B ; B : 'b' ;").unwrap_err();
    assert!(matches!(err, GrammarError::Duplicate(_)));
}

#[test]
fn missing_semicolon_reports_position() {
    let err = parse_grammar("grammar g; a : B \n B : 'b' ;").unwrap_err();
    let GrammarError::Syntax { line, .. } = err else {
        panic!("expected syntax error, got {err:?}");
    };
    assert_eq!(line, 2);
}

#[test]
fn empty_alternative_is_rejected() {
    let err = parse_grammar("grammar g; a : B | ; B : 'b' ;").unwrap_err();
    assert!(matches!(err, GrammarError::Syntax { .. }));
}

#[test]
fn grammar_without_parser_rules_is_rejected() {
    let err = parse_grammar("grammar g; B : 'b' ;").unwrap_err();
    assert!(matches!(err, GrammarError::Empty(_)));
}
