//! End-to-end reduction scenarios over small grammars.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use indexmap::IndexMap;
use indoc::indoc;

use crate::build::build_tree;
use crate::bundle::Bundle;
use crate::oracle::FnOracle;
use crate::session::{ReduceConfig, ReduceError, ReduceSession, Reduction, Variant};

const INI: &str = indoc! {r"
    grammar ini;

    document : line* ;
    line     : section | pair | comment ;
    section  : '[' NAME ']' NL ;
    pair     : NAME '=' value NL ;
    value    : VALUE | NAME ;
    comment  : COMMENT NL ;

    NAME    : /[A-Za-z_][A-Za-z0-9_.-]*/ ;
    COMMENT : /;[^\n]*/ ;
    VALUE   : /[^\n;=\[\]]+/ ;
    NL      : '\n' ;
    WS      : /[ \t]+/ -> hidden ;
"};

const JSON: &str = indoc! {r#"
    grammar json;

    value  : object | STR | NUM ;
    object : '{' member (',' member)* '}' ;
    member : STR ':' value ;

    STR : /"[^"]*"/ ;
    NUM : /[0-9]+/ ;
    WS  : /[ \t\n]+/ -> hidden ;
"#};

fn ini_bundle() -> Bundle {
    let mut bundle = Bundle::new();
    bundle.add_grammar(INI, &IndexMap::new()).unwrap();
    bundle
}

fn reduce(
    bundle: &Bundle,
    start: &str,
    input: &str,
    config: ReduceConfig,
    oracle: impl Fn(&[u8]) -> bool,
) -> Reduction {
    let built = build_tree(bundle, start, input).unwrap();
    ReduceSession::new(built.tree, FnOracle::new(oracle), config)
        .run()
        .unwrap()
}

fn text(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap_or("")
}

#[test]
fn ini_comment_line_is_removed() {
    let oracle = |bytes: &[u8]| text(bytes).contains("k=v");
    let result = reduce(
        &ini_bundle(),
        "document",
        "[s]\nk=v\n; bye\n",
        ReduceConfig::default(),
        oracle,
    );

    assert_eq!(result.output, "k=v\n");
    assert!(oracle(result.output.as_bytes()));
    assert!(result.stats.final_bytes <= result.stats.initial_bytes);
}

#[test]
fn json_island_inside_ini_is_reduced() {
    let mut bundle = ini_bundle();
    bundle.add_grammar(JSON, &IndexMap::new()).unwrap();
    bundle
        .add_island("ini", "VALUE", r"(?P<json>\{.*\})", "json", "value")
        .unwrap();

    let oracle = |bytes: &[u8]| {
        let text = text(bytes);
        if !text.starts_with("[s]\n") {
            return false;
        }
        let Some(line) = text.lines().find(|l| l.starts_with("j=")) else {
            return false;
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&line[2..]) else {
            return false;
        };
        value.get("a").is_some()
    };

    let result = reduce(
        &bundle,
        "ini:document",
        "[s]\nj={\"a\":1,\"b\":2}\n",
        ReduceConfig::default(),
        oracle,
    );

    assert_eq!(result.output, "[s]\nj={\"a\":1}\n");
    assert!(oracle(result.output.as_bytes()));
}

#[test]
fn left_recursive_arithmetic_keeps_one_operator() {
    let mut bundle = Bundle::new();
    bundle
        .add_grammar(
            "grammar expr; e : e '+' t | t ; t : N ; N : /[0-9]+/ ;",
            &IndexMap::new(),
        )
        .unwrap();

    let oracle = |bytes: &[u8]| text(bytes).contains('+');
    let result = reduce(&bundle, "e", "1+2+3+4", ReduceConfig::default(), oracle);

    // One addition survives; the right operand collapses to the token
    // minimum.
    assert_eq!(result.output, "1+0");
    assert!(oracle(result.output.as_bytes()));
}

#[test]
fn html_reduces_to_one_tag_pair_with_hoisting() {
    let mut bundle = Bundle::new();
    bundle
        .add_grammar(
            indoc! {"
                grammar html;
                document : element ;
                element  : '<' NAME '>' content* '</' NAME '>' ;
                content  : element | NAME ;
                NAME : /[a-z]+/ ;
            "},
            &IndexMap::new(),
        )
        .unwrap();

    let oracle = |bytes: &[u8]| text(bytes).contains("<p>");
    let config = ReduceConfig {
        hoist: true,
        ..ReduceConfig::default()
    };
    let result = reduce(
        &bundle,
        "document",
        "<html><body><p>x</p><p>y</p></body></html>",
        config,
        oracle,
    );

    assert_eq!(result.output, "<p></p>");
    assert!(oracle(result.output.as_bytes()));
}

const NEST: &str = indoc! {"
    grammar nest;
    stmt  : block | ';' ;
    block : '{' stmt* '}' ;
    WS : /[ \\t]+/ -> hidden ;
"};

#[test]
fn pruning_alone_cannot_unwrap_the_outer_block() {
    let mut bundle = Bundle::new();
    bundle.add_grammar(NEST, &IndexMap::new()).unwrap();

    let oracle = |bytes: &[u8]| text(bytes).contains(';');
    let config = ReduceConfig {
        hoist: false,
        squeeze: false,
        ..ReduceConfig::default()
    };
    let result = reduce(&bundle, "stmt", "{ { { ; } } }", config, oracle);
    // The inner nesting collapses to the minimal statement, but the
    // mandatory braces of the outermost block are out of reach.
    assert_eq!(result.output, "{; }");
}

#[test]
fn hoisting_collapses_nesting_to_a_single_statement() {
    let mut bundle = Bundle::new();
    bundle.add_grammar(NEST, &IndexMap::new()).unwrap();

    let oracle = |bytes: &[u8]| text(bytes).contains(';');
    let config = ReduceConfig {
        hoist: true,
        squeeze: false,
        ..ReduceConfig::default()
    };
    let result = reduce(&bundle, "stmt", "{ { { ; } } }", config, oracle);

    assert_eq!(result.output, ";");
    assert_eq!(result.stats.hoisted_nodes, 3);
}

#[test]
fn second_run_commits_nothing_further() {
    let oracle = |bytes: &[u8]| text(bytes).contains("k=v");
    let first = reduce(
        &ini_bundle(),
        "document",
        "[s]\nk=v\n; bye\n",
        ReduceConfig::default(),
        oracle,
    );
    let second = reduce(
        &ini_bundle(),
        "document",
        &first.output,
        ReduceConfig::default(),
        oracle,
    );

    assert_eq!(second.output, first.output);
    assert_eq!(second.stats.initial_bytes, second.stats.final_bytes);
}

#[test]
fn recursive_variant_matches_bfs_on_ini() {
    let oracle = |bytes: &[u8]| text(bytes).contains("k=v");
    let config = ReduceConfig {
        variant: Variant::Recursive,
        ..ReduceConfig::default()
    };
    let result = reduce(
        &ini_bundle(),
        "document",
        "[s]\nk=v\n; bye\n",
        config,
        oracle,
    );
    assert_eq!(result.output, "k=v\n");
}

#[test]
fn coarse_variant_reaches_the_same_output() {
    let mut bundle = Bundle::new();
    bundle
        .add_grammar(
            "grammar expr; e : e '+' t | t ; t : N ; N : /[0-9]+/ ;",
            &IndexMap::new(),
        )
        .unwrap();
    let oracle = |bytes: &[u8]| text(bytes).contains('+');
    let config = ReduceConfig {
        coarse: true,
        ..ReduceConfig::default()
    };
    let result = reduce(&bundle, "e", "1+2+3+4", config, oracle);
    assert_eq!(result.output, "1+0");
}

#[test]
fn uninteresting_input_fails_fast() {
    let built = build_tree(&ini_bundle(), "document", "[s]\nk=v\n").unwrap();
    let session = ReduceSession::new(
        built.tree,
        FnOracle::new(|_: &[u8]| false),
        ReduceConfig::default(),
    );
    assert!(matches!(
        session.run(),
        Err(ReduceError::InitialNotInteresting)
    ));
}

#[test]
fn cancellation_returns_best_so_far() {
    let built = build_tree(&ini_bundle(), "document", "[s]\nk=v\n").unwrap();
    let flag = Arc::new(AtomicBool::new(true));
    let session = ReduceSession::new(
        built.tree,
        FnOracle::new(|bytes: &[u8]| text(bytes).contains("k=v")),
        ReduceConfig::default(),
    )
    .with_cancel(flag);

    match session.run() {
        Err(ReduceError::Cancelled { best }) => assert_eq!(best, "[s]\nk=v\n"),
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[test]
fn oracle_calls_are_cached_by_content() {
    let oracle = |bytes: &[u8]| text(bytes).contains("k=v");
    let result = reduce(
        &ini_bundle(),
        "document",
        "[s]\nk=v\n; bye\n; more\n; noise\n",
        ReduceConfig::default(),
        oracle,
    );
    assert_eq!(result.output, "k=v\n");
    assert!(result.stats.cache_hits > 0);
}
