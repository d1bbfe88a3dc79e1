use std::fs;
use std::path::PathBuf;

use clap::ArgMatches;

use whittle_core::tree::{NodeId, NodeKind, NodeState, Tree};
use whittle_reduce::transform::{flatten_recursion, hide_unremovable, squeeze};
use whittle_reduce::{Bundle, build_tree};

use super::fail;

pub struct ParseArgs {
    pub input: PathBuf,
    pub grammar: PathBuf,
    pub start: Option<String>,
    pub spans: bool,
    pub transformed: bool,
}

impl ParseArgs {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: m.get_one::<PathBuf>("input").expect("required").clone(),
            grammar: m.get_one::<PathBuf>("grammar").expect("required").clone(),
            start: m.get_one::<String>("start").cloned(),
            spans: m.get_flag("spans"),
            transformed: m.get_flag("transformed"),
        }
    }
}

pub fn run(args: ParseArgs) {
    let input = match fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(e) => fail(format_args!("cannot read {}: {e}", args.input.display())),
    };
    let bundle = match Bundle::from_descriptor_file(&args.grammar) {
        Ok(bundle) => bundle,
        Err(e) => fail(e),
    };
    let start = match &args.start {
        Some(start) => start.clone(),
        None => {
            let Some((name, set)) = bundle.grammars().next() else {
                fail("bundle contains no grammars");
            };
            format!("{name}:{}", set.grammar.start())
        }
    };

    let mut built = match build_tree(&bundle, &start, &input) {
        Ok(built) => built,
        Err(e) => fail(e),
    };
    for issue in &built.issues {
        eprintln!("warning: {issue}");
    }

    if args.transformed {
        flatten_recursion(&mut built.tree);
        squeeze(&mut built.tree);
        hide_unremovable(&mut built.tree);
    }

    let mut out = String::new();
    dump(&built.tree, built.tree.root(), 0, args.spans, &mut out);
    print!("{out}");
}

fn dump(tree: &Tree, id: NodeId, indent: usize, spans: bool, out: &mut String) {
    let node = tree.node(id);
    out.push_str(&"  ".repeat(indent));
    let label = match &node.kind {
        NodeKind::Rule { name } => name.clone(),
        NodeKind::Quantifier => "(group)".to_owned(),
        NodeKind::Token { name, text } => format!("{name} {text:?}"),
        NodeKind::Hidden { name, text } => format!("{name} {text:?} (hidden channel)"),
        NodeKind::Error { text } => format!("(error) {text:?}"),
    };
    out.push_str(&label);
    if node.state == NodeState::Hidden {
        out.push_str(" [hidden]");
    }
    if spans {
        out.push_str(&format!(
            " @{}:{}-{}:{}",
            node.start.line, node.start.column, node.end.line, node.end.column
        ));
    }
    out.push('\n');
    for &child in &node.children {
        dump(tree, child, indent + 1, spans, out);
    }
}
