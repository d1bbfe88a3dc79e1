//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` composed into commands by
//! `cli::build_cli`, so flags stay consistent across subcommands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Input file to reduce or parse (positional).
pub fn input_arg() -> Arg {
    Arg::new("input")
        .value_name("INPUT")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Input file")
}

/// Grammar bundle descriptor (-g/--grammar).
pub fn grammar_arg() -> Arg {
    Arg::new("grammar")
        .short('g')
        .long("grammar")
        .value_name("BUNDLE")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Grammar bundle descriptor (JSON)")
}

/// Start rule (-s/--start), `rule` or `grammar:rule`.
pub fn start_arg() -> Arg {
    Arg::new("start")
        .short('s')
        .long("start")
        .value_name("RULE")
        .help("Start rule, `rule` or `grammar:rule` (default: first rule of the first grammar)")
}

/// Interestingness test command (--test).
pub fn test_arg() -> Arg {
    Arg::new("test")
        .long("test")
        .value_name("CMD")
        .num_args(1..)
        .required(true)
        .help("Test command; run with the candidate path appended, exit 0 means interesting")
}

/// Per-test timeout in seconds (--timeout).
pub fn timeout_arg() -> Arg {
    Arg::new("timeout")
        .long("timeout")
        .value_name("SECS")
        .value_parser(value_parser!(u64))
        .help("Kill a test after SECS seconds and treat it as unresolved")
}

/// Output path (-o/--output).
pub fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("Where to write the reduced input (default: INPUT.reduced)")
}

/// Level enumeration strategy (--variant).
pub fn variant_arg() -> Arg {
    Arg::new("variant")
        .long("variant")
        .value_name("VARIANT")
        .default_value("bfs")
        .value_parser(["bfs", "recursive"])
        .help("Level enumeration: global breadth-first or subtree-recursive")
}

/// Coarse pre-filter (--coarse).
pub fn coarse_arg() -> Arg {
    Arg::new("coarse")
        .long("coarse")
        .action(ArgAction::SetTrue)
        .help("Skip nodes whose removal cannot shrink the output")
}

/// Enable hoisting (--hoist).
pub fn hoist_arg() -> Arg {
    Arg::new("hoist")
        .long("hoist")
        .action(ArgAction::SetTrue)
        .help("Try substituting rule nodes with same-rule descendants")
}

/// Disable pruning (--no-prune).
pub fn no_prune_arg() -> Arg {
    Arg::new("no_prune")
        .long("no-prune")
        .action(ArgAction::SetTrue)
        .help("Disable level-wise set minimization")
}

/// One pass instead of a fixed point (--once).
pub fn once_arg() -> Arg {
    Arg::new("once")
        .long("once")
        .action(ArgAction::SetTrue)
        .help("Stop after one pass instead of iterating to a fixed point")
}

/// Disable the per-node sweep (--no-sweep).
pub fn no_sweep_arg() -> Arg {
    Arg::new("no_sweep")
        .long("no-sweep")
        .action(ArgAction::SetTrue)
        .help("Skip the per-node removal sweep after each pass")
}

/// Disable recursion flattening (--no-flatten).
pub fn no_flatten_arg() -> Arg {
    Arg::new("no_flatten")
        .long("no-flatten")
        .action(ArgAction::SetTrue)
        .help("Keep recursive spines as built")
}

/// Disable unary-chain squeezing (--no-squeeze).
pub fn no_squeeze_arg() -> Arg {
    Arg::new("no_squeeze")
        .long("no-squeeze")
        .action(ArgAction::SetTrue)
        .help("Keep unary rule chains as built")
}

/// Disable the unremovable filter (--no-hide-unremovable).
pub fn no_hide_unremovable_arg() -> Arg {
    Arg::new("no_hide_unremovable")
        .long("no-hide-unremovable")
        .action(ArgAction::SetTrue)
        .help("Offer unremovable nodes to the minimizer anyway")
}

/// Preserve every hidden-channel token (--keep-hidden).
pub fn keep_hidden_arg() -> Arg {
    Arg::new("keep_hidden")
        .long("keep-hidden")
        .action(ArgAction::SetTrue)
        .help("Render every hidden-channel token (whitespace, comments)")
}

/// Offer hidden-channel tokens to the minimizer (--reduce-hidden).
pub fn reduce_hidden_arg() -> Arg {
    Arg::new("reduce_hidden")
        .long("reduce-hidden")
        .action(ArgAction::SetTrue)
        .help("Let the minimizer remove hidden-channel tokens")
}

/// Verdict cache capacity (--cache-size).
pub fn cache_size_arg() -> Arg {
    Arg::new("cache_size")
        .long("cache-size")
        .value_name("N")
        .default_value("4096")
        .value_parser(value_parser!(usize))
        .help("Verdict cache capacity in entries (0 disables caching)")
}

/// Statistics output path (--stats).
pub fn stats_arg() -> Arg {
    Arg::new("stats")
        .long("stats")
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("Write run statistics as JSON")
}

/// Show source positions (--spans).
pub fn spans_arg() -> Arg {
    Arg::new("spans")
        .long("spans")
        .action(ArgAction::SetTrue)
        .help("Show source positions")
}

/// Dump the tree after the preparation passes (--transformed).
pub fn transformed_arg() -> Arg {
    Arg::new("transformed")
        .long("transformed")
        .action(ArgAction::SetTrue)
        .help("Apply the preparation passes before dumping")
}

/// Verbosity (-v/--verbose, repeatable).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .help("Increase log verbosity (repeat for more)")
}
