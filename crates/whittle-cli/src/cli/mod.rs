//! Command builders for the CLI.
//!
//! Each command is assembled from the shared arg builders in `args.rs`.

mod args;

use clap::Command;

use args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("whittle")
        .about("Grammar-aware hierarchical test-case reducer")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(reduce_command())
        .subcommand(parse_command())
        .subcommand(grammar_command())
}

/// Reduce an input while a test command keeps accepting it.
fn reduce_command() -> Command {
    Command::new("reduce")
        .about("Reduce an input while the test command keeps accepting it")
        .override_usage(
            "\
  whittle reduce <INPUT> -g <BUNDLE> --test <CMD>
  whittle reduce <INPUT> -g <BUNDLE> -s <RULE> --test <CMD> -o <PATH>",
        )
        .after_help(
            r#"EXAMPLES:
  whittle reduce crash.c -g c.json --test ./crashes.sh
  whittle reduce cfg.ini -g ini.json -s ini:document --test ./keeps-key.sh
  whittle reduce big.html -g html.json --test ./renders.sh --hoist --coarse"#,
        )
        .arg(input_arg())
        .arg(grammar_arg())
        .arg(start_arg())
        .arg(test_arg())
        .arg(timeout_arg())
        .arg(output_arg())
        .arg(variant_arg())
        .arg(coarse_arg())
        .arg(hoist_arg())
        .arg(no_prune_arg())
        .arg(once_arg())
        .arg(no_sweep_arg())
        .arg(no_flatten_arg())
        .arg(no_squeeze_arg())
        .arg(no_hide_unremovable_arg())
        .arg(keep_hidden_arg())
        .arg(reduce_hidden_arg())
        .arg(cache_size_arg())
        .arg(stats_arg())
        .arg(verbose_arg())
}

/// Dump the tree built for an input.
fn parse_command() -> Command {
    Command::new("parse")
        .about("Parse an input and dump the built tree")
        .override_usage(
            "\
  whittle parse <INPUT> -g <BUNDLE>
  whittle parse <INPUT> -g <BUNDLE> -s <RULE> --transformed --spans",
        )
        .arg(input_arg())
        .arg(grammar_arg())
        .arg(start_arg())
        .arg(spans_arg())
        .arg(transformed_arg())
        .arg(verbose_arg())
}

/// Validate a bundle and show computed replacements.
fn grammar_command() -> Command {
    Command::new("grammar")
        .about("Validate a grammar bundle and show minimal replacements")
        .override_usage("  whittle grammar <BUNDLE>")
        .arg(
            clap::Arg::new("bundle")
                .value_name("BUNDLE")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .required(true)
                .help("Grammar bundle descriptor (JSON)"),
        )
        .arg(verbose_arg())
}
