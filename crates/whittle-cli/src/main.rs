mod cli;
mod commands;

use commands::{grammar::GrammarArgs, parse::ParseArgs, reduce::ReduceArgs};

fn main() {
    let matches = cli::build_cli().get_matches();

    match matches.subcommand() {
        Some(("reduce", m)) => {
            commands::init_tracing(m.get_count("verbose"));
            commands::reduce::run(ReduceArgs::from_matches(m));
        }
        Some(("parse", m)) => {
            commands::init_tracing(m.get_count("verbose"));
            commands::parse::run(ParseArgs::from_matches(m));
        }
        Some(("grammar", m)) => {
            commands::init_tracing(m.get_count("verbose"));
            commands::grammar::run(GrammarArgs::from_matches(m));
        }
        _ => unreachable!("clap should have caught this"),
    }
}
