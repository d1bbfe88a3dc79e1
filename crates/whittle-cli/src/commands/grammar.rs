use std::path::PathBuf;

use clap::ArgMatches;

use whittle_reduce::Bundle;

use super::fail;

pub struct GrammarArgs {
    pub bundle: PathBuf,
}

impl GrammarArgs {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            bundle: m.get_one::<PathBuf>("bundle").expect("required").clone(),
        }
    }
}

/// Load, validate, and show what each rule and token reduces to.
pub fn run(args: GrammarArgs) {
    let bundle = match Bundle::from_descriptor_file(&args.bundle) {
        Ok(bundle) => bundle,
        Err(e) => fail(e),
    };

    for (name, set) in bundle.grammars() {
        println!("grammar {name} (start: {})", set.grammar.start());
        for (rule, replacement) in set.replacements.rules() {
            println!("  rule  {rule:<24} -> {replacement:?}");
        }
        for (token, replacement) in set.replacements.tokens() {
            println!("  token {token:<24} -> {replacement:?}");
        }
        for (token, islands) in &set.islands {
            for island in islands {
                println!(
                    "  island {token}: /{}/ -> {}:{}",
                    island.pattern.as_str(),
                    island.grammar,
                    island.rule
                );
            }
        }
        println!();
    }
}
