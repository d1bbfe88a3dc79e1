use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::ArgMatches;

use whittle_reduce::{
    Bundle, ReduceConfig, ReduceError, SubprocessOracle, Variant, build_tree,
};

use super::fail;

pub struct ReduceArgs {
    pub input: PathBuf,
    pub grammar: PathBuf,
    pub start: Option<String>,
    pub test: Vec<String>,
    pub timeout: Option<u64>,
    pub output: Option<PathBuf>,
    pub config: ReduceConfig,
    pub stats: Option<PathBuf>,
}

impl ReduceArgs {
    pub fn from_matches(m: &ArgMatches) -> Self {
        let config = ReduceConfig {
            variant: match m.get_one::<String>("variant").map(String::as_str) {
                Some("recursive") => Variant::Recursive,
                _ => Variant::Bfs,
            },
            coarse: m.get_flag("coarse"),
            prune: !m.get_flag("no_prune"),
            hoist: m.get_flag("hoist"),
            sweep: !m.get_flag("no_sweep"),
            fixpoint: !m.get_flag("once"),
            flatten: !m.get_flag("no_flatten"),
            squeeze: !m.get_flag("no_squeeze"),
            hide_unremovable: !m.get_flag("no_hide_unremovable"),
            keep_hidden: m.get_flag("keep_hidden"),
            reduce_hidden: m.get_flag("reduce_hidden"),
            cache_capacity: *m.get_one::<usize>("cache_size").expect("has default"),
        };
        Self {
            input: m.get_one::<PathBuf>("input").expect("required").clone(),
            grammar: m.get_one::<PathBuf>("grammar").expect("required").clone(),
            start: m.get_one::<String>("start").cloned(),
            test: m
                .get_many::<String>("test")
                .expect("required")
                .cloned()
                .collect(),
            timeout: m.get_one::<u64>("timeout").copied(),
            output: m.get_one::<PathBuf>("output").cloned(),
            config,
            stats: m.get_one::<PathBuf>("stats").cloned(),
        }
    }
}

pub fn run(args: ReduceArgs) {
    let input = match fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(e) => fail(format_args!("cannot read {}: {e}", args.input.display())),
    };
    let bundle = match Bundle::from_descriptor_file(&args.grammar) {
        Ok(bundle) => bundle,
        Err(e) => fail(e),
    };
    let start = resolve_start(&bundle, args.start.as_deref());

    let built = match build_tree(&bundle, &start, &input) {
        Ok(built) => built,
        Err(e) => fail(e),
    };
    for issue in &built.issues {
        eprintln!("warning: {issue}");
    }

    let mut oracle = SubprocessOracle::new(args.test.clone());
    if let Some(name) = args.input.file_name().and_then(|n| n.to_str()) {
        oracle = oracle.file_name(name);
    }
    if let Some(secs) = args.timeout {
        oracle = oracle.timeout(Duration::from_secs(secs));
    }

    let session = whittle_reduce::ReduceSession::new(built.tree, oracle, args.config);
    let (output, stats, status) = match session.run() {
        Ok(reduction) => (reduction.output, Some(reduction.stats), 0),
        Err(ReduceError::Cancelled { best }) => {
            eprintln!("warning: cancelled; writing best output so far");
            (best, None, 1)
        }
        Err(ReduceError::Invariant { best, .. }) => {
            eprintln!("error: internal invariant failure; writing best output so far");
            (best, None, 1)
        }
        Err(e) => fail(e),
    };

    let out_path = args.output.unwrap_or_else(|| {
        let mut path = args.input.clone().into_os_string();
        path.push(".reduced");
        PathBuf::from(path)
    });
    if let Err(e) = fs::write(&out_path, &output) {
        fail(format_args!("cannot write {}: {e}", out_path.display()));
    }
    eprintln!(
        "reduced {} -> {} bytes, written to {}",
        input.len(),
        output.len(),
        out_path.display()
    );

    if let (Some(stats), Some(path)) = (&stats, &args.stats) {
        match serde_json::to_string_pretty(stats) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    fail(format_args!("cannot write {}: {e}", path.display()));
                }
            }
            Err(e) => fail(e),
        }
    }
    std::process::exit(status);
}

/// Default start rule: the first rule of the only grammar.
fn resolve_start(bundle: &Bundle, requested: Option<&str>) -> String {
    if let Some(start) = requested {
        return start.to_owned();
    }
    let mut grammars = bundle.grammars();
    let Some((name, set)) = grammars.next() else {
        fail("bundle contains no grammars");
    };
    format!("{name}:{}", set.grammar.start())
}
