//! Reduction session orchestration.
//!
//! A session owns the tree, the oracle, the verdict cache, and the run
//! statistics. `run` checks the baseline, applies the preparation
//! transformations, then repeats reduction passes until the output stops
//! shrinking (or once, when the fixed point is disabled).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};

use whittle_core::tree::{InvariantViolation, Tree, UnparseOptions, unparse_with, verify};

use crate::cache::{ContentCache, content_key};
use crate::hdd;
use crate::oracle::{Oracle, Verdict};
use crate::transform::{coarse_filter, flatten_recursion, hide_unremovable, squeeze};

/// Level enumeration strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Global breadth-first levels (classic hierarchical reduction).
    #[default]
    Bfs,
    /// Subtree-at-a-time traversal; each node's direct reducible
    /// descendants form one level.
    Recursive,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct ReduceConfig {
    pub variant: Variant,
    /// Pre-filter each pass to nodes whose removal can change the output.
    pub coarse: bool,
    /// Level-wise set minimization.
    pub prune: bool,
    /// Same-rule descendant substitution.
    pub hoist: bool,
    /// Per-node removal sweep after each pass (point minimality).
    pub sweep: bool,
    /// Iterate passes until the output stops shrinking.
    pub fixpoint: bool,
    pub flatten: bool,
    pub squeeze: bool,
    pub hide_unremovable: bool,
    /// Render every hidden-channel token in candidates and output.
    pub keep_hidden: bool,
    /// Offer hidden-channel tokens to the minimizer.
    pub reduce_hidden: bool,
    /// Verdict-cache capacity (entries); 0 disables caching.
    pub cache_capacity: usize,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Bfs,
            coarse: false,
            prune: true,
            hoist: false,
            sweep: true,
            fixpoint: true,
            flatten: true,
            squeeze: true,
            hide_unremovable: true,
            keep_hidden: false,
            reduce_hidden: false,
            cache_capacity: 4096,
        }
    }
}

/// Counters for one reduction run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Stats {
    pub oracle_runs: u64,
    pub cache_hits: u64,
    pub passes: u32,
    pub levels: u32,
    pub pruned_nodes: u64,
    pub hoisted_nodes: u64,
    pub swept_nodes: u64,
    pub initial_bytes: usize,
    pub final_bytes: usize,
}

/// A finished reduction.
#[derive(Debug)]
pub struct Reduction {
    pub output: String,
    pub stats: Stats,
}

/// Fatal session errors. Variants reached after reduction started carry
/// the best (last committed, oracle-approved) output.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("initial input does not satisfy the oracle")]
    InitialNotInteresting,

    #[error("reduction cancelled")]
    Cancelled { best: String },

    #[error("tree invariant violated after {pass}: {source}")]
    Invariant {
        pass: &'static str,
        #[source]
        source: InvariantViolation,
        best: String,
    },
}

/// One reduction run over a built tree.
pub struct ReduceSession<O> {
    pub(crate) tree: Tree,
    pub(crate) oracle: O,
    pub(crate) config: ReduceConfig,
    pub(crate) cache: ContentCache,
    pub(crate) stats: Stats,
    cancel: Option<Arc<AtomicBool>>,
    next_test_id: u64,
}

impl<O: Oracle> ReduceSession<O> {
    pub fn new(tree: Tree, oracle: O, config: ReduceConfig) -> Self {
        let cache = ContentCache::new(config.cache_capacity);
        Self {
            tree,
            oracle,
            config,
            cache,
            stats: Stats::default(),
            cancel: None,
            next_test_id: 0,
        }
    }

    /// Cooperative cancellation: set the flag from another thread and the
    /// session aborts at the next submission boundary, returning the best
    /// output so far inside [`ReduceError::Cancelled`].
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(mut self) -> Result<Reduction, ReduceError> {
        let baseline = self.render();
        self.stats.initial_bytes = baseline.len();
        if !self.probe_text(&baseline) {
            return Err(ReduceError::InitialNotInteresting);
        }

        if self.config.flatten {
            self.transform("flatten", flatten_recursion)?;
        }
        if self.config.squeeze {
            self.transform("squeeze", squeeze)?;
        }
        if self.config.hide_unremovable {
            self.transform("hide-unremovable", hide_unremovable)?;
        }

        let mut previous = self.render();
        loop {
            self.check_cancelled()?;
            if self.config.coarse {
                self.transform("coarse-filter", coarse_filter)?;
            }

            hdd::run_pass(&mut self)?;
            self.stats.passes += 1;
            if self.config.sweep {
                hdd::sweep(&mut self)?;
            }

            let current = self.render();
            debug!(
                pass = self.stats.passes,
                bytes = current.len(),
                "pass complete"
            );
            if !self.config.fixpoint || current == previous {
                break;
            }
            previous = current;
        }

        let output = self.render();
        self.stats.final_bytes = output.len();
        info!(
            initial = self.stats.initial_bytes,
            reduced = self.stats.final_bytes,
            oracle_runs = self.stats.oracle_runs,
            cache_hits = self.stats.cache_hits,
            cache_entries = self.cache.len(),
            passes = self.stats.passes,
            "reduction finished"
        );
        Ok(Reduction {
            output,
            stats: self.stats,
        })
    }

    /// Render the tree under the session's unparse options.
    pub(crate) fn render(&self) -> String {
        unparse_with(
            &self.tree,
            UnparseOptions {
                keep_hidden: self.config.keep_hidden,
            },
        )
    }

    /// Render and judge the current tree state.
    pub(crate) fn probe(&mut self) -> bool {
        let text = self.render();
        self.probe_text(&text)
    }

    /// Judge a candidate, going through the content cache. Unresolved
    /// verdicts count as not interesting.
    pub(crate) fn probe_text(&mut self, text: &str) -> bool {
        let key = content_key(text.as_bytes());
        if let Some(verdict) = self.cache.get(key) {
            self.stats.cache_hits += 1;
            return verdict == Verdict::Interesting;
        }
        let id = format!("t{}", self.next_test_id);
        self.next_test_id += 1;
        self.stats.oracle_runs += 1;
        let verdict = match self.oracle.test(text.as_bytes(), &id) {
            Verdict::Unresolved => {
                warn!(id = %id, "oracle unresolved; treating as not interesting");
                Verdict::NotInteresting
            }
            verdict => verdict,
        };
        self.cache.insert(key, verdict);
        verdict == Verdict::Interesting
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), ReduceError> {
        if self.cancelled() {
            Err(ReduceError::Cancelled { best: self.render() })
        } else {
            Ok(())
        }
    }

    fn transform(
        &mut self,
        pass: &'static str,
        f: impl FnOnce(&mut Tree),
    ) -> Result<(), ReduceError> {
        f(&mut self.tree);
        verify(&self.tree).map_err(|source| ReduceError::Invariant {
            pass,
            source,
            best: self.render(),
        })
    }
}
