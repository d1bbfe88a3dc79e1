//! Minimizing delta debugging.
//!
//! [`ddmin`] reduces a configuration (an ordered slice of items) to a
//! 1-minimal subset for which a caller-supplied test still holds: removing
//! any single remaining item makes the test fail. The search partitions
//! the configuration into n subsets, tries each subset and each
//! complement, and doubles the granularity when neither helps.
//!
//! The algorithm is deterministic for a pure test function, and the final
//! kept set does not depend on the order in which candidates were probed.

use tracing::debug;

/// Reduce `items` to a 1-minimal subset satisfying `test`.
///
/// `test` receives a candidate kept-subset (in the original item order)
/// and reports whether the configuration still exhibits the property of
/// interest. The caller guarantees `test(items)` holds; `ddmin` never
/// probes the full configuration itself.
pub fn ddmin<T, F>(items: &[T], mut test: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&[T]) -> bool,
{
    let mut current: Vec<T> = items.to_vec();
    if current.is_empty() {
        return current;
    }
    // A singleton only shrinks to the empty configuration.
    if current.len() == 1 {
        if test(&[]) {
            current.clear();
        }
        return current;
    }

    let mut n = 2usize;
    'outer: loop {
        let subsets = partition(&current, n);

        // Reduce to subset: some subset alone may suffice.
        for subset in &subsets {
            if test(subset) {
                debug!(kept = subset.len(), from = current.len(), "reduced to subset");
                current = subset.clone();
                if current.len() == 1 {
                    if test(&[]) {
                        current.clear();
                    }
                    return current;
                }
                n = 2;
                continue 'outer;
            }
        }

        // Reduce to complement: removing one subset may suffice.
        for i in 0..subsets.len() {
            let complement = complement_of(&subsets, i);
            if test(&complement) {
                debug!(
                    kept = complement.len(),
                    from = current.len(),
                    "reduced to complement"
                );
                current = complement;
                n = (n - 1).max(2);
                continue 'outer;
            }
        }

        // Increase granularity, or stop at unit granularity.
        if n < current.len() {
            n = (n * 2).min(current.len());
        } else {
            break;
        }
    }
    current
}

/// Split `items` into `n` contiguous subsets of near-equal length.
fn partition<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    let len = items.len();
    let n = n.min(len);
    let base = len / n;
    let extra = len % n;
    let mut out = Vec::with_capacity(n);
    let mut offset = 0;
    for i in 0..n {
        let size = base + usize::from(i < extra);
        out.push(items[offset..offset + size].to_vec());
        offset += size;
    }
    out
}

fn complement_of<T: Clone>(subsets: &[Vec<T>], skip: usize) -> Vec<T> {
    subsets
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .flat_map(|(_, s)| s.iter().cloned())
        .collect()
}
