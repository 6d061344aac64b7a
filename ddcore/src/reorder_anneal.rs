use common::prelude::*;

use crate::manager::DdManager;

/// Geometric cooling factor.
const COOLING: f64 = 0.6;
/// Temperature at which the walk stops.
const STOP_TEMP: f64 = 1.0;
/// Random moves attempted per variable per temperature step.
const MOVES_PER_VAR: usize = 4;

impl DdManager {
    /// Simulated annealing over the variable order: random adjacent swaps,
    /// uphill moves accepted with probability `exp(-delta / T)`. The best
    /// order seen is restored at the end.
    pub(crate) fn anneal(&mut self) -> Option<()> {
        let n = self.read_size();
        if n < 2 {
            return Some(());
        }
        let mut best_order: Vec<VarIndex> = self.invperm.clone();
        let mut best_size = self.live_keys();
        let mut temp = best_size as f64 * 0.1 + 2.0;

        while temp > STOP_TEMP {
            for _ in 0..MOVES_PER_VAR * n {
                let l = self.random_below(n - 1);
                let before = self.live_keys();
                let after = self.swap_levels(l)?;
                if after > before {
                    let delta = (after - before) as f64;
                    let r = self.random() as f64 / 2147483646.0;
                    if r >= (-delta / temp).exp() {
                        self.swap_levels(l)?;
                        continue;
                    }
                }
                if self.live_keys() < best_size {
                    best_size = self.live_keys();
                    best_order = self.invperm.clone();
                }
            }
            temp *= COOLING;
        }
        self.shuffle_inner(&best_order)?;
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use crate::manager::DdManager;
    use crate::reorder::ReorderMethod;

    #[test]
    fn annealing_preserves_semantics_and_never_grows_past_best() {
        let mut dd = DdManager::init(6, 0, 64, 256, 0);
        dd.srandom(12345);
        let mut f = dd.logic_zero();
        dd.ref_edge(f);
        for (a, b) in [(0, 3), (1, 4), (2, 5)] {
            let va = dd.ith_var(a).unwrap();
            let vb = dd.ith_var(b).unwrap();
            let t = dd.and(va, vb).unwrap();
            dd.ref_edge(t);
            let nf = dd.or(f, t).unwrap();
            dd.ref_edge(nf);
            dd.recursive_deref(t);
            dd.recursive_deref(f);
            f = nf;
        }
        let minterms = dd.count_minterm(f, 6);
        let before = dd.dag_size(f);
        assert!(dd.reduce_heap(ReorderMethod::Annealing, 0));
        assert!(dd.dag_size(f) <= before);
        assert_eq!(dd.count_minterm(f, 6), minterms);
        dd.recursive_deref(f);
    }
}
