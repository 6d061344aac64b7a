use crate::manager::DdManager;
use crate::reorder_window::sjt_positions;

impl DdManager {
    /// Exact minimization: walks every permutation of the variable order by
    /// adjacent transpositions and parks at the global minimum. Factorial
    /// in the number of variables; meant for small managers.
    pub(crate) fn exact_reorder(&mut self) -> Option<()> {
        let n = self.read_size();
        if n < 2 {
            return Some(());
        }
        let seq = sjt_positions(n);
        let mut best_size = self.live_keys();
        let mut best_idx = 0usize;
        let mut performed = Vec::with_capacity(seq.len());
        for (step, &pos) in seq.iter().enumerate() {
            let size = self.swap_levels(pos)?;
            performed.push(pos);
            if size < best_size {
                best_size = size;
                best_idx = step + 1;
            }
        }
        while performed.len() > best_idx {
            let l = performed.pop().expect("tail underflow");
            self.swap_levels(l)?;
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use crate::manager::DdManager;
    use crate::reorder::ReorderMethod;

    #[test]
    fn exact_finds_the_optimum_for_a_comb() {
        let mut dd = DdManager::init(6, 0, 64, 256, 0);
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
        assert!(dd.reduce_heap(ReorderMethod::Exact, 0));
        // The disjoint-support comb has a known optimum: paired variables
        // adjacent, 2 nodes per pair plus the terminal.
        assert_eq!(dd.dag_size(f), 7);
        assert_eq!(dd.count_minterm(f, 6), minterms);
        // Nothing sifting could still improve.
        assert!(dd.reduce_heap(ReorderMethod::Sift, 0));
        assert_eq!(dd.dag_size(f), 7);
        dd.recursive_deref(f);
    }
}
