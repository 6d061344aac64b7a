use common::prelude::*;

use crate::manager::DdManager;

/// The sequence of adjacent transposition positions that walks through
/// every permutation of `k` elements exactly once (Steinhaus-Johnson-
/// Trotter): `k! - 1` entries, each naming the left position of a swap.
pub(crate) fn sjt_positions(k: usize) -> Vec<usize> {
    let mut a: Vec<usize> = (1..=k).collect();
    let mut dir: Vec<isize> = vec![-1; k];
    let mut out = Vec::new();
    loop {
        let mut mobile: Option<usize> = None;
        for p in 0..k {
            let q = p as isize + dir[p];
            if q < 0 || q >= k as isize {
                continue;
            }
            if a[q as usize] < a[p] && mobile.map_or(true, |m| a[p] > a[m]) {
                mobile = Some(p);
            }
        }
        let p = match mobile {
            Some(p) => p,
            None => break,
        };
        let q = (p as isize + dir[p]) as usize;
        out.push(p.min(q));
        a.swap(p, q);
        dir.swap(p, q);
        let moved = a[q];
        for r in 0..k {
            if a[r] > moved {
                dir[r] = -dir[r];
            }
        }
    }
    out
}

impl DdManager {
    /// Tries every permutation of the `k` levels starting at `base` and
    /// keeps the best. Reports whether the window improved.
    fn window_at(&mut self, base: Level, k: usize) -> Option<bool> {
        let seq = sjt_positions(k);
        let mut best_size = self.live_keys();
        let mut best_idx = 0usize;
        let mut performed: Vec<Level> = Vec::with_capacity(seq.len());
        for (step, &pos) in seq.iter().enumerate() {
            let size = self.swap_levels(base + pos)?;
            performed.push(base + pos);
            if size < best_size {
                best_size = size;
                best_idx = step + 1;
            }
        }
        // Swaps are involutions: walking the tail backwards restores the
        // best configuration seen.
        while performed.len() > best_idx {
            let l = performed.pop().expect("tail underflow");
            self.swap_levels(l)?;
        }
        Some(best_idx != 0)
    }

    /// Window permutation: exhaustively permutes every contiguous window of
    /// `k` levels, sliding it across the whole order.
    pub(crate) fn window_permute(&mut self, k: usize, converge: bool) -> Option<()> {
        let n = self.read_size();
        if n < 2 {
            return Some(());
        }
        let k = k.min(n);
        loop {
            let before = self.live_keys();
            let mut improved = false;
            for base in 0..=(n - k) {
                if self.window_at(base, k)? {
                    improved = true;
                }
            }
            if !converge || !improved || self.live_keys() >= before {
                break;
            }
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::ReorderMethod;

    #[test]
    fn sjt_counts() {
        assert_eq!(sjt_positions(2).len(), 1);
        assert_eq!(sjt_positions(3).len(), 5);
        assert_eq!(sjt_positions(4).len(), 23);
    }

    #[test]
    fn sjt_visits_all_permutations() {
        let k = 4;
        let mut a: Vec<usize> = (0..k).collect();
        let mut seen = std::collections::HashSet::new();
        seen.insert(a.clone());
        for pos in sjt_positions(k) {
            a.swap(pos, pos + 1);
            seen.insert(a.clone());
        }
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn window_reorder_shrinks_or_holds() {
        for method in [
            ReorderMethod::Window2,
            ReorderMethod::Window3,
            ReorderMethod::Window4,
            ReorderMethod::Window3Conv,
        ] {
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
            let before = dd.dag_size(f);
            assert!(dd.reduce_heap(method, 0));
            assert!(dd.dag_size(f) <= before);
            assert_eq!(dd.count_minterm(f, 6), minterms);
            dd.recursive_deref(f);
        }
    }
}
