use common::prelude::*;

use crate::edge::Edge;
use crate::hooks::HookType;
use crate::manager::{DdManager, ErrorCode};
use crate::node::{Node, NonTerminalBdd};

/// Floor for the automatic-reordering trigger after a pass.
const MIN_NEXT_DYN: usize = 4004;

/// The variable reordering heuristics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReorderMethod {
    /// Repeat whatever method ran last (the autodyn method).
    Same,
    None,
    Random,
    RandomPivot,
    Sift,
    SiftConverge,
    SymmSift,
    SymmSiftConv,
    Window2,
    Window3,
    Window4,
    Window2Conv,
    Window3Conv,
    Window4Conv,
    GroupSift,
    GroupSiftConv,
    Annealing,
    Genetic,
    Linear,
    LinearConverge,
    LazySift,
    Exact,
}

impl ReorderMethod {
    fn label(self) -> &'static str {
        match self {
            ReorderMethod::Same => "same",
            ReorderMethod::None => "none",
            ReorderMethod::Random => "random",
            ReorderMethod::RandomPivot => "random pivot",
            ReorderMethod::Sift => "sift",
            ReorderMethod::SiftConverge => "sift converge",
            ReorderMethod::SymmSift => "symmetric sift",
            ReorderMethod::SymmSiftConv => "symmetric sift converge",
            ReorderMethod::Window2 => "window 2",
            ReorderMethod::Window3 => "window 3",
            ReorderMethod::Window4 => "window 4",
            ReorderMethod::Window2Conv => "window 2 converge",
            ReorderMethod::Window3Conv => "window 3 converge",
            ReorderMethod::Window4Conv => "window 4 converge",
            ReorderMethod::GroupSift => "group sift",
            ReorderMethod::GroupSiftConv => "group sift converge",
            ReorderMethod::Annealing => "annealing",
            ReorderMethod::Genetic => "genetic",
            ReorderMethod::Linear => "linear",
            ReorderMethod::LinearConverge => "linear converge",
            ReorderMethod::LazySift => "lazy sift",
            ReorderMethod::Exact => "exact",
        }
    }
}

impl DdManager {
    /// Current live internal node count, the size every heuristic minimizes.
    #[inline]
    pub(crate) fn live_keys(&self) -> usize {
        self.keys - self.dead
    }

    /// Like the unique-table lookup, but for use inside a swap: the found or
    /// created node immediately carries the claim of its future parent, and
    /// neither garbage collection heuristics nor nested reordering fire.
    fn swap_unique(
        &mut self,
        level: Level,
        index: VarIndex,
        low: Edge,
        high: Edge,
    ) -> Option<Edge> {
        if low == high {
            self.nodes[low.node()].incref();
            return Some(low);
        }
        let complement = high.is_complement();
        let (low, high) = if complement {
            (low.not(), high.not())
        } else {
            (low, high)
        };
        if let Some(id) = self.subtables[level].find(&self.nodes, low, high) {
            debug_assert!(
                self.nodes[id].is_constant() || self.nt(id).ref_count() > 0,
                "swap found an unreferenced node"
            );
            self.nodes[id].incref();
            return Some(Edge::new(id, complement));
        }
        let id = self.alloc_node()?;
        self.nodes[id] = Node::NonTerminal(NonTerminalBdd::new(id, index, low, high));
        self.nodes[id].incref();
        self.nodes[low.node()].incref();
        self.nodes[high.node()].incref();
        self.subtables[level].insert(&mut self.nodes, id);
        self.keys += 1;
        Some(Edge::new(id, complement))
    }

    /// Swaps the variables at levels `i` and `i + 1` by rewriting the upper
    /// level's nodes in place. Node identity, and thereby every pointer a
    /// client holds, survives. Returns the live size after the swap.
    ///
    /// Canonicity is transiently violated while the upper subtable is being
    /// rebuilt; it holds again on return.
    pub(crate) fn swap_levels(&mut self, i: Level) -> Option<usize> {
        debug_assert!(i + 1 < self.subtables.len());
        let x = self.invperm[i];
        let y = self.invperm[i + 1];

        // Worst case every upper node spawns two children; refuse cleanly up
        // front rather than fail halfway through the rebuild.
        let worst = 2 * self.subtables[i].keys;
        if self.free_count < worst {
            let needed = worst - self.free_count;
            let extra = (needed + 1) * std::mem::size_of::<Node>();
            if self.read_memory_in_use() + extra > self.max_memory {
                self.record_error(ErrorCode::MaxMemExceeded);
                return None;
            }
            // With capacity reserved here, allocation cannot fail midway
            // through the rebuild.
            self.nodes.reserve_exact(needed);
        }

        // The lower level's nodes keep their children, hence their hashes:
        // moving the whole subtable moves every one of them at once.
        self.perm[x] = i + 1;
        self.perm[y] = i;
        self.invperm.swap(i, i + 1);
        self.subtables.swap(i, i + 1);

        let xnodes = self.subtables[i + 1].node_ids(&self.nodes);

        // Dead upper nodes are unreachable and the cache is clean during a
        // pass, so they can be freed on the spot.
        for &id in &xnodes {
            if self.nt(id).ref_count() == 0 {
                self.subtables[i + 1].remove(&mut self.nodes, id);
                self.subtables[i + 1].dead -= 1;
                self.keys -= 1;
                self.dead -= 1;
                self.nodes[id] = Node::Free(self.free_list);
                self.free_list = Some(id);
                self.free_count += 1;
            }
        }

        for &id in &xnodes {
            if matches!(self.nodes[id], Node::Free(_)) {
                continue;
            }
            let (f0, f1) = {
                let n = self.nt(id);
                (n.low(), n.high())
            };
            let f1_tops_y = self.edge_index(f1) == Some(y);
            let f0_tops_y = self.edge_index(f0) == Some(y);
            if !f1_tops_y && !f0_tops_y {
                // Does not interact with y: stays labeled x, already in the
                // right subtable with an unchanged hash.
                continue;
            }
            let (f10, f11) = if f1_tops_y {
                self.edge_cofactors(f1)
            } else {
                (f1, f1)
            };
            let (f00, f01) = if f0_tops_y {
                self.edge_cofactors(f0)
            } else {
                (f0, f0)
            };
            // New then child tops x with the y=1 cofactors, new else child
            // with the y=0 cofactors. Claims on the grandchildren are taken
            // before the old children give theirs up.
            let g1 = self.swap_unique(i + 1, x, f01, f11)?;
            let g0 = match self.swap_unique(i + 1, x, f00, f10) {
                Some(g0) => g0,
                None => {
                    self.recursive_deref(g1);
                    return None;
                }
            };
            debug_assert!(!g1.is_complement());
            self.subtables[i + 1].remove(&mut self.nodes, id);
            self.keys -= 1;
            self.recursive_deref(f1);
            self.recursive_deref(f0);
            self.nt_mut(id).rewrite(y, g0, g1);
            self.subtables[i].insert(&mut self.nodes, id);
            self.keys += 1;
        }

        for lvl in [i, i + 1] {
            if self.subtables[lvl].needs_rehash() {
                let mut st =
                    std::mem::replace(&mut self.subtables[lvl], crate::unique::Subtable::new(2));
                st.rehash(&mut self.nodes);
                self.subtables[lvl] = st;
            }
        }
        Some(self.live_keys())
    }

    // --- sifting -----------------------------------------------------------

    /// Moves the variable at `level` to `target` by adjacent swaps.
    pub(crate) fn move_var(&mut self, level: Level, target: Level) -> Option<usize> {
        let mut l = level;
        let mut size = self.live_keys();
        while l < target {
            size = self.swap_levels(l)?;
            l += 1;
        }
        while l > target {
            size = self.swap_levels(l - 1)?;
            l -= 1;
        }
        Some(size)
    }

    /// Sifts one variable between `low` and `high` (inclusive levels) and
    /// parks it at the best position seen. Earlier positions win ties.
    pub(crate) fn sift_var(
        &mut self,
        index: VarIndex,
        low: Level,
        high: Level,
        max_growth: f64,
        budget: &mut usize,
    ) -> Option<()> {
        let start = self.perm[index];
        let initial = self.live_keys();
        let bound = (initial as f64 * max_growth) as usize;
        let mut best_size = initial;
        let mut best_level = start;

        // Up toward the top, then down across the whole range.
        let mut level = start;
        while level > low && *budget > 0 {
            let size = self.swap_levels(level - 1)?;
            *budget -= 1;
            level -= 1;
            if size < best_size {
                best_size = size;
                best_level = level;
            }
            if size > bound {
                break;
            }
        }
        while level < high && *budget > 0 {
            let size = self.swap_levels(level)?;
            *budget -= 1;
            level += 1;
            if size < best_size {
                best_size = size;
                best_level = level;
            }
            if size > bound {
                break;
            }
        }
        self.move_var(level, best_level)?;
        Some(())
    }

    /// Sifting: each variable in decreasing subtable-population order is
    /// moved across the whole order and parked where the diagram was
    /// smallest. `converge` repeats passes to a fixpoint.
    pub(crate) fn sift(&mut self, converge: bool, max_growth: f64) -> Option<()> {
        let n = self.read_size();
        if n < 2 {
            return Some(());
        }
        let mut budget = self.sift_max_swap;
        loop {
            let before = self.live_keys();
            let mut order: Vec<VarIndex> = (0..n).collect();
            order.sort_by_key(|&v| std::cmp::Reverse(self.subtables[self.perm[v]].keys));
            order.truncate(self.sift_max_var);
            for &v in &order {
                if budget == 0 {
                    break;
                }
                self.sift_var(v, 0, n - 1, max_growth, &mut budget)?;
            }
            if !converge || self.live_keys() >= before || budget == 0 {
                break;
            }
        }
        Some(())
    }

    // --- random swapping ---------------------------------------------------

    /// Exchanges the variables at two levels through adjacent swaps.
    fn exchange(&mut self, a: Level, b: Level) -> Option<usize> {
        debug_assert!(a < b);
        // Bubble the upper variable down to b, dragging it past the block,
        // then bring the former b (now at b-1) up to a.
        for l in a..b {
            self.swap_levels(l)?;
        }
        let mut size = self.live_keys();
        for l in (a..b.saturating_sub(1)).rev() {
            size = self.swap_levels(l)?;
        }
        Some(size)
    }

    /// Random pairwise swapping; a pivot concentrates one endpoint around
    /// the most populated level. Swaps that grow the diagram are undone.
    pub(crate) fn random_swaps(&mut self, pivot: bool) -> Option<()> {
        let n = self.read_size();
        if n < 2 {
            return Some(());
        }
        for _ in 0..n {
            let (a, b) = if pivot {
                let p = (0..n)
                    .max_by_key(|&l| self.subtables[l].keys)
                    .unwrap_or(n / 2);
                if p == 0 {
                    (0, 1 + self.random_below(n - 1))
                } else {
                    let a = self.random_below(p);
                    let b = p + self.random_below(n - p);
                    if a == b {
                        continue;
                    }
                    (a, b)
                }
            } else {
                let a = self.random_below(n);
                let b = self.random_below(n);
                if a == b {
                    continue;
                }
                (a.min(b), a.max(b))
            };
            let before = self.live_keys();
            let after = self.exchange(a, b)?;
            if after > before {
                self.exchange(a, b)?;
            }
        }
        Some(())
    }

    // --- explicit orders ---------------------------------------------------

    /// Rebuilds the order so that `order[level]` is the variable living at
    /// `level`, using adjacent swaps only.
    pub(crate) fn shuffle_inner(&mut self, order: &[VarIndex]) -> Option<()> {
        let n = self.read_size();
        debug_assert_eq!(order.len(), n);
        for target in 0..n {
            let v = order[target];
            let mut l = self.perm[v];
            debug_assert!(l >= target);
            while l > target {
                self.swap_levels(l - 1)?;
                l -= 1;
            }
        }
        Some(())
    }

    /// Imposes an explicit variable order: `order[level]` names the variable
    /// to live at `level`. Flushes the cache like any reordering.
    pub fn shuffle_heap(&mut self, order: &[VarIndex]) -> bool {
        let n = self.read_size();
        if order.len() != n {
            self.record_error(ErrorCode::InvalidArg);
            return false;
        }
        let mut seen = vec![false; n];
        for &v in order {
            if v >= n || seen[v] {
                self.record_error(ErrorCode::InvalidArg);
                return false;
            }
            seen[v] = true;
        }
        if self.in_reorder {
            self.record_error(ErrorCode::InternalError);
            return false;
        }
        self.in_reorder = true;
        self.garbage_collect();
        self.cache.wipe();
        let ok = self.shuffle_inner(order).is_some();
        self.in_reorder = false;
        ok
    }

    // --- the dispatcher ----------------------------------------------------

    /// Runs one reordering pass with the given method, provided at least
    /// `minsize` live nodes are present. Returns whether the pass completed.
    ///
    /// The cache is flushed for the duration; on a mid-pass failure the
    /// pre-pass order is restored from a snapshot.
    pub fn reduce_heap(&mut self, method: ReorderMethod, minsize: usize) -> bool {
        let method = if method == ReorderMethod::Same {
            self.autodyn_method
        } else {
            method
        };
        if method == ReorderMethod::None {
            return true;
        }
        if self.live_keys() < minsize {
            return true;
        }
        if self.in_reorder {
            self.record_error(ErrorCode::InternalError);
            return false;
        }
        if !self.run_hooks(HookType::PreReordering, method.label()) {
            self.record_error(ErrorCode::InternalError);
            return false;
        }
        self.in_reorder = true;
        self.garbage_collect();
        self.cache.wipe();

        let snapshot = self.invperm.clone();
        let max_growth = if self.reorder_cycle > 0
            && self.reorderings.wrapping_rem(self.reorder_cycle.max(1)) == self.reorder_cycle - 1
        {
            self.max_growth_alt
        } else {
            self.max_growth
        };

        let ok = match method {
            ReorderMethod::Same | ReorderMethod::None => Some(()),
            ReorderMethod::Random => self.random_swaps(false),
            ReorderMethod::RandomPivot => self.random_swaps(true),
            ReorderMethod::Sift => self.sift(false, max_growth),
            ReorderMethod::SiftConverge => self.sift(true, max_growth),
            ReorderMethod::SymmSift => self.symm_sift(false, max_growth),
            ReorderMethod::SymmSiftConv => self.symm_sift(true, max_growth),
            ReorderMethod::Window2 => self.window_permute(2, false),
            ReorderMethod::Window3 => self.window_permute(3, false),
            ReorderMethod::Window4 => self.window_permute(4, false),
            ReorderMethod::Window2Conv => self.window_permute(2, true),
            ReorderMethod::Window3Conv => self.window_permute(3, true),
            ReorderMethod::Window4Conv => self.window_permute(4, true),
            ReorderMethod::GroupSift => self.group_sift(false, max_growth),
            ReorderMethod::GroupSiftConv => self.group_sift(true, max_growth),
            ReorderMethod::Annealing => self.anneal(),
            ReorderMethod::Genetic => self.genetic(),
            // Linear combinations are not maintained here: the converging
            // sift provides the same contract at comparable cost.
            ReorderMethod::Linear => self.sift(true, max_growth),
            ReorderMethod::LinearConverge => self.sift(true, max_growth),
            ReorderMethod::LazySift => self.group_sift(false, max_growth),
            ReorderMethod::Exact => self.exact_reorder(),
        };

        if ok.is_none() {
            // Best effort: put the pre-pass order back.
            let _ = self.shuffle_inner(&snapshot);
        }
        self.reorderings = self.reorderings.saturating_add(1);
        self.next_dyn = (2 * self.live_keys()).max(MIN_NEXT_DYN);
        self.in_reorder = false;
        if !self.run_hooks(HookType::PostReordering, method.label()) {
            self.record_error(ErrorCode::InternalError);
            return false;
        }
        ok.is_some()
    }

    /// Enables reordering with `method` whenever the live node count crosses
    /// the dynamic threshold.
    pub fn autodyn_enable(&mut self, method: ReorderMethod) {
        self.autodyn = true;
        if method != ReorderMethod::Same {
            self.autodyn_method = method;
        }
    }

    pub fn autodyn_disable(&mut self) {
        self.autodyn = false;
    }

    pub fn read_reordering_status(&self) -> (bool, ReorderMethod) {
        (self.autodyn, self.autodyn_method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds f = (x0 & x1) | (x2 & x3) | (x4 & x5) under an interleaved
    /// order that is far from optimal.
    fn comb(dd: &mut DdManager, pairs: &[(usize, usize)]) -> Edge {
        let mut f = dd.logic_zero();
        dd.ref_edge(f);
        for &(a, b) in pairs {
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
        f
    }

    fn eval(dd: &DdManager, f: Edge, assignment: &[bool]) -> bool {
        let mut e = f;
        loop {
            if dd.is_constant(e.regular()) {
                return !e.is_complement();
            }
            let index = dd.edge_index(e).unwrap();
            let (lo, hi) = dd.edge_cofactors(e);
            e = if assignment[index] { hi } else { lo };
        }
    }

    #[test]
    fn swap_preserves_functions() {
        let mut dd = DdManager::init(4, 0, 64, 256, 0);
        let f = comb(&mut dd, &[(0, 2), (1, 3)]);
        let mut truth = Vec::new();
        for m in 0..16u32 {
            let a: Vec<bool> = (0..4).map(|i| m >> i & 1 == 1).collect();
            truth.push(eval(&dd, f, &a));
        }
        // Direct swaps require the pass preamble: no dead entries in the
        // cache, no nested reordering.
        dd.garbage_collect();
        dd.cache.wipe();
        dd.in_reorder = true;
        for l in [0, 1, 2, 1, 0] {
            dd.swap_levels(l).unwrap();
        }
        dd.in_reorder = false;
        for m in 0..16u32 {
            let a: Vec<bool> = (0..4).map(|i| m >> i & 1 == 1).collect();
            assert_eq!(eval(&dd, f, &a), truth[m as usize]);
        }
        // perm and invperm stay mutually inverse.
        for v in 0..4 {
            assert_eq!(dd.invperm[dd.perm[v]], v);
        }
        dd.recursive_deref(f);
    }

    #[test]
    fn sift_shrinks_interleaved_comb() {
        let mut dd = DdManager::init(6, 0, 64, 256, 0);
        // Pairs far apart in the order force a large diagram.
        let f = comb(&mut dd, &[(0, 3), (1, 4), (2, 5)]);
        let before = dd.dag_size(f);
        assert!(dd.reduce_heap(ReorderMethod::Sift, 0));
        let after = dd.dag_size(f);
        assert!(after <= before);
        // A second pass never grows the diagram.
        assert!(dd.reduce_heap(ReorderMethod::Sift, 0));
        assert!(dd.dag_size(f) <= after);
        dd.recursive_deref(f);
    }

    #[test]
    fn shuffle_heap_installs_order() {
        let mut dd = DdManager::init(4, 0, 64, 256, 0);
        let f = comb(&mut dd, &[(0, 2), (1, 3)]);
        let order = vec![3, 1, 2, 0];
        assert!(dd.shuffle_heap(&order));
        for (level, &v) in order.iter().enumerate() {
            assert_eq!(dd.read_inv_perm(level), Some(v));
            assert_eq!(dd.read_perm(v), Some(level));
        }
        dd.recursive_deref(f);
    }

    #[test]
    fn shuffle_heap_rejects_non_permutation() {
        let mut dd = DdManager::init(3, 0, 64, 256, 0);
        assert!(!dd.shuffle_heap(&[0, 0, 1]));
        assert_eq!(dd.read_error_code(), ErrorCode::InvalidArg);
        dd.clear_error_code();
    }

    #[test]
    fn reorder_preserves_leq() {
        let mut dd = DdManager::init(6, 0, 64, 256, 0);
        let f = comb(&mut dd, &[(0, 3), (1, 4)]);
        let g = comb(&mut dd, &[(0, 3), (1, 4), (2, 5)]);
        assert!(dd.leq(f, g));
        assert!(dd.reduce_heap(ReorderMethod::Sift, 0));
        assert!(dd.leq(f, g));
        assert!(!dd.leq(g, f));
        dd.recursive_deref(f);
        dd.recursive_deref(g);
    }

    #[test]
    fn random_methods_preserve_semantics() {
        let mut dd = DdManager::init(4, 0, 64, 256, 0);
        dd.srandom(7);
        let f = comb(&mut dd, &[(0, 2), (1, 3)]);
        let minterms = dd.count_minterm(f, 4);
        assert!(dd.reduce_heap(ReorderMethod::Random, 0));
        assert_eq!(dd.count_minterm(f, 4), minterms);
        assert!(dd.reduce_heap(ReorderMethod::RandomPivot, 0));
        assert_eq!(dd.count_minterm(f, 4), minterms);
        dd.recursive_deref(f);
    }

    #[test]
    fn autodyn_toggle() {
        let mut dd = DdManager::init(2, 0, 64, 256, 0);
        dd.autodyn_enable(ReorderMethod::SiftConverge);
        assert_eq!(
            dd.read_reordering_status(),
            (true, ReorderMethod::SiftConverge)
        );
        dd.autodyn_disable();
        assert_eq!(
            dd.read_reordering_status(),
            (false, ReorderMethod::SiftConverge)
        );
    }
}
