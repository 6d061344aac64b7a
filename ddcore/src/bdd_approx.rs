use common::prelude::*;

use crate::edge::Edge;
use crate::manager::DdManager;

/// A subgraph occurrence eligible for replacement: the regular node plus the
/// cumulative complement parity under which the root sees it. The same node
/// reached under both parities yields two independent candidates, because
/// replacement acts on the edges of one parity class at a time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct Occurrence {
    node: NodeId,
    parity: bool,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    occ: Occurrence,
    /// Minterm fraction of the function the root sees at this occurrence;
    /// replacing it by zero loses at most this weight.
    loss: f64,
    level: Level,
}

impl DdManager {
    /// An under-approximation of `f`: implied by `f`, at most `threshold`
    /// nodes. Small-weight occurrences are replaced by constant zero, driven
    /// by per-occurrence minterm signatures over `num_vars` variables;
    /// `quality` scales how reluctantly weight is given up. Replacements
    /// here preserve the subset relation by construction, so `safe` changes
    /// nothing; it gates sibling substitution in the remap variants.
    pub fn under_approx(
        &mut self,
        f: Edge,
        num_vars: usize,
        threshold: usize,
        safe: bool,
        quality: f64,
    ) -> Option<Edge> {
        let _ = (num_vars, safe);
        self.approx_prune(f, threshold, quality, None, None)
    }

    /// An over-approximation of `f`: `f ⊆ result`, at most `threshold`
    /// nodes.
    pub fn over_approx(
        &mut self,
        f: Edge,
        num_vars: usize,
        threshold: usize,
        safe: bool,
        quality: f64,
    ) -> Option<Edge> {
        self.under_approx(f.not(), num_vars, threshold, safe, quality)
            .map(Edge::not)
    }

    /// Under-approximation that may substitute an occurrence by one of its
    /// own cofactors when that is cheaper than a constant. With `safe` the
    /// substitution is checked to preserve the subset relation; without it
    /// the check is skipped for better compression.
    pub fn remap_under_approx(
        &mut self,
        f: Edge,
        num_vars: usize,
        threshold: usize,
        safe: bool,
        quality: f64,
    ) -> Option<Edge> {
        let _ = num_vars;
        self.approx_prune(f, threshold, quality, Some(safe), None)
    }

    pub fn remap_over_approx(
        &mut self,
        f: Edge,
        num_vars: usize,
        threshold: usize,
        safe: bool,
        quality: f64,
    ) -> Option<Edge> {
        self.remap_under_approx(f.not(), num_vars, threshold, safe, quality)
            .map(Edge::not)
    }

    /// Under-approximation biased by `b`: occurrences overlapping the bias
    /// region are priced with `quality1`, the rest with `quality0`, so the
    /// approximation stays tight where `b` holds.
    pub fn biased_under_approx(
        &mut self,
        f: Edge,
        b: Edge,
        num_vars: usize,
        threshold: usize,
        quality1: f64,
        quality0: f64,
    ) -> Option<Edge> {
        let _ = num_vars;
        self.approx_prune(f, threshold, quality0, None, Some((b, quality1)))
    }

    pub fn biased_over_approx(
        &mut self,
        f: Edge,
        b: Edge,
        num_vars: usize,
        threshold: usize,
        quality1: f64,
        quality0: f64,
    ) -> Option<Edge> {
        self.biased_under_approx(f.not(), b.not(), num_vars, threshold, quality1, quality0)
            .map(Edge::not)
    }

    /// The shared pruning engine. Repeatedly replaces the cheapest
    /// occurrence until the diagram fits in `threshold` nodes.
    fn approx_prune(
        &mut self,
        f: Edge,
        threshold: usize,
        quality: f64,
        remap_safe: Option<bool>,
        bias: Option<(Edge, f64)>,
    ) -> Option<Edge> {
        let threshold = threshold.max(1);
        let mut current = f;
        self.ref_edge(current);
        loop {
            if self.dag_size(current) <= threshold {
                break;
            }
            let candidates = self.gather_candidates(current, quality, bias);
            let Some(victim) = candidates.first().copied() else {
                break;
            };
            let replaced = self.replace_occurrence(current, victim.occ, remap_safe);
            match replaced {
                Some(r) => {
                    self.ref_edge(r);
                    self.recursive_deref(current);
                    current = r;
                }
                None => {
                    self.recursive_deref(current);
                    return None;
                }
            }
        }
        self.deref(current);
        Some(current)
    }

    /// Collects replaceable occurrences, cheapest loss first. Deeper
    /// occurrences win ties: replacing them perturbs the function least.
    fn gather_candidates(
        &mut self,
        f: Edge,
        quality: f64,
        bias: Option<(Edge, f64)>,
    ) -> Vec<Candidate> {
        let mut seen: DdHashSet<(NodeId, bool)> = DdHashSet::default();
        let mut memo: DdHashMap<NodeId, f64> = DdHashMap::default();
        let mut out: Vec<Candidate> = Vec::new();
        let mut stack: Vec<(Edge, bool)> = vec![(f, false)];
        while let Some((e, par_above)) = stack.pop() {
            if self.is_constant(e.regular()) {
                continue;
            }
            let cum = par_above ^ e.is_complement();
            if !seen.insert((e.regular().node(), cum)) {
                continue;
            }
            // Never prune the root occurrence itself to a constant first;
            // it is kept as the implicit last resort.
            if !(e == f && cum == f.is_complement()) {
                let frac = self.minterm_fraction(e.regular(), &mut memo);
                let view = if cum { 1.0 - frac } else { frac };
                let price = match bias {
                    Some((b, quality1)) => {
                        let view_edge = e.regular().not_if(cum);
                        if self.leq(view_edge, b.not()) {
                            quality
                        } else {
                            quality1
                        }
                    }
                    None => quality,
                };
                out.push(Candidate {
                    occ: Occurrence {
                        node: e.regular().node(),
                        parity: cum,
                    },
                    loss: view * price.max(f64::MIN_POSITIVE),
                    level: self.edge_level(e),
                });
            }
            let n = self.nt(e.regular().node());
            stack.push((n.high(), cum));
            stack.push((n.low(), cum));
        }
        out.sort_by(|a, b| {
            a.loss
                .partial_cmp(&b.loss)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.level.cmp(&a.level))
        });
        out
    }

    /// Rebuilds `f` with the victim occurrence replaced: by a cofactor that
    /// stays inside the subset relation when remapping is allowed, by
    /// constant zero otherwise.
    fn replace_occurrence(
        &mut self,
        f: Edge,
        victim: Occurrence,
        remap_safe: Option<bool>,
    ) -> Option<Edge> {
        self.with_retry(|dd| {
            let mut memo: DdHashMap<(NodeId, bool), Edge> = DdHashMap::default();
            let res = dd.replace_recur(f, false, victim, remap_safe, &mut memo);
            if let Some(r) = res {
                dd.ref_edge(r);
            }
            for (_, r) in memo.drain() {
                dd.recursive_deref(r);
            }
            res.map(|r| {
                dd.deref(r);
                r
            })
        })
    }

    fn replace_recur(
        &mut self,
        e: Edge,
        par_above: bool,
        victim: Occurrence,
        remap_safe: Option<bool>,
        memo: &mut DdHashMap<(NodeId, bool), Edge>,
    ) -> Option<Edge> {
        if self.is_constant(e.regular()) {
            return Some(e);
        }
        let cum = par_above ^ e.is_complement();
        let key = (e.regular().node(), cum);
        if key.0 == victim.node && cum == victim.parity {
            // The view the root sees here becomes as small as allowed.
            let replacement = self.victim_replacement(e, cum, remap_safe);
            // Translate the viewed function back into an in-place edge: the
            // view is the denoted function complemented by the path parity.
            return Some(replacement.not_if(par_above));
        }
        if let Some(&r) = memo.get(&key) {
            return Some(r.not_if(e.is_complement()));
        }
        let n = self.nt(e.regular().node());
        let (low, high, index) = (n.low(), n.high(), n.index());
        let t = self.replace_recur(high, cum, victim, remap_safe, memo)?;
        self.ref_edge(t);
        let eo = match self.replace_recur(low, cum, victim, remap_safe, memo) {
            Some(x) => x,
            None => {
                self.recursive_deref(t);
                return None;
            }
        };
        self.ref_edge(eo);
        let r = match self.unique_inter(index, eo, t) {
            Some(r) => r,
            None => {
                self.recursive_deref(t);
                self.recursive_deref(eo);
                return None;
            }
        };
        self.ref_edge(r);
        self.recursive_deref(t);
        self.recursive_deref(eo);
        memo.insert(key, r);
        Some(r.not_if(e.is_complement()))
    }

    /// Picks what the victim's viewed function collapses to. Constant zero
    /// is always a subset; a cofactor is preferred when remapping is allowed
    /// and (under `safe`) provably inside the view.
    fn victim_replacement(&mut self, e: Edge, cum: bool, remap_safe: Option<bool>) -> Edge {
        let zero = self.logic_zero();
        let view = e.regular().not_if(cum);
        if let Some(safe) = remap_safe {
            let (low, high) = {
                let n = self.nt(e.regular().node());
                (n.low(), n.high())
            };
            for child in [high, low] {
                let child_view = child.not_if(cum);
                if self.is_constant(child_view.regular()) && child_view != view {
                    continue;
                }
                if !safe || self.leq(child_view, view) {
                    return child_view;
                }
            }
        }
        zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(dd: &mut DdManager, n: usize) -> Edge {
        // f = (x0 & x1) | (x2 & x3) | ... : a function with prunable weight.
        let mut f = dd.logic_zero();
        dd.ref_edge(f);
        for i in 0..n / 2 {
            let a = dd.ith_var(2 * i).unwrap();
            let b = dd.ith_var(2 * i + 1).unwrap();
            let t = dd.and(a, b).unwrap();
            dd.ref_edge(t);
            let nf = dd.or(f, t).unwrap();
            dd.ref_edge(nf);
            dd.recursive_deref(t);
            dd.recursive_deref(f);
            f = nf;
        }
        dd.deref(f);
        f
    }

    #[test]
    fn under_approx_is_subset_and_small() {
        let mut dd = DdManager::init(8, 0, 256, 1024, 0);
        let f = chain(&mut dd, 8);
        dd.ref_edge(f);
        let threshold = 5;
        let a = dd.under_approx(f, 8, threshold, true, 1.0).unwrap();
        dd.ref_edge(a);
        assert!(dd.leq(a, f));
        assert!(dd.dag_size(a) <= threshold);
        dd.recursive_deref(a);
        dd.recursive_deref(f);
    }

    #[test]
    fn over_approx_is_superset_and_small() {
        let mut dd = DdManager::init(8, 0, 256, 1024, 0);
        let f = chain(&mut dd, 8);
        dd.ref_edge(f);
        let threshold = 5;
        let a = dd.over_approx(f, 8, threshold, true, 1.0).unwrap();
        dd.ref_edge(a);
        assert!(dd.leq(f, a));
        assert!(dd.dag_size(a) <= threshold);
        dd.recursive_deref(a);
        dd.recursive_deref(f);
    }

    #[test]
    fn generous_threshold_is_identity() {
        let mut dd = DdManager::init(8, 0, 256, 1024, 0);
        let f = chain(&mut dd, 8);
        dd.ref_edge(f);
        let a = dd.under_approx(f, 8, 1000, true, 1.0).unwrap();
        assert_eq!(a, f);
        dd.recursive_deref(f);
    }

    #[test]
    fn remap_safe_stays_subset() {
        let mut dd = DdManager::init(8, 0, 256, 1024, 0);
        let f = chain(&mut dd, 8);
        dd.ref_edge(f);
        let a = dd.remap_under_approx(f, 8, 4, true, 1.0).unwrap();
        dd.ref_edge(a);
        assert!(dd.leq(a, f));
        assert!(dd.dag_size(a) <= 4);
        dd.recursive_deref(a);
        dd.recursive_deref(f);
    }

    #[test]
    fn biased_under_approx_is_subset() {
        let mut dd = DdManager::init(8, 0, 256, 1024, 0);
        let f = chain(&mut dd, 8);
        dd.ref_edge(f);
        let b = dd.ith_var(0).unwrap();
        let a = dd.biased_under_approx(f, b, 8, 4, 1.0, 0.5).unwrap();
        dd.ref_edge(a);
        assert!(dd.leq(a, f));
        dd.recursive_deref(a);
        dd.recursive_deref(f);
    }
}
