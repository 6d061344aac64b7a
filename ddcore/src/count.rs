use common::prelude::*;

use crate::edge::Edge;
use crate::manager::DdManager;

impl DdManager {
    /// Number of distinct nodes in the diagram rooted at `f`, terminals
    /// included. Complemented edges share their regular node.
    pub fn dag_size(&self, f: Edge) -> usize {
        let mut visited: DdHashSet<NodeId> = DdHashSet::default();
        self.dag_size_impl(f.regular(), &mut visited);
        visited.len()
    }

    fn dag_size_impl(&self, f: Edge, visited: &mut DdHashSet<NodeId>) {
        if !visited.insert(f.node()) {
            return;
        }
        if !self.is_constant(f) {
            let n = self.nt(f.node());
            let (low, high) = (n.low(), n.high());
            self.dag_size_impl(high.regular(), visited);
            self.dag_size_impl(low.regular(), visited);
        }
    }

    /// Number of minterms of `f` over `n_vars` variables.
    pub fn count_minterm(&self, f: Edge, n_vars: usize) -> f64 {
        let mut memo: DdHashMap<NodeId, f64> = DdHashMap::default();
        let p = self.minterm_fraction(f, &mut memo);
        p * (n_vars as f64).exp2()
    }

    /// Fraction of assignments satisfying `f`, memoized on regular nodes.
    pub(crate) fn minterm_fraction(&self, f: Edge, memo: &mut DdHashMap<NodeId, f64>) -> f64 {
        let p = self.minterm_fraction_regular(f.regular(), memo);
        if f.is_complement() {
            1.0 - p
        } else {
            p
        }
    }

    fn minterm_fraction_regular(&self, f: Edge, memo: &mut DdHashMap<NodeId, f64>) -> f64 {
        debug_assert!(!f.is_complement());
        if self.is_constant(f) {
            // The only regular Boolean terminal is ONE.
            return 1.0;
        }
        if let Some(&p) = memo.get(&f.node()) {
            return p;
        }
        let n = self.nt(f.node());
        let (low, high) = (n.low(), n.high());
        let pt = self.minterm_fraction(high, memo);
        let pe = self.minterm_fraction(low, memo);
        let p = 0.5 * pt + 0.5 * pe;
        memo.insert(f.node(), p);
        p
    }

    /// The variable indices `f` depends on, in increasing index order.
    pub fn support_indices(&self, f: Edge) -> Vec<VarIndex> {
        let mut visited: DdHashSet<NodeId> = DdHashSet::default();
        let mut support: DdHashSet<VarIndex> = DdHashSet::default();
        self.support_impl(f.regular(), &mut visited, &mut support);
        let mut indices: Vec<VarIndex> = support.into_iter().collect();
        indices.sort_unstable();
        indices
    }

    fn support_impl(
        &self,
        f: Edge,
        visited: &mut DdHashSet<NodeId>,
        support: &mut DdHashSet<VarIndex>,
    ) {
        if !visited.insert(f.node()) {
            return;
        }
        if let Some(index) = self.edge_index(f) {
            support.insert(index);
            let n = self.nt(f.node());
            let (low, high) = (n.low(), n.high());
            self.support_impl(high.regular(), visited, support);
            self.support_impl(low.regular(), visited, support);
        }
    }

    /// The support of `f` as a cube of positive literals.
    pub fn support(&mut self, f: Edge) -> Option<Edge> {
        let lits: Vec<(usize, bool)> = self
            .support_indices(f)
            .into_iter()
            .map(|i| (i, true))
            .collect();
        self.compute_cube(&lits)
    }

    /// Number of variables `f` depends on.
    pub fn support_size(&self, f: Edge) -> usize {
        self.support_indices(f).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (DdManager, Vec<Edge>) {
        let mut dd = DdManager::init(4, 0, 256, 1024, 0);
        let vars = (0..4).map(|i| dd.ith_var(i).unwrap()).collect();
        (dd, vars)
    }

    #[test]
    fn dag_size_of_small_functions() {
        let (mut dd, v) = setup();
        assert_eq!(dd.dag_size(dd.one()), 1);
        assert_eq!(dd.dag_size(v[0]), 2);
        let f = dd.and(v[0], v[1]).unwrap();
        assert_eq!(dd.dag_size(f), 3);
        let g = dd.or(v[2], v[3]).unwrap();
        assert_eq!(dd.dag_size(g), 3);
    }

    #[test]
    fn count_minterm_basics() {
        let (mut dd, v) = setup();
        assert_eq!(dd.count_minterm(dd.one(), 4), 16.0);
        assert_eq!(dd.count_minterm(dd.logic_zero(), 4), 0.0);
        assert_eq!(dd.count_minterm(v[0], 4), 8.0);
        let f = dd.and(v[0], v[1]).unwrap();
        assert_eq!(dd.count_minterm(f, 4), 4.0);
        assert_eq!(dd.count_minterm(f.not(), 4), 12.0);
        let x = dd.xor(v[0], v[1]).unwrap();
        assert_eq!(dd.count_minterm(x, 4), 8.0);
    }

    #[test]
    fn support_of_ite() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[3]).unwrap();
        dd.ref_edge(f);
        assert_eq!(dd.support_indices(f), vec![0, 1, 3]);
        assert_eq!(dd.support_size(f), 3);
        let cube = dd.support(f).unwrap();
        dd.ref_edge(cube);
        assert!(dd.check_cube(cube));
        dd.recursive_deref(cube);
        dd.recursive_deref(f);
    }
}
