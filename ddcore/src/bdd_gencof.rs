use crate::cache::Operation;
use crate::edge::Edge;
use crate::manager::DdManager;

impl DdManager {
    /// The constrain generalized cofactor: agrees with `f` wherever `c`
    /// holds and tends to shrink `f` by following `c`'s structure. May
    /// introduce variables of `c` that `f` does not depend on.
    pub fn constrain(&mut self, f: Edge, c: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.constrain_recur(f, c))
    }

    pub(crate) fn constrain_recur(&mut self, f: Edge, c: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if c == one {
            return Some(f);
        }
        if c == zero {
            return Some(zero);
        }
        if f == one || f == zero {
            return Some(f);
        }
        if f == c {
            return Some(one);
        }
        if f == c.not() {
            return Some(zero);
        }
        if let Some(r) = self.cache.lookup2(Operation::Constrain, f, c) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let lvl = self.edge_level(f).min(self.edge_level(c));
        let index = self.invperm[lvl];
        let (fe, ft) = self.cofactors_at(f, lvl);
        let (ce, ct) = self.cofactors_at(c, lvl);

        let r = if ct == zero {
            self.constrain_recur(fe, ce)?
        } else if ce == zero {
            self.constrain_recur(ft, ct)?
        } else {
            let t = self.constrain_recur(ft, ct)?;
            self.ref_edge(t);
            let e = match self.constrain_recur(fe, ce) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            let r = if t == e {
                t
            } else {
                match self.unique_inter(index, e, t) {
                    Some(r) => r,
                    None => {
                        self.recursive_deref(t);
                        self.recursive_deref(e);
                        return None;
                    }
                }
            };
            self.deref(t);
            self.deref(e);
            r
        };
        self.cache.insert2(Operation::Constrain, f, c, r);
        Some(r)
    }

    /// The restrict generalized cofactor: like `constrain`, but never
    /// introduces variables outside the support of `f`. Variables private to
    /// `c` are quantified away first.
    pub fn restrict(&mut self, f: Edge, c: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();
        if c == one {
            return Some(f);
        }
        if c == zero {
            return Some(zero);
        }
        // Abstract from c the variables f does not depend on.
        let supp_f = self.support_indices(f);
        let supp_c = self.support_indices(c);
        let private: Vec<(usize, bool)> = supp_c
            .iter()
            .filter(|&&i| !supp_f.contains(&i))
            .map(|&i| (i, true))
            .collect();
        let c = if private.is_empty() {
            c
        } else {
            let cube = self.compute_cube(&private)?;
            self.ref_edge(cube);
            let abstracted = self.exist_abstract(c, cube);
            self.recursive_deref(cube);
            let abstracted = abstracted?;
            if abstracted == one {
                return Some(f);
            }
            if abstracted == zero {
                return Some(zero);
            }
            abstracted
        };
        self.ref_edge(c);
        let res = self.with_retry(|dd| dd.restrict_recur(f, c));
        if let Some(r) = res {
            self.ref_edge(r);
            self.recursive_deref(c);
            self.deref(r);
        } else {
            self.recursive_deref(c);
        }
        res
    }

    fn restrict_recur(&mut self, f: Edge, c: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if c == one {
            return Some(f);
        }
        if c == zero {
            return Some(zero);
        }
        if f == one || f == zero {
            return Some(f);
        }
        if f == c {
            return Some(one);
        }
        if f == c.not() {
            return Some(zero);
        }
        if let Some(r) = self.cache.lookup2(Operation::Restrict, f, c) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let flvl = self.edge_level(f);
        let clvl = self.edge_level(c);
        let r = if clvl < flvl {
            // f does not test this variable: remove it from the care set
            // instead of copying it into the result.
            let (ce, ct) = self.edge_cofactors(c);
            let merged = self.and_recur(ce.not(), ct.not())?.not();
            self.ref_edge(merged);
            let r = self.restrict_recur(f, merged);
            if let Some(r) = r {
                self.ref_edge(r);
                self.recursive_deref(merged);
                self.deref(r);
            } else {
                self.recursive_deref(merged);
            }
            r?
        } else {
            let lvl = flvl.min(clvl);
            let index = self.invperm[lvl];
            let (fe, ft) = self.cofactors_at(f, lvl);
            let (ce, ct) = self.cofactors_at(c, lvl);
            if ct == zero {
                self.restrict_recur(fe, ce)?
            } else if ce == zero {
                self.restrict_recur(ft, ct)?
            } else {
                let t = self.restrict_recur(ft, ct)?;
                self.ref_edge(t);
                let e = match self.restrict_recur(fe, ce) {
                    Some(e) => e,
                    None => {
                        self.recursive_deref(t);
                        return None;
                    }
                };
                self.ref_edge(e);
                let r = if t == e {
                    t
                } else {
                    match self.unique_inter(index, e, t) {
                        Some(r) => r,
                        None => {
                            self.recursive_deref(t);
                            self.recursive_deref(e);
                            return None;
                        }
                    }
                };
                self.deref(t);
                self.deref(e);
                r
            }
        };
        self.cache.insert2(Operation::Restrict, f, c, r);
        Some(r)
    }

    /// Picks the smallest of `f`, `constrain(f, c)` and `restrict(f, c)`.
    /// The result agrees with `f` wherever `c` holds.
    pub fn minimize(&mut self, f: Edge, c: Edge) -> Option<Edge> {
        let one = self.one();
        if c == one || c == one.not() {
            return Some(f);
        }
        let con = self.constrain(f, c)?;
        self.ref_edge(con);
        let res = match self.restrict(f, c) {
            Some(r) => r,
            None => {
                self.recursive_deref(con);
                return None;
            }
        };
        self.ref_edge(res);
        let mut best = f;
        let mut best_size = self.dag_size(f);
        for cand in [con, res] {
            let size = self.dag_size(cand);
            if size < best_size {
                best = cand;
                best_size = size;
            }
        }
        self.ref_edge(best);
        self.recursive_deref(con);
        self.recursive_deref(res);
        self.deref(best);
        Some(best)
    }

    /// The smallest diagram found between the bounds `l ⊆ u`: wherever the
    /// interval allows a constant or lets a variable drop, it does.
    pub fn squeeze(&mut self, l: Edge, u: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.squeeze_recur(l, u))
    }

    fn squeeze_recur(&mut self, l: Edge, u: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if l == zero {
            return Some(zero);
        }
        if u == one {
            return Some(one);
        }
        if l == u {
            return Some(l);
        }
        if let Some(r) = self.cache.lookup2(Operation::Squeeze, l, u) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let lvl = self.edge_level(l).min(self.edge_level(u));
        let index = self.invperm[lvl];
        let (le, lt) = self.cofactors_at(l, lvl);
        let (ue, ut) = self.cofactors_at(u, lvl);

        // If the variable can be dropped while the interval stays nonempty,
        // drop it: the result is strictly smaller.
        let lor = self.and_recur(le.not(), lt.not())?.not();
        self.ref_edge(lor);
        let uand = match self.and_recur(ue, ut) {
            Some(x) => x,
            None => {
                self.recursive_deref(lor);
                return None;
            }
        };
        self.ref_edge(uand);
        let r = if self.leq(lor, uand) {
            let r = self.squeeze_recur(lor, uand);
            match r {
                Some(r) => {
                    self.ref_edge(r);
                    self.recursive_deref(lor);
                    self.recursive_deref(uand);
                    self.deref(r);
                    r
                }
                None => {
                    self.recursive_deref(lor);
                    self.recursive_deref(uand);
                    return None;
                }
            }
        } else {
            self.recursive_deref(lor);
            self.recursive_deref(uand);
            let t = self.squeeze_recur(lt, ut)?;
            self.ref_edge(t);
            let e = match self.squeeze_recur(le, ue) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            let r = if t == e {
                t
            } else {
                match self.unique_inter(index, e, t) {
                    Some(r) => r,
                    None => {
                        self.recursive_deref(t);
                        self.recursive_deref(e);
                        return None;
                    }
                }
            };
            self.deref(t);
            self.deref(e);
            r
        };
        self.cache.insert2(Operation::Squeeze, l, u, r);
        Some(r)
    }

    /// An interpolant between `l` and `u`: implied by `l`, implying `u`,
    /// and depending only on variables common to both supports.
    pub fn interpolate(&mut self, l: Edge, u: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.interpolate_recur(l, u))
    }

    fn interpolate_recur(&mut self, l: Edge, u: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if l == zero {
            return Some(zero);
        }
        if u == one {
            return Some(one);
        }
        if l == u {
            return Some(l);
        }
        if let Some(r) = self.cache.lookup2(Operation::Interpolate, l, u) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let llvl = self.edge_level(l);
        let ulvl = self.edge_level(u);
        let r = if llvl < ulvl {
            // The variable occurs only in the lower bound: widen it away.
            let (le, lt) = self.edge_cofactors(l);
            let lor = self.and_recur(le.not(), lt.not())?.not();
            self.ref_edge(lor);
            match self.interpolate_recur(lor, u) {
                Some(r) => {
                    self.ref_edge(r);
                    self.recursive_deref(lor);
                    self.deref(r);
                    r
                }
                None => {
                    self.recursive_deref(lor);
                    return None;
                }
            }
        } else if ulvl < llvl {
            // The variable occurs only in the upper bound: tighten it away.
            let (ue, ut) = self.edge_cofactors(u);
            let uand = self.and_recur(ue, ut)?;
            self.ref_edge(uand);
            match self.interpolate_recur(l, uand) {
                Some(r) => {
                    self.ref_edge(r);
                    self.recursive_deref(uand);
                    self.deref(r);
                    r
                }
                None => {
                    self.recursive_deref(uand);
                    return None;
                }
            }
        } else {
            let index = self.invperm[llvl];
            let (le, lt) = self.edge_cofactors(l);
            let (ue, ut) = self.edge_cofactors(u);
            let t = self.interpolate_recur(lt, ut)?;
            self.ref_edge(t);
            let e = match self.interpolate_recur(le, ue) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            let r = if t == e {
                t
            } else {
                match self.unique_inter(index, e, t) {
                    Some(r) => r,
                    None => {
                        self.recursive_deref(t);
                        self.recursive_deref(e);
                        return None;
                    }
                }
            };
            self.deref(t);
            self.deref(e);
            r
        };
        self.cache.insert2(Operation::Interpolate, l, u, r);
        Some(r)
    }

    /// Compaction against a care set: minimizes `f` freely outside `c` while
    /// agreeing with it inside, by squeezing the interval `[f∧c, f∨¬c]`.
    pub fn li_compaction(&mut self, f: Edge, c: Edge) -> Option<Edge> {
        let l = self.and(f, c)?;
        self.ref_edge(l);
        let u = match self.or(f, c.not()) {
            Some(u) => u,
            None => {
                self.recursive_deref(l);
                return None;
            }
        };
        self.ref_edge(u);
        let r = self.squeeze(l, u);
        if let Some(r) = r {
            self.ref_edge(r);
            self.recursive_deref(l);
            self.recursive_deref(u);
            self.deref(r);
        } else {
            self.recursive_deref(l);
            self.recursive_deref(u);
        }
        r
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

    /// result agrees with f wherever c holds: (r ⊕ f) ∧ c == 0.
    fn agrees_on_care_set(dd: &mut DdManager, r: Edge, f: Edge, c: Edge) -> bool {
        let diff = dd.xor(r, f).unwrap();
        dd.ref_edge(diff);
        let clash = dd.and(diff, c).unwrap();
        dd.recursive_deref(diff);
        clash == dd.logic_zero()
    }

    #[test]
    fn constrain_agrees_on_care_set() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[2]).unwrap();
        dd.ref_edge(f);
        let c = dd.or(v[0], v[3]).unwrap();
        dd.ref_edge(c);
        let r = dd.constrain(f, c).unwrap();
        dd.ref_edge(r);
        assert!(agrees_on_care_set(&mut dd, r, f, c));
        for e in [f, c, r] {
            dd.recursive_deref(e);
        }
    }

    #[test]
    fn restrict_agrees_and_keeps_support() {
        let (mut dd, v) = setup();
        let f = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(f);
        // c depends on x3, which f does not.
        let c = dd.and(v[0], v[3]).unwrap();
        dd.ref_edge(c);
        let r = dd.restrict(f, c).unwrap();
        dd.ref_edge(r);
        assert!(agrees_on_care_set(&mut dd, r, f, c));
        assert!(!dd.support_indices(r).contains(&3));
        for e in [f, c, r] {
            dd.recursive_deref(e);
        }
    }

    #[test]
    fn constrain_identities() {
        let (mut dd, v) = setup();
        let f = dd.or(v[1], v[2]).unwrap();
        dd.ref_edge(f);
        let one = dd.one();
        assert_eq!(dd.constrain(f, one).unwrap(), f);
        assert_eq!(dd.constrain(f, f).unwrap(), one);
        assert_eq!(dd.constrain(f, f.not()).unwrap(), one.not());
        dd.recursive_deref(f);
    }

    #[test]
    fn minimize_never_grows() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[2]).unwrap();
        dd.ref_edge(f);
        let c = dd.and(v[0], v[2]).unwrap();
        dd.ref_edge(c);
        let m = dd.minimize(f, c).unwrap();
        dd.ref_edge(m);
        assert!(dd.dag_size(m) <= dd.dag_size(f));
        assert!(agrees_on_care_set(&mut dd, m, f, c));
        for e in [f, c, m] {
            dd.recursive_deref(e);
        }
    }

    #[test]
    fn squeeze_stays_in_interval() {
        let (mut dd, v) = setup();
        let l = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(l);
        let u = dd.or(v[0], v[2]).unwrap();
        dd.ref_edge(u);
        assert!(dd.leq(l, u));
        let s = dd.squeeze(l, u).unwrap();
        dd.ref_edge(s);
        assert!(dd.leq(l, s));
        assert!(dd.leq(s, u));
        assert!(dd.dag_size(s) <= dd.dag_size(l).max(dd.dag_size(u)));
        for e in [l, u, s] {
            dd.recursive_deref(e);
        }
    }

    #[test]
    fn interpolate_common_support() {
        let (mut dd, v) = setup();
        // l = x0 & x1, u = x1 + x2: only x1 is common.
        let l = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(l);
        let u = dd.or(v[1], v[2]).unwrap();
        dd.ref_edge(u);
        assert!(dd.leq(l, u));
        let i = dd.interpolate(l, u).unwrap();
        dd.ref_edge(i);
        assert!(dd.leq(l, i));
        assert!(dd.leq(i, u));
        assert_eq!(dd.support_indices(i), vec![1]);
        for e in [l, u, i] {
            dd.recursive_deref(e);
        }
    }

    #[test]
    fn li_compaction_agrees_inside_care_set() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[3]).unwrap();
        dd.ref_edge(f);
        let c = dd.or(v[0], v[1]).unwrap();
        dd.ref_edge(c);
        let r = dd.li_compaction(f, c).unwrap();
        dd.ref_edge(r);
        assert!(agrees_on_care_set(&mut dd, r, f, c));
        for e in [f, c, r] {
            dd.recursive_deref(e);
        }
    }
}
