use crate::cache::Operation;
use crate::edge::Edge;
use crate::manager::{DdManager, ErrorCode};

impl DdManager {
    /// Checks that `cube` is a product of positive literals; records
    /// `InvalidArg` otherwise. Abstraction cubes must not negate variables.
    fn check_positive_cube(&mut self, cube: Edge) -> bool {
        let one = self.one();
        let zero = one.not();
        let mut c = cube;
        loop {
            if c == one {
                return true;
            }
            if c.is_complement() || self.is_constant(c.regular()) {
                self.record_error(ErrorCode::InvalidArg);
                return false;
            }
            let n = self.nt(c.node());
            if n.low() != zero {
                self.record_error(ErrorCode::InvalidArg);
                return false;
            }
            c = n.high();
        }
    }

    /// Existentially quantifies the variables of `cube` out of `f`.
    pub fn exist_abstract(&mut self, f: Edge, cube: Edge) -> Option<Edge> {
        if !self.check_positive_cube(cube) {
            return None;
        }
        self.with_retry(|dd| dd.exist_abstract_recur(f, cube))
    }

    pub fn exist_abstract_limit(&mut self, f: Edge, cube: Edge, limit: usize) -> Option<Edge> {
        if !self.check_positive_cube(cube) {
            return None;
        }
        self.with_limit(limit, |dd| dd.exist_abstract_recur(f, cube))
    }

    /// Universally quantifies the variables of `cube` out of `f` via the
    /// duality with existential abstraction.
    pub fn univ_abstract(&mut self, f: Edge, cube: Edge) -> Option<Edge> {
        if !self.check_positive_cube(cube) {
            return None;
        }
        self.with_retry(|dd| dd.exist_abstract_recur(f.not(), cube).map(Edge::not))
    }

    pub(crate) fn exist_abstract_recur(&mut self, f: Edge, cube: Edge) -> Option<Edge> {
        let one = self.one();

        if cube == one || self.is_constant(f.regular()) {
            return Some(f);
        }
        // Skip cube variables above the top of f: they do not occur in f.
        let flvl = self.edge_level(f);
        let mut cube = cube;
        while self.edge_level(cube) < flvl {
            cube = self.nt(cube.node()).high();
            if cube == one {
                return Some(f);
            }
        }
        if let Some(r) = self.cache.lookup2(Operation::ExistAbstract, f, cube) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let index = self.invperm[flvl];
        let (fe, ft) = self.edge_cofactors(f);
        let r = if self.edge_level(cube) == flvl {
            let rest = self.nt(cube.node()).high();
            let t = self.exist_abstract_recur(ft, rest)?;
            if t == one {
                self.cache.insert2(Operation::ExistAbstract, f, cube, one);
                return Some(one);
            }
            self.ref_edge(t);
            let e = match self.exist_abstract_recur(fe, rest) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            let r = match self.and_recur(t.not(), e.not()) {
                Some(r) => r.not(),
                None => {
                    self.recursive_deref(t);
                    self.recursive_deref(e);
                    return None;
                }
            };
            self.ref_edge(r);
            self.recursive_deref(t);
            self.recursive_deref(e);
            self.deref(r);
            r
        } else {
            let t = self.exist_abstract_recur(ft, cube)?;
            self.ref_edge(t);
            let e = match self.exist_abstract_recur(fe, cube) {
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
        self.cache.insert2(Operation::ExistAbstract, f, cube, r);
        Some(r)
    }

    /// `∃ cube. f ∧ g` in one pass, without building the conjunction.
    pub fn and_abstract(&mut self, f: Edge, g: Edge, cube: Edge) -> Option<Edge> {
        if !self.check_positive_cube(cube) {
            return None;
        }
        self.with_retry(|dd| dd.and_abstract_recur(f, g, cube))
    }

    /// `and_abstract` that gives up with `TooManyNodes` once the live node
    /// count grows past `limit`.
    pub fn and_abstract_limit(
        &mut self,
        f: Edge,
        g: Edge,
        cube: Edge,
        limit: usize,
    ) -> Option<Edge> {
        if !self.check_positive_cube(cube) {
            return None;
        }
        self.with_limit(limit, |dd| dd.and_abstract_recur(f, g, cube))
    }

    fn and_abstract_recur(&mut self, f: Edge, g: Edge, cube: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if f == zero || g == zero || f == g.not() {
            return Some(zero);
        }
        if f == one && g == one {
            return Some(one);
        }
        if cube == one {
            return self.and_recur(f, g);
        }
        if f == one || f == g {
            return self.exist_abstract_recur(g, cube);
        }
        if g == one {
            return self.exist_abstract_recur(f, cube);
        }
        let (f, g) = if f.regular().bits() > g.regular().bits() {
            (g, f)
        } else {
            (f, g)
        };

        let lvl = self.edge_level(f).min(self.edge_level(g));
        let mut cube = cube;
        while self.edge_level(cube) < lvl {
            cube = self.nt(cube.node()).high();
            if cube == one {
                return self.and_recur(f, g);
            }
        }
        if let Some(r) = self.cache.lookup(Operation::AndAbstract, f, g, cube) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let index = self.invperm[lvl];
        let (fe, ft) = self.cofactors_at(f, lvl);
        let (ge, gt) = self.cofactors_at(g, lvl);

        let r = if self.edge_level(cube) == lvl {
            let rest = self.nt(cube.node()).high();
            let t = self.and_abstract_recur(ft, gt, rest)?;
            if t == one {
                self.cache.insert(Operation::AndAbstract, f, g, cube, one);
                return Some(one);
            }
            self.ref_edge(t);
            let e = match self.and_abstract_recur(fe, ge, rest) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            let r = match self.and_recur(t.not(), e.not()) {
                Some(r) => r.not(),
                None => {
                    self.recursive_deref(t);
                    self.recursive_deref(e);
                    return None;
                }
            };
            self.ref_edge(r);
            self.recursive_deref(t);
            self.recursive_deref(e);
            self.deref(r);
            r
        } else {
            let t = self.and_abstract_recur(ft, gt, cube)?;
            self.ref_edge(t);
            let e = match self.and_abstract_recur(fe, ge, cube) {
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
        self.cache.insert(Operation::AndAbstract, f, g, cube, r);
        Some(r)
    }

    /// `∃ cube. f ⊕ g` in one pass.
    pub fn xor_exist_abstract(&mut self, f: Edge, g: Edge, cube: Edge) -> Option<Edge> {
        if !self.check_positive_cube(cube) {
            return None;
        }
        self.with_retry(|dd| dd.xor_exist_abstract_recur(f, g, cube))
    }

    fn xor_exist_abstract_recur(&mut self, f: Edge, g: Edge, cube: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if f == g {
            return Some(zero);
        }
        if f == g.not() {
            return Some(one);
        }
        if cube == one {
            return self.xor_recur(f, g);
        }
        if f == zero {
            return self.exist_abstract_recur(g, cube);
        }
        if g == zero {
            return self.exist_abstract_recur(f, cube);
        }
        if f == one {
            return self.exist_abstract_recur(g.not(), cube);
        }
        if g == one {
            return self.exist_abstract_recur(f.not(), cube);
        }
        let (f, g) = if f.bits() > g.bits() { (g, f) } else { (f, g) };

        let lvl = self.edge_level(f).min(self.edge_level(g));
        let mut cube = cube;
        while self.edge_level(cube) < lvl {
            cube = self.nt(cube.node()).high();
            if cube == one {
                return self.xor_recur(f, g);
            }
        }
        if let Some(r) = self.cache.lookup(Operation::XorExistAbstract, f, g, cube) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let index = self.invperm[lvl];
        let (fe, ft) = self.cofactors_at(f, lvl);
        let (ge, gt) = self.cofactors_at(g, lvl);

        let r = if self.edge_level(cube) == lvl {
            let rest = self.nt(cube.node()).high();
            let t = self.xor_exist_abstract_recur(ft, gt, rest)?;
            if t == one {
                self.cache
                    .insert(Operation::XorExistAbstract, f, g, cube, one);
                return Some(one);
            }
            self.ref_edge(t);
            let e = match self.xor_exist_abstract_recur(fe, ge, rest) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            let r = match self.and_recur(t.not(), e.not()) {
                Some(r) => r.not(),
                None => {
                    self.recursive_deref(t);
                    self.recursive_deref(e);
                    return None;
                }
            };
            self.ref_edge(r);
            self.recursive_deref(t);
            self.recursive_deref(e);
            self.deref(r);
            r
        } else {
            let t = self.xor_exist_abstract_recur(ft, gt, cube)?;
            self.ref_edge(t);
            let e = match self.xor_exist_abstract_recur(fe, ge, cube) {
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
        self.cache.insert(Operation::XorExistAbstract, f, g, cube, r);
        Some(r)
    }

    /// The Boolean difference of `f` with respect to variable `index`:
    /// `f|x=1 ⊕ f|x=0`.
    pub fn boolean_diff(&mut self, f: Edge, index: usize) -> Option<Edge> {
        if index >= self.read_size() {
            self.record_error(ErrorCode::InvalidArg);
            return None;
        }
        let var = self.vars[index];
        // The difference is insensitive to the polarity of f.
        self.with_retry(|dd| dd.boolean_diff_recur(f.regular(), var))
    }

    fn boolean_diff_recur(&mut self, f: Edge, var: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();
        let vlvl = self.edge_level(var);
        if self.edge_level(f) > vlvl {
            // f does not depend on the variable.
            return Some(zero);
        }
        if let Some(r) = self.cache.lookup2(Operation::BooleanDiff, f, var) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let flvl = self.edge_level(f);
        let (fe, ft) = self.edge_cofactors(f);
        let r = if flvl == vlvl {
            self.xor_recur(ft, fe)?
        } else {
            let index = self.invperm[flvl];
            let t = self.boolean_diff_recur(ft.regular(), var)?;
            self.ref_edge(t);
            let e = match self.boolean_diff_recur(fe.regular(), var) {
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
        self.cache.insert2(Operation::BooleanDiff, f, var, r);
        Some(r)
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
    fn exist_abstract_drops_variable() {
        let (mut dd, v) = setup();
        let f = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(f);
        let r = dd.exist_abstract(f, v[0]).unwrap();
        assert_eq!(r, v[1]);
        dd.recursive_deref(f);
    }

    #[test]
    fn negative_literal_cube_is_invalid() {
        let (mut dd, v) = setup();
        let f = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(f);
        assert!(dd.exist_abstract(f, v[0].not()).is_none());
        assert_eq!(dd.read_error_code(), ErrorCode::InvalidArg);
        dd.clear_error_code();
        dd.recursive_deref(f);
    }

    #[test]
    fn univ_exist_duality() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[2]).unwrap();
        dd.ref_edge(f);
        let cube = dd.and(v[1], v[2]).unwrap();
        dd.ref_edge(cube);
        let univ = dd.univ_abstract(f, cube).unwrap();
        dd.ref_edge(univ);
        let exist = dd.exist_abstract(f.not(), cube).unwrap();
        assert_eq!(univ, exist.not());
        dd.recursive_deref(univ);
        dd.recursive_deref(cube);
        dd.recursive_deref(f);
    }

    #[test]
    fn and_abstract_matches_two_steps() {
        let (mut dd, v) = setup();
        let f = dd.or(v[0], v[2]).unwrap();
        dd.ref_edge(f);
        let g = dd.or(v[0].not(), v[3]).unwrap();
        dd.ref_edge(g);
        let direct = dd.and_abstract(f, g, v[0]).unwrap();
        dd.ref_edge(direct);
        let conj = dd.and(f, g).unwrap();
        dd.ref_edge(conj);
        let two_step = dd.exist_abstract(conj, v[0]).unwrap();
        assert_eq!(direct, two_step);
        dd.recursive_deref(conj);
        dd.recursive_deref(direct);
        dd.recursive_deref(f);
        dd.recursive_deref(g);
    }

    #[test]
    fn exist_of_and_superset_law() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[3]).unwrap();
        dd.ref_edge(f);
        let g = dd.or(v[0], v[2]).unwrap();
        dd.ref_edge(g);
        let conj = dd.and(f, g).unwrap();
        dd.ref_edge(conj);
        let lhs = dd.exist_abstract(conj, v[0]).unwrap();
        dd.ref_edge(lhs);
        let ef = dd.exist_abstract(f, v[0]).unwrap();
        dd.ref_edge(ef);
        let eg = dd.exist_abstract(g, v[0]).unwrap();
        dd.ref_edge(eg);
        let rhs = dd.and(ef, eg).unwrap();
        dd.ref_edge(rhs);
        assert!(dd.leq(lhs, rhs));
        for e in [f, g, conj, lhs, ef, eg, rhs] {
            dd.recursive_deref(e);
        }
    }

    #[test]
    fn xor_exist_abstract_matches_two_steps() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[2]).unwrap();
        dd.ref_edge(f);
        let g = dd.or(v[0], v[3]).unwrap();
        dd.ref_edge(g);
        let direct = dd.xor_exist_abstract(f, g, v[0]).unwrap();
        dd.ref_edge(direct);
        let x = dd.xor(f, g).unwrap();
        dd.ref_edge(x);
        let two_step = dd.exist_abstract(x, v[0]).unwrap();
        assert_eq!(direct, two_step);
        dd.recursive_deref(x);
        dd.recursive_deref(direct);
        dd.recursive_deref(f);
        dd.recursive_deref(g);
    }

    #[test]
    fn boolean_diff_basics() {
        let (mut dd, v) = setup();
        let f = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(f);
        // d(x0*x1)/dx0 = x1
        let d = dd.boolean_diff(f, 0).unwrap();
        assert_eq!(d, v[1]);
        // f does not depend on x3.
        let d3 = dd.boolean_diff(f, 3).unwrap();
        assert_eq!(d3, dd.logic_zero());
        dd.recursive_deref(f);
    }
}
