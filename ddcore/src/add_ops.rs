use common::prelude::*;

use crate::cache::Operation;
use crate::edge::Edge;
use crate::manager::{DdManager, ErrorCode};

/// The pointwise operators of `add_apply`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AddOp {
    Plus,
    Minus,
    Times,
    Divide,
    Minimum,
    Maximum,
}

impl AddOp {
    fn tag(self) -> Operation {
        match self {
            AddOp::Plus => Operation::AddPlus,
            AddOp::Minus => Operation::AddMinus,
            AddOp::Times => Operation::AddTimes,
            AddOp::Divide => Operation::AddDivide,
            AddOp::Minimum => Operation::AddMinimum,
            AddOp::Maximum => Operation::AddMaximum,
        }
    }

    fn commutative(self) -> bool {
        matches!(
            self,
            AddOp::Plus | AddOp::Times | AddOp::Minimum | AddOp::Maximum
        )
    }

    fn eval(self, a: f64, b: f64) -> f64 {
        match self {
            AddOp::Plus => a + b,
            AddOp::Minus => a - b,
            AddOp::Times => a * b,
            AddOp::Divide => a / b,
            AddOp::Minimum => a.min(b),
            AddOp::Maximum => a.max(b),
        }
    }
}

impl DdManager {
    /// Applies `op` pointwise to two ADDs. ADD edges carry no complement
    /// flags; all terminals are explicit.
    pub fn add_apply(&mut self, op: AddOp, f: Edge, g: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.add_apply_recur(op, f, g))
    }

    fn add_apply_recur(&mut self, op: AddOp, f: Edge, g: Edge) -> Option<Edge> {
        debug_assert!(!f.is_complement() && !g.is_complement());
        let zero = self.zero();
        let one = self.one();

        // Operator-specific shortcuts that need no recursion.
        match op {
            AddOp::Plus => {
                if f == zero {
                    return Some(g);
                }
                if g == zero {
                    return Some(f);
                }
            }
            AddOp::Minus => {
                if g == zero {
                    return Some(f);
                }
                if f == g {
                    return Some(zero);
                }
            }
            AddOp::Times => {
                if f == zero || g == zero {
                    return Some(zero);
                }
                if f == one {
                    return Some(g);
                }
                if g == one {
                    return Some(f);
                }
            }
            AddOp::Divide => {
                if g == one {
                    return Some(f);
                }
            }
            AddOp::Minimum => {
                if f == g || g == self.plus_infinity() {
                    return Some(f);
                }
                if f == self.plus_infinity() {
                    return Some(g);
                }
            }
            AddOp::Maximum => {
                if f == g || g == self.minus_infinity() {
                    return Some(f);
                }
                if f == self.minus_infinity() {
                    return Some(g);
                }
            }
        }
        if self.is_constant(f) && self.is_constant(g) {
            let v = op.eval(self.const_value(f), self.const_value(g));
            return Some(self.unique_const(v));
        }
        let (f, g) = if op.commutative() && f.bits() > g.bits() {
            (g, f)
        } else {
            (f, g)
        };
        if let Some(r) = self.cache.lookup2(op.tag(), f, g) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let lvl = self.edge_level(f).min(self.edge_level(g));
        let index = self.invperm[lvl];
        let (fe, ft) = self.cofactors_at(f, lvl);
        let (ge, gt) = self.cofactors_at(g, lvl);

        let t = self.add_apply_recur(op, ft, gt)?;
        self.ref_edge(t);
        let e = match self.add_apply_recur(op, fe, ge) {
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
        self.cache.insert2(op.tag(), f, g, r);
        Some(r)
    }

    /// ADD if-then-else: `f` must be a 0-1 ADD.
    pub fn add_ite(&mut self, f: Edge, g: Edge, h: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.add_ite_recur(f, g, h))
    }

    fn add_ite_recur(&mut self, f: Edge, g: Edge, h: Edge) -> Option<Edge> {
        let zero = self.zero();
        let one = self.one();

        if f == one {
            return Some(g);
        }
        if f == zero {
            return Some(h);
        }
        if g == h {
            return Some(g);
        }
        if let Some(r) = self.cache.lookup(Operation::AddIte, f, g, h) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let lvl = self
            .edge_level(f)
            .min(self.edge_level(g))
            .min(self.edge_level(h));
        let index = self.invperm[lvl];
        let (fe, ft) = self.cofactors_at(f, lvl);
        let (ge, gt) = self.cofactors_at(g, lvl);
        let (he, ht) = self.cofactors_at(h, lvl);

        let t = self.add_ite_recur(ft, gt, ht)?;
        self.ref_edge(t);
        let e = match self.add_ite_recur(fe, ge, he) {
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
        self.cache.insert(Operation::AddIte, f, g, h, r);
        Some(r)
    }

    /// Pointwise arithmetic negation.
    pub fn add_negate(&mut self, f: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.add_unary_recur(Operation::AddNegate, f))
    }

    /// Pointwise complement of a 0-1 view: zero terminals become one, all
    /// others become zero.
    pub fn add_cmpl(&mut self, f: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.add_unary_recur(Operation::AddCmpl, f))
    }

    fn add_unary_recur(&mut self, op: Operation, f: Edge) -> Option<Edge> {
        if self.is_constant(f) {
            let v = self.const_value(f);
            let r = match op {
                Operation::AddNegate => -v,
                Operation::AddCmpl => {
                    if v == 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                }
                _ => unreachable!(),
            };
            return Some(self.unique_const(r));
        }
        if let Some(r) = self.cache.lookup1(op, f) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }
        let n = self.nt(f.node());
        let (low, high, index) = (n.low(), n.high(), n.index());
        let t = self.add_unary_recur(op, high)?;
        self.ref_edge(t);
        let e = match self.add_unary_recur(op, low) {
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
        self.cache.insert1(op, f, r);
        Some(r)
    }

    fn check_add_cube(&mut self, cube: Edge) -> bool {
        let one = self.one();
        let zero = self.zero();
        let mut c = cube;
        loop {
            if c == one {
                return true;
            }
            if c.is_complement() || self.is_constant(c) {
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

    /// Sums `f` over the variables of `cube` (an ADD cube of positive
    /// literals).
    pub fn add_exist_abstract(&mut self, f: Edge, cube: Edge) -> Option<Edge> {
        if !self.check_add_cube(cube) {
            return None;
        }
        self.with_retry(|dd| dd.add_abstract_recur(AddOp::Plus, f, cube))
    }

    /// Multiplies `f` over the variables of `cube`.
    pub fn add_univ_abstract(&mut self, f: Edge, cube: Edge) -> Option<Edge> {
        if !self.check_add_cube(cube) {
            return None;
        }
        self.with_retry(|dd| dd.add_abstract_recur(AddOp::Times, f, cube))
    }

    fn add_abstract_recur(&mut self, op: AddOp, f: Edge, cube: Edge) -> Option<Edge> {
        let one = self.one();
        if cube == one {
            return Some(f);
        }
        let tag = match op {
            AddOp::Plus => Operation::AddExistAbstract,
            _ => Operation::AddUnivAbstract,
        };
        let flvl = self.edge_level(f);
        if self.edge_level(cube) < flvl {
            // f is constant with respect to this variable: both branches
            // contribute equally.
            let rest = self.nt(cube.node()).high();
            let doubled = self.add_apply_recur(op, f, f)?;
            self.ref_edge(doubled);
            let r = self.add_abstract_recur(op, doubled, rest);
            if let Some(r) = r {
                self.ref_edge(r);
                self.recursive_deref(doubled);
                self.deref(r);
            } else {
                self.recursive_deref(doubled);
            }
            return r;
        }
        if let Some(r) = self.cache.lookup2(tag, f, cube) {
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
            let t = self.add_abstract_recur(op, ft, rest)?;
            self.ref_edge(t);
            let e = match self.add_abstract_recur(op, fe, rest) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            let r = match self.add_apply_recur(op, t, e) {
                Some(r) => r,
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
            let t = self.add_abstract_recur(op, ft, cube)?;
            self.ref_edge(t);
            let e = match self.add_abstract_recur(op, fe, cube) {
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
        self.cache.insert2(tag, f, cube, r);
        Some(r)
    }

    /// Converts a BDD to the corresponding 0-1 ADD.
    pub fn bdd_to_add(&mut self, f: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.bdd_to_add_recur(f))
    }

    fn bdd_to_add_recur(&mut self, f: Edge) -> Option<Edge> {
        let one = self.one();
        if f == one {
            return Some(one);
        }
        if f == one.not() {
            return Some(self.zero());
        }
        if let Some(r) = self.cache.lookup1(Operation::BddToAdd, f) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }
        let index = self.edge_index(f).unwrap();
        let (fe, ft) = self.edge_cofactors(f);
        let t = self.bdd_to_add_recur(ft)?;
        self.ref_edge(t);
        let e = match self.bdd_to_add_recur(fe) {
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
        self.cache.insert1(Operation::BddToAdd, f, r);
        Some(r)
    }

    /// BDD of the assignments where the ADD is nonzero.
    pub fn add_bdd_pattern(&mut self, f: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.add_to_bdd_recur(Operation::AddBddPattern, f, 0.0))
    }

    /// BDD of the assignments where the ADD value is `>= value`.
    pub fn add_bdd_threshold(&mut self, f: Edge, value: f64) -> Option<Edge> {
        self.with_retry(|dd| dd.add_to_bdd_recur(Operation::AddBddThreshold, f, value))
    }

    /// BDD of the assignments where the ADD value is strictly `> value`.
    pub fn add_bdd_strict_threshold(&mut self, f: Edge, value: f64) -> Option<Edge> {
        self.with_retry(|dd| dd.add_to_bdd_recur(Operation::AddBddStrictThreshold, f, value))
    }

    fn add_to_bdd_recur(&mut self, op: Operation, f: Edge, value: f64) -> Option<Edge> {
        let one = self.one();
        if self.is_constant(f) {
            let v = self.const_value(f);
            let hit = match op {
                Operation::AddBddPattern => v != 0.0,
                Operation::AddBddThreshold => v >= value,
                Operation::AddBddStrictThreshold => v > value,
                _ => unreachable!(),
            };
            return Some(if hit { one } else { one.not() });
        }
        // The threshold participates in the key as its terminal.
        let vkey = self.unique_const(value);
        if let Some(r) = self.cache.lookup2(op, f, vkey) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }
        let n = self.nt(f.node());
        let (low, high, index) = (n.low(), n.high(), n.index());
        let t = self.add_to_bdd_recur(op, high, value)?;
        self.ref_edge(t);
        let e = match self.add_to_bdd_recur(op, low, value) {
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
        self.cache.insert2(op, f, vkey, r);
        Some(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (DdManager, Edge, Edge) {
        let mut dd = DdManager::init(4, 0, 256, 1024, 0);
        let x0 = dd.add_ith_var(0).unwrap();
        dd.ref_edge(x0);
        let x1 = dd.add_ith_var(1).unwrap();
        dd.ref_edge(x1);
        (dd, x0, x1)
    }

    #[test]
    fn plus_commutes() {
        let (mut dd, x0, x1) = setup();
        let a = dd.add_apply(AddOp::Plus, x0, x1).unwrap();
        let b = dd.add_apply(AddOp::Plus, x1, x0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn constant_arithmetic() {
        let (mut dd, _, _) = setup();
        let two = dd.add_const(2.0);
        let three = dd.add_const(3.0);
        let five = dd.add_apply(AddOp::Plus, two, three).unwrap();
        assert_eq!(dd.const_value(five), 5.0);
        let six = dd.add_apply(AddOp::Times, two, three).unwrap();
        assert_eq!(dd.const_value(six), 6.0);
        let m = dd.add_apply(AddOp::Minimum, two, three).unwrap();
        assert_eq!(m, two);
    }

    #[test]
    fn times_by_zero_and_one() {
        let (mut dd, x0, _) = setup();
        let zero = dd.zero();
        let one = dd.one();
        assert_eq!(dd.add_apply(AddOp::Times, x0, zero).unwrap(), zero);
        assert_eq!(dd.add_apply(AddOp::Times, x0, one).unwrap(), x0);
    }

    #[test]
    fn add_edges_are_regular() {
        let (mut dd, x0, x1) = setup();
        let s = dd.add_apply(AddOp::Plus, x0, x1).unwrap();
        dd.ref_edge(s);
        assert!(!s.is_complement());
        let n = dd.add_negate(s).unwrap();
        assert!(!n.is_complement());
        dd.recursive_deref(s);
    }

    #[test]
    fn negate_twice_is_identity() {
        let (mut dd, x0, x1) = setup();
        let s = dd.add_apply(AddOp::Plus, x0, x1).unwrap();
        dd.ref_edge(s);
        let n = dd.add_negate(s).unwrap();
        dd.ref_edge(n);
        let nn = dd.add_negate(n).unwrap();
        assert_eq!(nn, s);
        dd.recursive_deref(s);
        dd.recursive_deref(n);
    }

    #[test]
    fn exist_abstract_sums() {
        let (mut dd, x0, x1) = setup();
        // sum over x0 of (x0 + x1) = 1 + 2*x1
        let s = dd.add_apply(AddOp::Plus, x0, x1).unwrap();
        dd.ref_edge(s);
        let summed = dd.add_exist_abstract(s, x0).unwrap();
        dd.ref_edge(summed);
        let one = dd.one();
        let two = dd.add_const(2.0);
        let x1_scaled = dd.add_apply(AddOp::Times, two, x1).unwrap();
        dd.ref_edge(x1_scaled);
        let expected = dd.add_apply(AddOp::Plus, one, x1_scaled).unwrap();
        assert_eq!(summed, expected);
        dd.recursive_deref(s);
        dd.recursive_deref(summed);
        dd.recursive_deref(x1_scaled);
    }

    #[test]
    fn bdd_add_round_trip() {
        let (mut dd, _, _) = setup();
        let b0 = dd.ith_var(0).unwrap();
        let b1 = dd.ith_var(1).unwrap();
        let f = dd.and(b0, b1).unwrap();
        dd.ref_edge(f);
        let a = dd.bdd_to_add(f).unwrap();
        dd.ref_edge(a);
        let back = dd.add_bdd_pattern(a).unwrap();
        assert_eq!(back, f);
        dd.recursive_deref(f);
        dd.recursive_deref(a);
    }

    #[test]
    fn threshold_splits_values() {
        let (mut dd, x0, x1) = setup();
        let s = dd.add_apply(AddOp::Plus, x0, x1).unwrap();
        dd.ref_edge(s);
        // s >= 2 exactly when both variables are 1.
        let ge2 = dd.add_bdd_threshold(s, 2.0).unwrap();
        dd.ref_edge(ge2);
        let b0 = dd.ith_var(0).unwrap();
        let b1 = dd.ith_var(1).unwrap();
        let both = dd.and(b0, b1).unwrap();
        assert_eq!(ge2, both);
        // s > 2 never holds.
        let gt2 = dd.add_bdd_strict_threshold(s, 2.0).unwrap();
        assert_eq!(gt2, dd.logic_zero());
        dd.recursive_deref(s);
        dd.recursive_deref(ge2);
    }

    #[test]
    fn background_is_tunable() {
        let (mut dd, _, _) = setup();
        assert_eq!(dd.background(), dd.zero());
        let m1 = dd.add_const(-1.0);
        dd.set_background(m1);
        assert_eq!(dd.background(), m1);
    }
}
