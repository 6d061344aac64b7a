use crate::cache::Operation;
use crate::edge::Edge;
use crate::manager::{DdManager, ErrorCode};
use crate::node::Node;

/// Outcome of `ite_constant`: either a constant edge or the verdict that the
/// result depends on some variable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IteConst {
    Constant(Edge),
    NonConstant,
}

impl DdManager {
    /// Resurrects a cached result that may have died since it was stored.
    #[inline]
    pub(crate) fn revive_cached(&mut self, r: Edge) {
        let dead = matches!(&self.nodes[r.node()], Node::NonTerminal(n) if n.ref_count() == 0);
        if dead {
            self.reclaim(r.node());
        }
    }

    /// Runs a recursive operation to completion, retrying whenever an
    /// automatic reordering aborted it mid-flight.
    #[inline]
    pub(crate) fn with_retry<F>(&mut self, mut body: F) -> Option<Edge>
    where
        F: FnMut(&mut Self) -> Option<Edge>,
    {
        self.flush_pending_derefs();
        loop {
            if !self.boundary_check() {
                return None;
            }
            self.reordered = false;
            let res = body(self);
            if res.is_some() || !self.reordered {
                return res;
            }
        }
    }

    /// Like `with_retry`, with a ceiling on live nodes for the duration.
    pub(crate) fn with_limit<F>(&mut self, limit: usize, mut body: F) -> Option<Edge>
    where
        F: FnMut(&mut Self) -> Option<Edge>,
    {
        self.flush_pending_derefs();
        loop {
            if !self.boundary_check() {
                return None;
            }
            self.reordered = false;
            let saved = self.op_limit;
            self.op_limit = Some((self.keys - self.dead).saturating_add(limit));
            let res = body(self);
            self.op_limit = saved;
            if res.is_some() || !self.reordered {
                return res;
            }
        }
    }

    // --- conjunction -------------------------------------------------------

    pub fn and(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.and_recur(f, g))
    }

    /// `and` that gives up with `TooManyNodes` once the intermediate live
    /// node count grows by more than `limit`.
    pub fn and_limit(&mut self, f: Edge, g: Edge, limit: usize) -> Option<Edge> {
        self.with_limit(limit, |dd| dd.and_recur(f, g))
    }

    pub fn or(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.and_recur(f.not(), g.not()).map(Edge::not))
    }

    pub fn or_limit(&mut self, f: Edge, g: Edge, limit: usize) -> Option<Edge> {
        self.with_limit(limit, |dd| dd.and_recur(f.not(), g.not()).map(Edge::not))
    }

    pub fn nand(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.and_recur(f, g).map(Edge::not))
    }

    pub fn nor(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.and_recur(f.not(), g.not()))
    }

    pub fn xor(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.xor_recur(f, g))
    }

    pub fn xnor(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.xor_recur(f, g).map(Edge::not))
    }

    pub(crate) fn and_recur(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if f == one {
            return Some(g);
        }
        if g == one || f == g {
            return Some(f);
        }
        if f == g.not() || f == zero || g == zero {
            return Some(zero);
        }
        // Conjunction commutes: order the operands so both phrasings share
        // one cache entry and one result.
        let (f, g) = if f.regular().bits() > g.regular().bits() {
            (g, f)
        } else {
            (f, g)
        };
        if let Some(r) = self.cache.lookup2(Operation::And, f, g) {
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

        let t = self.and_recur(ft, gt)?;
        self.ref_edge(t);
        let e = match self.and_recur(fe, ge) {
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
        self.cache.insert2(Operation::And, f, g, r);
        Some(r)
    }

    pub(crate) fn xor_recur(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if f == g {
            return Some(zero);
        }
        if f == g.not() {
            return Some(one);
        }
        if f == zero {
            return Some(g);
        }
        if g == zero {
            return Some(f);
        }
        if f == one {
            return Some(g.not());
        }
        if g == one {
            return Some(f.not());
        }
        // Exclusive or commutes and absorbs complements pairwise; order on
        // the raw edges and push any complement onto the second operand.
        let (f, g) = if f.bits() > g.bits() { (g, f) } else { (f, g) };
        let (f, g) = if f.is_complement() {
            (f.not(), g.not())
        } else {
            (f, g)
        };
        if let Some(r) = self.cache.lookup2(Operation::Xor, f, g) {
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

        let t = self.xor_recur(ft, gt)?;
        self.ref_edge(t);
        let e = match self.xor_recur(fe, ge) {
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
        self.cache.insert2(Operation::Xor, f, g, r);
        Some(r)
    }

    // --- if-then-else ------------------------------------------------------

    pub fn ite(&mut self, f: Edge, g: Edge, h: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.ite_recur(f, g, h))
    }

    pub fn ite_limit(&mut self, f: Edge, g: Edge, h: Edge, limit: usize) -> Option<Edge> {
        self.with_limit(limit, |dd| dd.ite_recur(f, g, h))
    }

    pub(crate) fn ite_recur(&mut self, f: Edge, g: Edge, h: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        // Terminal cases and two-operand specializations.
        if f == one {
            return Some(g);
        }
        if f == zero {
            return Some(h);
        }
        if g == h {
            return Some(g);
        }
        if g == one || f == g {
            if h == zero {
                return Some(f);
            }
            return self.and_recur(f.not(), h.not()).map(Edge::not);
        }
        if g == zero || f == g.not() {
            if h == one {
                return Some(f.not());
            }
            return self.and_recur(f.not(), h);
        }
        if h == zero || f == h {
            return self.and_recur(f, g);
        }
        if h == one || f == h.not() {
            return self.and_recur(f, g.not()).map(Edge::not);
        }
        if g == h.not() {
            return self.xor_recur(f, h);
        }

        // Canonical form: regular predicate, regular then-operand.
        let (f, g, h) = if f.is_complement() {
            (f.not(), h, g)
        } else {
            (f, g, h)
        };
        let complement = g.is_complement();
        let (g, h) = if complement { (g.not(), h.not()) } else { (g, h) };

        if let Some(r) = self.cache.lookup(Operation::Ite, f, g, h) {
            self.revive_cached(r);
            return Some(r.not_if(complement));
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

        let t = self.ite_recur(ft, gt, ht)?;
        self.ref_edge(t);
        let e = match self.ite_recur(fe, ge, he) {
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
        self.cache.insert(Operation::Ite, f, g, h, r);
        Some(r.not_if(complement))
    }

    /// Decides `ite(f, g, h)` without building nodes: returns the constant
    /// it evaluates to, or `NonConstant`.
    pub fn ite_constant(&mut self, f: Edge, g: Edge, h: Edge) -> IteConst {
        let one = self.one();
        let zero = one.not();

        if f == one {
            return self.constant_verdict(g);
        }
        if f == zero {
            return self.constant_verdict(h);
        }
        if g == h {
            return self.constant_verdict(g);
        }
        if g == one || f == g {
            // f + h: constant only if it collapses to one.
            if h == one {
                return IteConst::Constant(one);
            }
        }
        if self.is_constant(g.regular()) && self.is_constant(h.regular()) && g != h {
            return IteConst::NonConstant;
        }

        // Canonical form as in `ite_recur` so both share cached verdicts.
        let (f, g, h) = if f.is_complement() {
            (f.not(), h, g)
        } else {
            (f, g, h)
        };
        let complement = g.is_complement();
        let (g, h) = if complement { (g.not(), h.not()) } else { (g, h) };

        if let Some(r) = self.cache.lookup(Operation::IteConstant, f, g, h) {
            if r == Edge::INVALID {
                return IteConst::NonConstant;
            }
            return IteConst::Constant(r.not_if(complement));
        }

        let lvl = self
            .edge_level(f)
            .min(self.edge_level(g))
            .min(self.edge_level(h));
        debug_assert_ne!(lvl, crate::manager::CONST_LEVEL);
        let (fe, ft) = self.cofactors_at(f, lvl);
        let (ge, gt) = self.cofactors_at(g, lvl);
        let (he, ht) = self.cofactors_at(h, lvl);

        let t = self.ite_constant(ft, gt, ht);
        let verdict = match t {
            IteConst::NonConstant => IteConst::NonConstant,
            IteConst::Constant(tv) => match self.ite_constant(fe, ge, he) {
                IteConst::Constant(ev) if ev == tv => IteConst::Constant(tv),
                _ => IteConst::NonConstant,
            },
        };
        let stored = match verdict {
            IteConst::NonConstant => Edge::INVALID,
            IteConst::Constant(c) => c,
        };
        self.cache.insert(Operation::IteConstant, f, g, h, stored);
        match verdict {
            IteConst::NonConstant => IteConst::NonConstant,
            IteConst::Constant(c) => IteConst::Constant(c.not_if(complement)),
        }
    }

    fn constant_verdict(&self, e: Edge) -> IteConst {
        if self.is_constant(e.regular()) {
            IteConst::Constant(e)
        } else {
            IteConst::NonConstant
        }
    }

    // --- implication test --------------------------------------------------

    /// True iff `f` implies `g`. Creates no nodes.
    pub fn leq(&mut self, f: Edge, g: Edge) -> bool {
        let one = self.one();
        let zero = one.not();

        if f == g || f == zero || g == one {
            return true;
        }
        if f.regular() == g.regular() {
            // f == not g, and neither is constant here.
            return false;
        }
        if f == one || g == zero {
            return false;
        }
        if let Some(r) = self.cache.lookup2(Operation::Leq, f, g) {
            return r == one;
        }

        let lvl = self.edge_level(f).min(self.edge_level(g));
        let (fe, ft) = self.cofactors_at(f, lvl);
        let (ge, gt) = self.cofactors_at(g, lvl);
        let res = self.leq(ft, gt) && self.leq(fe, ge);
        let stored = if res { one } else { zero };
        self.cache.insert2(Operation::Leq, f, g, stored);
        res
    }

    // --- intersection witness ----------------------------------------------

    /// A function implied by both `f` and `g`, nonzero whenever their
    /// conjunction is. Cheaper than the conjunction itself.
    pub fn intersect(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        self.with_retry(|dd| dd.intersect_recur(f, g))
    }

    fn intersect_recur(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if f == zero || g == zero || f == g.not() {
            return Some(zero);
        }
        if f == g || g == one {
            return Some(f);
        }
        if f == one {
            return Some(g);
        }
        let (f, g) = if f.regular().bits() > g.regular().bits() {
            (g, f)
        } else {
            (f, g)
        };
        if let Some(r) = self.cache.lookup2(Operation::Intersect, f, g) {
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

        let t = self.intersect_recur(ft, gt)?;
        self.ref_edge(t);
        let r = if t == zero {
            let e = match self.intersect_recur(fe, ge) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            let r = if e == zero {
                zero
            } else {
                match self.unique_inter(index, e, zero) {
                    Some(r) => r,
                    None => {
                        self.recursive_deref(t);
                        self.recursive_deref(e);
                        return None;
                    }
                }
            };
            self.deref(e);
            r
        } else {
            // A witness under v suffices; the else branch is not explored.
            match self.unique_inter(index, zero, t) {
                Some(r) => r,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            }
        };
        self.deref(t);
        self.cache.insert2(Operation::Intersect, f, g, r);
        Some(r)
    }

    // --- cube utilities ----------------------------------------------------

    /// Builds the cube of the given literals, `true` for a positive literal.
    pub fn compute_cube(&mut self, lits: &[(usize, bool)]) -> Option<Edge> {
        let mut cube = self.one();
        self.ref_edge(cube);
        // Build bottom-up so each step adds one level on top.
        let mut sorted: Vec<(usize, bool)> = lits.to_vec();
        sorted.sort_by_key(|&(i, _)| std::cmp::Reverse(self.perm[i]));
        for &(i, positive) in &sorted {
            let v = self.ith_var(i)?;
            let lit = v.not_if(!positive);
            let next = match self.and(cube, lit) {
                Some(n) => n,
                None => {
                    self.recursive_deref(cube);
                    return None;
                }
            };
            self.ref_edge(next);
            self.recursive_deref(cube);
            cube = next;
        }
        self.deref(cube);
        Some(cube)
    }

    /// Checks that `cube` is a product of literals; records `InvalidArg`
    /// otherwise.
    pub(crate) fn check_cube(&mut self, cube: Edge) -> bool {
        let one = self.one();
        let zero = one.not();
        let mut c = cube;
        loop {
            if c == one {
                return true;
            }
            if self.is_constant(c.regular()) {
                self.record_error(ErrorCode::InvalidArg);
                return false;
            }
            let (e, t) = self.edge_cofactors(c);
            if t == zero {
                c = e;
            } else if e == zero {
                c = t;
            } else {
                self.record_error(ErrorCode::InvalidArg);
                return false;
            }
        }
    }

    /// General cofactor of `f` with respect to the cube `g` (literals of
    /// either polarity). `InvalidArg` if `g` is not a cube.
    pub fn cofactor(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        if !self.check_cube(g) {
            return None;
        }
        self.with_retry(|dd| dd.cofactor_recur(f, g))
    }

    fn cofactor_recur(&mut self, f: Edge, g: Edge) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();
        if g == one || self.is_constant(f.regular()) {
            return Some(f);
        }
        let flvl = self.edge_level(f);
        let glvl = self.edge_level(g);
        let (ge, gt) = self.cofactors_at(g, glvl);
        if glvl < flvl {
            let rest = if gt == zero { ge } else { gt };
            return self.cofactor_recur(f, rest);
        }
        if flvl < glvl {
            let index = self.invperm[flvl];
            let (fe, ft) = self.edge_cofactors(f);
            let t = self.cofactor_recur(ft, g)?;
            self.ref_edge(t);
            let e = match self.cofactor_recur(fe, g) {
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
            return Some(r);
        }
        let (fe, ft) = self.edge_cofactors(f);
        if gt == zero {
            self.cofactor_recur(fe, ge)
        } else {
            self.cofactor_recur(ft, gt)
        }
    }

    // --- depth-bounded conjunction -----------------------------------------

    /// Conjunction clipped at recursion depth `max_depth`: deeper subproblems
    /// are replaced by an under-approximation (`direction` false) or an
    /// over-approximation (`direction` true).
    pub fn clipping_and(
        &mut self,
        f: Edge,
        g: Edge,
        max_depth: usize,
        direction: bool,
    ) -> Option<Edge> {
        self.with_retry(|dd| dd.clipping_and_recur(f, g, max_depth, direction))
    }

    fn clipping_and_recur(
        &mut self,
        f: Edge,
        g: Edge,
        distance: usize,
        direction: bool,
    ) -> Option<Edge> {
        let one = self.one();
        let zero = one.not();

        if f == one {
            return Some(g);
        }
        if g == one || f == g {
            return Some(f);
        }
        if f == g.not() || f == zero || g == zero {
            return Some(zero);
        }
        if distance == 0 {
            // Clip: one operand over-approximates the product; zero
            // under-approximates it.
            return Some(if direction { f } else { zero });
        }
        let (f, g) = if f.regular().bits() > g.regular().bits() {
            (g, f)
        } else {
            (f, g)
        };
        let tag = if direction {
            Operation::ClippingAndUp
        } else {
            Operation::ClippingAnd
        };
        if let Some(r) = self.cache.lookup2(tag, f, g) {
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

        let t = self.clipping_and_recur(ft, gt, distance - 1, direction)?;
        self.ref_edge(t);
        let e = match self.clipping_and_recur(fe, ge, distance - 1, direction) {
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
        self.cache.insert2(tag, f, g, r);
        Some(r)
    }
}
