use common::prelude::*;

use crate::edge::Edge;
use crate::manager::{DdManager, ErrorCode};

/// Don't-care entry in a cube vector.
pub const DONT_CARE: u8 = 2;

/// Iterates the cubes of a diagram: vectors over `{0, 1, 2}` indexed by
/// variable index, with the terminal value of the path. The manager is
/// borrowed shared for the generator's lifetime, so operations that could
/// create nodes or reorder are ruled out while it is open.
pub struct CubeGen<'a> {
    dd: &'a DdManager,
    stack: Vec<(Edge, u8)>,
    cube: Vec<u8>,
    root_value: Option<f64>,
    done: bool,
}

impl<'a> CubeGen<'a> {
    pub(crate) fn new(dd: &'a DdManager, f: Edge) -> Self {
        let n = dd.read_size();
        let mut gen = Self {
            dd,
            stack: Vec::new(),
            cube: vec![DONT_CARE; n],
            root_value: None,
            done: false,
        };
        if dd.is_constant(f.regular()) {
            gen.root_value = terminal_value(dd, f);
            gen.done = gen.root_value.is_none();
        } else {
            gen.stack.push((f, 0));
        }
        gen
    }

    /// True once every cube has been produced.
    pub fn at_end(&self) -> bool {
        self.done
    }
}

fn terminal_value(dd: &DdManager, e: Edge) -> Option<f64> {
    if e == dd.logic_zero() {
        return None;
    }
    if e == dd.one() {
        return Some(1.0);
    }
    let v = dd.const_value(e.regular());
    if v == 0.0 {
        None
    } else {
        Some(v)
    }
}

impl<'a> Iterator for CubeGen<'a> {
    type Item = (Vec<u8>, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.root_value.take() {
            self.done = true;
            return Some((self.cube.clone(), v));
        }
        while let Some(&(e, state)) = self.stack.last() {
            let index = self.dd.edge_index(e).expect("internal node on the path");
            if state == 2 {
                self.cube[index] = DONT_CARE;
                self.stack.pop();
                continue;
            }
            self.stack.last_mut().expect("nonempty").1 += 1;
            self.cube[index] = state;
            let (lo, hi) = self.dd.edge_cofactors(e);
            let child = if state == 0 { lo } else { hi };
            if self.dd.is_constant(child.regular()) {
                if let Some(v) = terminal_value(self.dd, child) {
                    return Some((self.cube.clone(), v));
                }
            } else {
                self.stack.push((child, 0));
            }
        }
        self.done = true;
        None
    }
}

/// Iterates the prime implicants of a function given by a lower and upper
/// bound (equal bounds for a completely specified function). Computing a
/// prime creates nodes, so the generator borrows the manager exclusively.
pub struct PrimeGen<'a> {
    dd: &'a mut DdManager,
    q: Edge,
    u: Edge,
    done: bool,
}

impl<'a> PrimeGen<'a> {
    pub(crate) fn new(dd: &'a mut DdManager, l: Edge, u: Edge) -> Self {
        let valid = dd.leq(l, u);
        if !valid {
            dd.record_error(ErrorCode::InvalidArg);
        }
        dd.ref_edge(l);
        dd.ref_edge(u);
        let done = !valid || l == dd.logic_zero();
        Self {
            dd,
            q: l,
            u,
            done,
        }
    }

    pub fn at_end(&self) -> bool {
        self.done
    }

    /// Drops literals while the cube still implies the upper bound.
    fn expand(&mut self, mut lits: Vec<(usize, bool)>) -> Option<Vec<(usize, bool)>> {
        let mut i = 0;
        while i < lits.len() {
            let mut shorter = lits.clone();
            shorter.remove(i);
            let cand = self.dd.compute_cube(&shorter)?;
            self.dd.ref_edge(cand);
            let implies = self.dd.leq(cand, self.u);
            self.dd.recursive_deref(cand);
            if implies {
                lits = shorter;
            } else {
                i += 1;
            }
        }
        Some(lits)
    }
}

impl<'a> Iterator for PrimeGen<'a> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let seed = {
            let mut cubes = CubeGen::new(self.dd, self.q);
            cubes.next()
        };
        let (cube, _) = match seed {
            Some(c) => c,
            None => {
                self.done = true;
                return None;
            }
        };
        let lits: Vec<(usize, bool)> = cube
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != DONT_CARE)
            .map(|(i, &v)| (i, v == 1))
            .collect();
        let prime_lits = match self.expand(lits) {
            Some(l) => l,
            None => {
                self.done = true;
                return None;
            }
        };
        let prime = match self.dd.compute_cube(&prime_lits) {
            Some(p) => p,
            None => {
                self.done = true;
                return None;
            }
        };
        self.dd.ref_edge(prime);
        // Remove the covered part and move on.
        let next_q = match self.dd.and(self.q, prime.not()) {
            Some(nq) => nq,
            None => {
                self.dd.recursive_deref(prime);
                self.done = true;
                return None;
            }
        };
        self.dd.ref_edge(next_q);
        self.dd.recursive_deref(self.q);
        self.q = next_q;
        self.dd.recursive_deref(prime);
        if self.q == self.dd.logic_zero() {
            self.done = true;
        }
        let mut out = vec![DONT_CARE; self.dd.read_size()];
        for (i, positive) in prime_lits {
            out[i] = positive as u8;
        }
        Some(out)
    }
}

impl<'a> Drop for PrimeGen<'a> {
    fn drop(&mut self) {
        self.dd.recursive_deref(self.q);
        let u = self.u;
        self.dd.recursive_deref(u);
    }
}

/// Enumerates every node of a diagram once, in a deterministic depth-first
/// order, from a snapshot taken at creation.
pub struct NodeGen<'a> {
    dd: &'a DdManager,
    order: Vec<NodeId>,
    at: usize,
}

impl<'a> NodeGen<'a> {
    pub(crate) fn new(dd: &'a DdManager, f: Edge) -> Self {
        let mut order = Vec::new();
        let mut visited: DdHashSet<NodeId> = DdHashSet::default();
        let mut stack = vec![f.regular()];
        while let Some(e) = stack.pop() {
            if !visited.insert(e.node()) {
                continue;
            }
            order.push(e.node());
            if !dd.is_constant(e) {
                let n = dd.nt(e.node());
                stack.push(n.low().regular());
                stack.push(n.high().regular());
            }
        }
        Self { dd, order, at: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.at >= self.order.len()
    }
}

impl<'a> Iterator for NodeGen<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.order.get(self.at).copied()?;
        self.at += 1;
        debug_assert!(self.dd.get_node(id).is_some());
        Some(id)
    }
}

impl DdManager {
    /// Cube generator over `f`. See [`CubeGen`].
    pub fn cubes(&self, f: Edge) -> CubeGen<'_> {
        CubeGen::new(self, f)
    }

    /// Prime generator for the interval `[l, u]`. See [`PrimeGen`].
    pub fn primes(&mut self, l: Edge, u: Edge) -> PrimeGen<'_> {
        PrimeGen::new(self, l, u)
    }

    /// Node generator over the diagram rooted at `f`. See [`NodeGen`].
    pub fn dag_nodes(&self, f: Edge) -> NodeGen<'_> {
        NodeGen::new(self, f)
    }
}
