use common::prelude::*;

use crate::cache::Operation;
use crate::edge::Edge;
use crate::manager::{DdManager, ErrorCode};

impl DdManager {
    /// Substitutes `g` for variable `v` in `f`.
    pub fn compose(&mut self, f: Edge, g: Edge, v: VarIndex) -> Option<Edge> {
        if v >= self.read_size() {
            self.record_error(ErrorCode::InvalidArg);
            return None;
        }
        let proj = self.vars[v];
        self.with_retry(|dd| dd.compose_recur(f, g, proj))
    }

    fn compose_recur(&mut self, f: Edge, g: Edge, proj: Edge) -> Option<Edge> {
        let vlvl = self.edge_level(proj);
        if self.edge_level(f) > vlvl {
            // The substituted variable cannot occur in f.
            return Some(f);
        }
        if let Some(r) = self.cache.lookup(Operation::Compose, f, g, proj) {
            self.revive_cached(r);
            return Some(r);
        }
        if !self.op_check() {
            return None;
        }

        let flvl = self.edge_level(f);
        let (fe, ft) = self.edge_cofactors(f);
        let r = if flvl == vlvl {
            self.ite_recur(g, ft, fe)?
        } else {
            let t = self.compose_recur(ft, g, proj)?;
            self.ref_edge(t);
            let e = match self.compose_recur(fe, g, proj) {
                Some(e) => e,
                None => {
                    self.recursive_deref(t);
                    return None;
                }
            };
            self.ref_edge(e);
            // The children may now top above f's variable, so the result is
            // recombined with ite rather than a direct table insertion.
            let top = self.vars[self.invperm[flvl]];
            let r = match self.ite_recur(top, t, e) {
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
        };
        self.cache.insert(Operation::Compose, f, g, proj, r);
        Some(r)
    }

    /// Simultaneously substitutes `vector[i]` for variable `i` in `f`.
    /// `vector` must supply one replacement per variable.
    pub fn vector_compose(&mut self, f: Edge, vector: &[Edge]) -> Option<Edge> {
        if vector.len() != self.read_size() {
            self.record_error(ErrorCode::InvalidArg);
            return None;
        }
        self.with_retry(|dd| {
            let mut memo: DdHashMap<Edge, Edge> = DdHashMap::default();
            let res = dd.vector_compose_recur(f, vector, &mut memo);
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

    fn vector_compose_recur(
        &mut self,
        f: Edge,
        vector: &[Edge],
        memo: &mut DdHashMap<Edge, Edge>,
    ) -> Option<Edge> {
        let complement = f.is_complement();
        let f = f.regular();
        if self.is_constant(f) {
            return Some(f.not_if(complement));
        }
        if let Some(&r) = memo.get(&f) {
            return Some(r.not_if(complement));
        }
        if !self.op_check() {
            return None;
        }
        let n = self.nt(f.node());
        let (low, high, index) = (n.low(), n.high(), n.index());
        let t = self.vector_compose_recur(high, vector, memo)?;
        self.ref_edge(t);
        let e = match self.vector_compose_recur(low, vector, memo) {
            Some(e) => e,
            None => {
                self.recursive_deref(t);
                return None;
            }
        };
        self.ref_edge(e);
        let r = match self.ite_recur(vector[index], t, e) {
            Some(r) => r,
            None => {
                self.recursive_deref(t);
                self.recursive_deref(e);
                return None;
            }
        };
        // The memo keeps its entries claimed until the walk finishes.
        self.ref_edge(r);
        self.recursive_deref(t);
        self.recursive_deref(e);
        memo.insert(f, r);
        Some(r.not_if(complement))
    }

    /// Relabels every variable `i` of `f` as `permutation[i]`.
    pub fn permute(&mut self, f: Edge, permutation: &[VarIndex]) -> Option<Edge> {
        if permutation.len() != self.read_size()
            || permutation.iter().any(|&i| i >= self.read_size())
        {
            self.record_error(ErrorCode::InvalidArg);
            return None;
        }
        let vector: Vec<Edge> = permutation.iter().map(|&i| self.vars[i]).collect();
        self.vector_compose(f, &vector)
    }

    /// Exchanges the roles of `xs[i]` and `ys[i]` in `f`.
    pub fn swap_variables(&mut self, f: Edge, xs: &[VarIndex], ys: &[VarIndex]) -> Option<Edge> {
        if xs.len() != ys.len() {
            self.record_error(ErrorCode::InvalidArg);
            return None;
        }
        let mut permutation: Vec<VarIndex> = (0..self.read_size()).collect();
        for (&x, &y) in xs.iter().zip(ys) {
            if x >= permutation.len() || y >= permutation.len() {
                self.record_error(ErrorCode::InvalidArg);
                return None;
            }
            permutation[x] = y;
            permutation[y] = x;
        }
        self.permute(f, &permutation)
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
    fn compose_with_projection_is_identity() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[2]).unwrap();
        dd.ref_edge(f);
        let r = dd.compose(f, v[1], 1).unwrap();
        assert_eq!(r, f);
        dd.recursive_deref(f);
    }

    #[test]
    fn compose_substitutes() {
        let (mut dd, v) = setup();
        let f = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(f);
        let g = dd.or(v[2], v[3]).unwrap();
        dd.ref_edge(g);
        let composed = dd.compose(f, g, 1).unwrap();
        dd.ref_edge(composed);
        let expected = dd.and(v[0], g).unwrap();
        assert_eq!(composed, expected);
        dd.recursive_deref(f);
        dd.recursive_deref(g);
        dd.recursive_deref(composed);
    }

    #[test]
    fn compose_through_complement() {
        let (mut dd, v) = setup();
        let f = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(f);
        let r = dd.compose(f.not(), v[2], 1).unwrap();
        dd.ref_edge(r);
        let direct = dd.and(v[0], v[2]).unwrap();
        assert_eq!(r, direct.not());
        dd.recursive_deref(f);
        dd.recursive_deref(r);
    }

    #[test]
    fn identity_permutation() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[3]).unwrap();
        dd.ref_edge(f);
        let id: Vec<usize> = (0..4).collect();
        assert_eq!(dd.permute(f, &id).unwrap(), f);
        dd.recursive_deref(f);
    }

    #[test]
    fn swap_variables_involution() {
        let (mut dd, v) = setup();
        let f = dd.ite(v[0], v[1], v[2]).unwrap();
        dd.ref_edge(f);
        let swapped = dd.swap_variables(f, &[0, 1], &[2, 3]).unwrap();
        dd.ref_edge(swapped);
        let back = dd.swap_variables(swapped, &[0, 1], &[2, 3]).unwrap();
        assert_eq!(back, f);
        dd.recursive_deref(f);
        dd.recursive_deref(swapped);
    }

    #[test]
    fn vector_compose_wrong_arity_is_invalid() {
        let (mut dd, v) = setup();
        let f = dd.and(v[0], v[1]).unwrap();
        dd.ref_edge(f);
        assert!(dd.vector_compose(f, &[v[0]]).is_none());
        assert_eq!(dd.read_error_code(), ErrorCode::InvalidArg);
        dd.clear_error_code();
        dd.recursive_deref(f);
    }
}
