use common::prelude::*;

use crate::edge::Edge;
use crate::node::Node;

/// Operator tags distinguishing cache entries with identical operand shapes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Operation {
    And,
    Xor,
    Ite,
    IteConstant,
    Leq,
    Intersect,
    ExistAbstract,
    AndAbstract,
    XorExistAbstract,
    BooleanDiff,
    Compose,
    Constrain,
    Restrict,
    Squeeze,
    Interpolate,
    ClippingAnd,
    ClippingAndUp,
    AddPlus,
    AddMinus,
    AddTimes,
    AddDivide,
    AddMinimum,
    AddMaximum,
    AddIte,
    AddNegate,
    AddCmpl,
    AddExistAbstract,
    AddUnivAbstract,
    BddToAdd,
    AddBddPattern,
    AddBddThreshold,
    AddBddStrictThreshold,
}

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    op: Operation,
    f: Edge,
    g: Edge,
    h: Edge,
    result: Edge,
}

/// The computed table: fixed-capacity, direct-mapped, lossy on collision.
///
/// One slot per hash value; an insert displaces whatever was there. The
/// table is doubled (and wiped, which is sound because it is a cache) when
/// the running hit ratio since the last resize exceeds `min_hit` and the
/// doubled size stays within the hard cap.
pub(crate) struct Cache {
    slots: Vec<Option<CacheEntry>>,
    mask: usize,
    lookups: u64,
    hits: u64,
    lookups_since_resize: u64,
    hits_since_resize: u64,
    min_hit: f64,
    max_size: usize,
    max_size_hard: usize,
}

const CACHE_P1: usize = 12582917;
const CACHE_P2: usize = 4256249;
const CACHE_P3: usize = 741457;

/// Lookups to accumulate before the resize policy is consulted.
const RESIZE_PROBE: u64 = 1 << 14;

impl Cache {
    pub(crate) fn new(slots: usize, max_size_hard: usize) -> Self {
        let n = slots.next_power_of_two().max(2);
        Self {
            slots: (0..n).map(|_| None).collect(),
            mask: n - 1,
            lookups: 0,
            hits: 0,
            lookups_since_resize: 0,
            hits_since_resize: 0,
            min_hit: 0.3,
            max_size: max_size_hard.min(n << 10),
            max_size_hard,
        }
    }

    #[inline]
    fn hash(&self, op: Operation, f: Edge, g: Edge, h: Edge) -> usize {
        let t = op as usize;
        let k = f
            .bits()
            .wrapping_mul(CACHE_P1)
            .wrapping_add(g.bits())
            .wrapping_mul(CACHE_P2)
            .wrapping_add(h.bits())
            .wrapping_mul(CACHE_P3)
            .wrapping_add(t);
        (k ^ (k >> 17)) & self.mask
    }

    /// Probes the table. Returns the cached result or `None` on miss.
    pub(crate) fn lookup(&mut self, op: Operation, f: Edge, g: Edge, h: Edge) -> Option<Edge> {
        self.lookups = self.lookups.saturating_add(1);
        self.lookups_since_resize += 1;
        let slot = self.slots[self.hash(op, f, g, h)];
        match slot {
            Some(e) if e.op == op && e.f == f && e.g == g && e.h == h => {
                self.hits = self.hits.saturating_add(1);
                self.hits_since_resize += 1;
                Some(e.result)
            }
            _ => None,
        }
    }

    pub(crate) fn lookup2(&mut self, op: Operation, f: Edge, g: Edge) -> Option<Edge> {
        self.lookup(op, f, g, Edge::INVALID)
    }

    pub(crate) fn lookup1(&mut self, op: Operation, f: Edge) -> Option<Edge> {
        self.lookup(op, f, Edge::INVALID, Edge::INVALID)
    }

    /// Unconditional insert; displaces any colliding entry.
    pub(crate) fn insert(&mut self, op: Operation, f: Edge, g: Edge, h: Edge, result: Edge) {
        let at = self.hash(op, f, g, h);
        self.slots[at] = Some(CacheEntry {
            op,
            f,
            g,
            h,
            result,
        });
        if self.lookups_since_resize >= RESIZE_PROBE {
            self.maybe_resize();
        }
    }

    pub(crate) fn insert2(&mut self, op: Operation, f: Edge, g: Edge, result: Edge) {
        self.insert(op, f, g, Edge::INVALID, result);
    }

    pub(crate) fn insert1(&mut self, op: Operation, f: Edge, result: Edge) {
        self.insert(op, f, Edge::INVALID, Edge::INVALID, result);
    }

    fn maybe_resize(&mut self) {
        let ratio = self.hits_since_resize as f64 / self.lookups_since_resize as f64;
        self.lookups_since_resize = 0;
        self.hits_since_resize = 0;
        let doubled = self.slots.len() * 2;
        if ratio >= self.min_hit && doubled <= self.max_size && doubled <= self.max_size_hard {
            // A wipe is correct: the table is lossy by contract.
            self.slots = (0..doubled).map(|_| None).collect();
            self.mask = doubled - 1;
        }
    }

    /// Removes every entry whose operand or result references a dead node.
    /// Run by the garbage collector before nodes are unlinked.
    pub(crate) fn purge_dead(&mut self, nodes: &[Node]) {
        let dead = |e: Edge| {
            if e == Edge::INVALID {
                return false;
            }
            match &nodes[e.node()] {
                Node::NonTerminal(n) => n.ref_count() == 0,
                Node::Constant(_) => false,
                Node::Free(_) => true,
            }
        };
        for slot in self.slots.iter_mut() {
            if let Some(e) = slot {
                if dead(e.f) || dead(e.g) || dead(e.h) || dead(e.result) {
                    *slot = None;
                }
            }
        }
    }

    /// Wipes every entry. Used when reordering invalidates level-sensitive
    /// results wholesale.
    pub(crate) fn wipe(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn lookups(&self) -> u64 {
        self.lookups
    }

    #[inline]
    pub(crate) fn hits(&self) -> u64 {
        self.hits
    }

    #[inline]
    pub(crate) fn min_hit(&self) -> f64 {
        self.min_hit
    }

    #[inline]
    pub(crate) fn set_min_hit(&mut self, ratio: f64) {
        self.min_hit = ratio;
    }

    #[inline]
    pub(crate) fn max_size(&self) -> usize {
        self.max_size
    }

    #[inline]
    pub(crate) fn set_max_size(&mut self, size: usize) {
        self.max_size = size;
    }

    #[inline]
    pub(crate) fn max_size_hard(&self) -> usize {
        self.max_size_hard
    }

    #[inline]
    pub(crate) fn set_max_size_hard(&mut self, size: usize) {
        self.max_size_hard = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_insert() {
        let mut c = Cache::new(16, 1 << 20);
        let f = Edge::new(3, false);
        let g = Edge::new(4, true);
        let r = Edge::new(9, false);
        assert_eq!(c.lookup2(Operation::And, f, g), None);
        c.insert2(Operation::And, f, g, r);
        assert_eq!(c.lookup2(Operation::And, f, g), Some(r));
        // A different tag with the same operands misses.
        assert_eq!(c.lookup2(Operation::Xor, f, g), None);
    }

    #[test]
    fn collision_displaces() {
        let mut c = Cache::new(2, 1 << 20);
        // With two slots, enough inserts force a displacement.
        for i in 0..8 {
            c.insert2(
                Operation::And,
                Edge::new(i, false),
                Edge::new(i + 1, false),
                Edge::new(i, false),
            );
        }
        let live: usize = c.slots.iter().filter(|s| s.is_some()).count();
        assert!(live <= 2);
    }

    #[test]
    fn wipe_clears() {
        let mut c = Cache::new(8, 64);
        c.insert2(
            Operation::And,
            Edge::new(1, false),
            Edge::new(2, false),
            Edge::new(3, false),
        );
        c.wipe();
        assert_eq!(c.lookup2(Operation::And, Edge::new(1, false), Edge::new(2, false)), None);
    }
}
