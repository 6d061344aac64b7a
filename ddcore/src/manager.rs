use std::time::{Duration, Instant};

use common::prelude::*;

use crate::cache::Cache;
use crate::edge::Edge;
use crate::hooks::HookFn;
use crate::node::{Node, NonTerminalBdd};
use crate::reorder::ReorderMethod;
use crate::reorder_group::GroupTree;
use crate::unique::Subtable;

/// Level reported for terminals; strictly below every variable.
pub(crate) const CONST_LEVEL: Level = Level::MAX;

/// Initial size of subtables.
pub const UNIQUE_SLOTS: usize = 256;
/// Default size of the computed table.
pub const CACHE_SLOTS: usize = 262144;

/// Live-key count at which the first automatic reordering fires.
const FIRST_REORDER: usize = 4004;

/// Manager-local error state. Operations that fail return `None` and record
/// the deepest diagnosis here.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ErrorCode {
    #[default]
    NoError,
    /// Allocation returned null. Never produced here, since the global
    /// allocator aborts instead of returning null; kept for interface
    /// compatibility. Exhaustion the manager can observe surfaces as
    /// `MaxMemExceeded` or `TooManyNodes`.
    MemoryOut,
    TooManyNodes,
    MaxMemExceeded,
    TimeoutExpired,
    Termination,
    InvalidArg,
    InternalError,
}

/// Aggressiveness of symmetry/group detection during group sifting.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GroupCheck {
    NoCheck,
    Check,
    Check2,
    Check3,
    Check4,
    Check5,
    Check6,
    Check7,
    Check8,
    Check9,
}

pub struct DdManager {
    // Node store.
    pub(crate) nodes: Vec<Node>,
    pub(crate) free_list: Option<NodeId>,
    pub(crate) free_count: usize,

    // Unique table: one subtable per level.
    pub(crate) subtables: Vec<Subtable>,
    pub(crate) consts: DdHashMap<u64, NodeId>,
    pub(crate) const_list: Vec<NodeId>,
    pub(crate) initial_slots: usize,

    // Variable order.
    pub(crate) perm: Vec<Level>,
    pub(crate) invperm: Vec<VarIndex>,
    pub(crate) vars: Vec<Edge>,

    // Distinguished terminals.
    one: Edge,
    zero: Edge,
    plus_infinity: Edge,
    minus_infinity: Edge,
    background: Edge,

    pub(crate) cache: Cache,

    // Node statistics.
    pub(crate) keys: usize,
    pub(crate) dead: usize,
    pub(crate) peak_nodes: usize,
    pub(crate) garbage_collections: usize,

    // Garbage collection control.
    pub(crate) gc_enabled: bool,
    pub(crate) loose_up_to: usize,

    // Reordering control.
    pub(crate) autodyn: bool,
    pub(crate) autodyn_method: ReorderMethod,
    pub(crate) next_dyn: usize,
    pub(crate) reordered: bool,
    pub(crate) in_reorder: bool,
    pub(crate) reorderings: usize,
    pub(crate) max_reorderings: usize,
    pub(crate) reorder_cycle: usize,
    pub(crate) sift_max_var: usize,
    pub(crate) sift_max_swap: usize,
    pub(crate) max_growth: f64,
    pub(crate) max_growth_alt: f64,
    pub(crate) group_check: GroupCheck,
    pub(crate) groups: Option<GroupTree>,

    // Resource limits.
    pub(crate) max_memory: usize,
    pub(crate) max_live: usize,
    pub(crate) op_limit: Option<usize>,

    // Error state and callbacks.
    pub(crate) error: ErrorCode,
    pub(crate) termination_cb: Option<Box<dyn Fn() -> bool>>,
    pub(crate) timeout_handler: Option<Box<dyn FnMut()>>,
    pub(crate) oom_cb: Option<Box<dyn FnMut(usize)>>,
    pub(crate) deadline: Option<Instant>,
    pub(crate) timeout_fired: bool,
    pub(crate) op_count: usize,

    // Hook chains, indexed by `HookType as usize`.
    pub(crate) hooks: [Vec<(HookId, HookFn)>; 4],
    pub(crate) next_hook_id: HookId,

    // Dereferences deferred to the next safe point.
    pub(crate) pending_deref: Vec<Edge>,

    pub(crate) epsilon: f64,
    pub(crate) zdd_vars: usize,
    rand_state: i64,
}

impl DDForest for DdManager {
    type Node = Node;

    #[inline]
    fn get_node(&self, id: NodeId) -> Option<&Node> {
        match self.nodes.get(id) {
            Some(Node::Free(_)) | None => None,
            Some(n) => Some(n),
        }
    }

    fn level(&self, id: NodeId) -> Option<Level> {
        self.get_node(id).and_then(|node| match node {
            Node::NonTerminal(x) => Some(self.perm[x.index()]),
            Node::Constant(_) => None,
            Node::Free(_) => None,
        })
    }

    fn index(&self, id: NodeId) -> Option<VarIndex> {
        self.get_node(id).and_then(|node| node.index())
    }
}

impl Default for DdManager {
    fn default() -> Self {
        Self::init(0, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0)
    }
}

impl DdManager {
    /// Creates a manager with `bdd_vars` projection variables, `zdd_vars`
    /// reserved ZDD variables (recorded for interface compatibility; no ZDD
    /// operators live here), initial subtable and cache sizes, and a soft
    /// memory cap in bytes (0 picks a default).
    pub fn init(
        bdd_vars: usize,
        zdd_vars: usize,
        unique_slots: usize,
        cache_slots: usize,
        max_memory: usize,
    ) -> Self {
        let max_memory = if max_memory == 0 {
            usize::MAX
        } else {
            max_memory
        };
        let mut dd = Self {
            nodes: Vec::new(),
            free_list: None,
            free_count: 0,
            subtables: Vec::new(),
            consts: DdHashMap::default(),
            const_list: Vec::new(),
            initial_slots: unique_slots.next_power_of_two().max(2),
            perm: Vec::new(),
            invperm: Vec::new(),
            vars: Vec::new(),
            one: Edge::INVALID,
            zero: Edge::INVALID,
            plus_infinity: Edge::INVALID,
            minus_infinity: Edge::INVALID,
            background: Edge::INVALID,
            cache: Cache::new(cache_slots, 1 << 26),
            keys: 0,
            dead: 0,
            peak_nodes: 0,
            garbage_collections: 0,
            gc_enabled: true,
            loose_up_to: 1 << 20,
            autodyn: false,
            autodyn_method: ReorderMethod::Sift,
            next_dyn: FIRST_REORDER,
            reordered: false,
            in_reorder: false,
            reorderings: 0,
            max_reorderings: usize::MAX,
            reorder_cycle: 0,
            sift_max_var: 1000,
            sift_max_swap: 2_000_000,
            max_growth: 1.2,
            max_growth_alt: 2.0,
            group_check: GroupCheck::Check7,
            groups: None,
            max_memory,
            max_live: usize::MAX,
            op_limit: None,
            error: ErrorCode::NoError,
            termination_cb: None,
            timeout_handler: None,
            oom_cb: None,
            deadline: None,
            timeout_fired: false,
            op_count: 0,
            hooks: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            next_hook_id: 0,
            pending_deref: Vec::new(),
            epsilon: 1e-12,
            zdd_vars,
            rand_state: 1,
        };
        dd.one = dd.unique_const(1.0);
        dd.zero = dd.unique_const(0.0);
        dd.plus_infinity = dd.unique_const(f64::INFINITY);
        dd.minus_infinity = dd.unique_const(f64::NEG_INFINITY);
        dd.background = dd.zero;
        for _ in 0..bdd_vars {
            // Cannot fail: no limits are active this early.
            dd.new_var().expect("initial variable creation");
        }
        dd
    }

    // --- node access -------------------------------------------------------

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    #[inline]
    pub(crate) fn nt(&self, id: NodeId) -> &NonTerminalBdd {
        self.nodes[id].as_nonterminal()
    }

    #[inline]
    pub(crate) fn nt_mut(&mut self, id: NodeId) -> &mut NonTerminalBdd {
        self.nodes[id].as_nonterminal_mut()
    }

    /// True if the edge points to a constant terminal.
    #[inline]
    pub fn is_constant(&self, e: Edge) -> bool {
        self.nodes[e.node()].is_constant()
    }

    /// Value of the constant terminal an ADD edge points to.
    #[inline]
    pub fn const_value(&self, e: Edge) -> f64 {
        match &self.nodes[e.node()] {
            Node::Constant(c) => c.value(),
            _ => panic!("not a terminal"),
        }
    }

    /// Current level of the edge's top variable; terminals report a sentinel
    /// strictly below all variables.
    #[inline]
    pub(crate) fn edge_level(&self, e: Edge) -> Level {
        match &self.nodes[e.node()] {
            Node::NonTerminal(n) => self.perm[n.index()],
            _ => CONST_LEVEL,
        }
    }

    #[inline]
    pub(crate) fn edge_index(&self, e: Edge) -> Option<VarIndex> {
        self.nodes[e.node()].index()
    }

    /// Both cofactors of `e`, complement flag pushed through.
    #[inline]
    pub(crate) fn edge_cofactors(&self, e: Edge) -> (Edge, Edge) {
        let n = self.nt(e.node());
        let c = e.is_complement();
        (n.low().not_if(c), n.high().not_if(c))
    }

    /// Then and else children of `e` restricted at level `lvl`: splits when
    /// the edge tops at `lvl`, otherwise both cofactors equal `e`.
    #[inline]
    pub(crate) fn cofactors_at(&self, e: Edge, lvl: Level) -> (Edge, Edge) {
        if self.edge_level(e) == lvl {
            self.edge_cofactors(e)
        } else {
            (e, e)
        }
    }

    // --- distinguished terminals -------------------------------------------

    /// The constant ONE, Boolean true.
    #[inline]
    pub fn one(&self) -> Edge {
        self.one
    }

    /// Boolean false: the complement of ONE.
    #[inline]
    pub fn logic_zero(&self) -> Edge {
        self.one.not()
    }

    /// The arithmetic zero terminal.
    #[inline]
    pub fn zero(&self) -> Edge {
        self.zero
    }

    #[inline]
    pub fn plus_infinity(&self) -> Edge {
        self.plus_infinity
    }

    #[inline]
    pub fn minus_infinity(&self) -> Edge {
        self.minus_infinity
    }

    /// The background value for sparse-matrix semantics.
    #[inline]
    pub fn background(&self) -> Edge {
        self.background
    }

    pub fn set_background(&mut self, bck: Edge) {
        debug_assert!(self.is_constant(bck));
        self.background = bck;
    }

    // --- reference counting ------------------------------------------------

    /// Claims a reference on the pointed-to node. Every function returning a
    /// node increments no reference; callers that keep a result must claim
    /// it before invoking anything that may collect garbage.
    pub fn ref_edge(&mut self, e: Edge) {
        self.nodes[e.node()].incref();
    }

    /// Releases one reference without touching the children. Used to undo a
    /// protective claim on a node whose children are still claimed.
    pub fn deref(&mut self, e: Edge) {
        let id = e.node();
        if self.nodes[id].is_constant() {
            return;
        }
        self.nodes[id].decref();
    }

    /// Releases a reference; on death the node's claims on its children are
    /// released transitively. Dead nodes stay in the unique table until the
    /// next garbage collection and can be resurrected by lookup.
    pub fn recursive_deref(&mut self, e: Edge) {
        let id = e.node();
        if self.nodes[id].is_constant() {
            return;
        }
        if self.nodes[id].decref() == 0 {
            self.mark_dead(id);
            let (low, high) = {
                let n = self.nt(id);
                (n.low(), n.high())
            };
            self.recursive_deref(low);
            self.recursive_deref(high);
        }
    }

    /// `recursive_deref` with an explicit stack, for graphs deeper than the
    /// call stack allows.
    pub fn iter_deref(&mut self, e: Edge) {
        let mut stack = vec![e];
        while let Some(e) = stack.pop() {
            let id = e.node();
            if self.nodes[id].is_constant() {
                continue;
            }
            if self.nodes[id].decref() == 0 {
                self.mark_dead(id);
                let n = self.nt(id);
                stack.push(n.low());
                stack.push(n.high());
            }
        }
    }

    /// Defers the release to the next safe point (the entry of the next
    /// top-level operator). Convenient when building cube-like chains.
    pub fn delayed_deref(&mut self, e: Edge) {
        self.pending_deref.push(e);
    }

    pub(crate) fn flush_pending_derefs(&mut self) {
        while let Some(e) = self.pending_deref.pop() {
            self.iter_deref(e);
        }
    }

    #[inline]
    fn mark_dead(&mut self, id: NodeId) {
        self.dead += 1;
        let lvl = self.perm[self.nt(id).index()];
        self.subtables[lvl].dead += 1;
    }

    /// Resurrects a dead node found by hash-cons lookup or a cache hit,
    /// restoring its claims on its children.
    pub(crate) fn reclaim(&mut self, id: NodeId) {
        debug_assert!(self.nt(id).ref_count() == 0);
        self.dead -= 1;
        let lvl = self.perm[self.nt(id).index()];
        self.subtables[lvl].dead -= 1;
        let (low, high) = {
            let n = self.nt(id);
            (n.low(), n.high())
        };
        for child in [low, high] {
            let c = child.node();
            if !self.nodes[c].is_constant() {
                let was_dead = self.nt(c).ref_count() == 0;
                if was_dead {
                    self.reclaim(c);
                }
            }
            self.nodes[c].incref();
        }
    }

    /// Counts nodes that still carry references once a client claims to have
    /// released everything. Projection variables held by the manager and
    /// constants are exempt.
    pub fn check_zero_ref(&self) -> usize {
        let mut count = 0;
        for node in &self.nodes {
            if let Node::NonTerminal(n) = node {
                if n.ref_count() == 0 {
                    continue;
                }
                let proj = n.ref_count() == 1
                    && n.index() < self.vars.len()
                    && self.vars[n.index()].regular().node() == n.id();
                if !proj {
                    count += 1;
                }
            }
        }
        count
    }

    // --- error state -------------------------------------------------------

    /// Records an error unless a deeper frame already diagnosed one.
    pub(crate) fn record_error(&mut self, e: ErrorCode) {
        if self.error == ErrorCode::NoError {
            self.error = e;
        }
    }

    pub fn read_error_code(&self) -> ErrorCode {
        self.error
    }

    pub fn clear_error_code(&mut self) {
        self.error = ErrorCode::NoError;
    }

    // --- cancellation ------------------------------------------------------

    pub fn register_termination_callback(&mut self, cb: Box<dyn Fn() -> bool>) {
        self.termination_cb = Some(cb);
    }

    pub fn unregister_termination_callback(&mut self) {
        self.termination_cb = None;
    }

    pub fn register_timeout_handler(&mut self, handler: Box<dyn FnMut()>) {
        self.timeout_handler = Some(handler);
    }

    pub fn register_out_of_memory_callback(&mut self, cb: Box<dyn FnMut(usize)>) {
        self.oom_cb = Some(cb);
    }

    /// Sets a wall-clock deadline. The engine polls it at recursion
    /// boundaries; on expiry the current operation unwinds with
    /// `TimeoutExpired` and the timeout handler runs once.
    pub fn set_time_limit(&mut self, limit: Duration) {
        self.deadline = Some(Instant::now() + limit);
        self.timeout_fired = false;
    }

    pub fn unset_time_limit(&mut self) {
        self.deadline = None;
    }

    /// Periodic boundary check for termination and deadline. Cheap when it
    /// does not fire: only every 1024th call performs the real test.
    pub(crate) fn op_check(&mut self) -> bool {
        self.op_count = self.op_count.wrapping_add(1);
        if self.op_count & 0x3ff != 0 {
            return true;
        }
        self.boundary_check()
    }

    pub(crate) fn boundary_check(&mut self) -> bool {
        let terminated = match &self.termination_cb {
            Some(cb) => cb(),
            None => false,
        };
        if terminated {
            self.record_error(ErrorCode::Termination);
            return false;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                if !self.timeout_fired {
                    self.timeout_fired = true;
                    if let Some(mut handler) = self.timeout_handler.take() {
                        handler();
                        self.timeout_handler = Some(handler);
                    }
                }
                self.record_error(ErrorCode::TimeoutExpired);
                return false;
            }
        }
        true
    }

    // --- variables and order -----------------------------------------------

    /// Number of variables.
    pub fn read_size(&self) -> usize {
        self.vars.len()
    }

    /// Current level of variable `index`.
    pub fn read_perm(&self, index: VarIndex) -> Option<Level> {
        self.perm.get(index).copied()
    }

    /// Variable living at `level`.
    pub fn read_inv_perm(&self, level: Level) -> Option<VarIndex> {
        self.invperm.get(level).copied()
    }

    /// True iff `e` is a projection function.
    pub fn is_var(&self, e: Edge) -> bool {
        match self.edge_index(e) {
            Some(i) => self.vars.get(i) == Some(&e),
            None => false,
        }
    }

    // --- statistics --------------------------------------------------------

    /// Internal nodes in the unique table, dead ones included.
    pub fn read_keys(&self) -> usize {
        self.keys
    }

    pub fn read_dead(&self) -> usize {
        self.dead
    }

    /// Live nodes: internal keys minus dead, plus constants.
    pub fn read_node_count(&self) -> usize {
        self.keys - self.dead + self.const_list.len()
    }

    pub fn read_peak_node_count(&self) -> usize {
        self.peak_nodes
    }

    pub fn read_cache_hits(&self) -> u64 {
        self.cache.hits()
    }

    pub fn read_cache_look_ups(&self) -> u64 {
        self.cache.lookups()
    }

    pub fn read_cache_slots(&self) -> usize {
        self.cache.len()
    }

    pub fn read_reorderings(&self) -> usize {
        self.reorderings
    }

    pub fn read_garbage_collections(&self) -> usize {
        self.garbage_collections
    }

    pub fn read_zdd_size(&self) -> usize {
        self.zdd_vars
    }

    // --- tuning parameters -------------------------------------------------

    pub fn read_min_hit(&self) -> f64 {
        self.cache.min_hit()
    }

    pub fn set_min_hit(&mut self, ratio: f64) {
        self.cache.set_min_hit(ratio);
    }

    pub fn read_loose_up_to(&self) -> usize {
        self.loose_up_to
    }

    pub fn set_loose_up_to(&mut self, keys: usize) {
        self.loose_up_to = keys;
    }

    pub fn read_max_cache(&self) -> usize {
        self.cache.max_size()
    }

    pub fn set_max_cache(&mut self, size: usize) {
        self.cache.set_max_size(size);
    }

    pub fn read_max_cache_hard(&self) -> usize {
        self.cache.max_size_hard()
    }

    pub fn set_max_cache_hard(&mut self, size: usize) {
        self.cache.set_max_size_hard(size);
    }

    pub fn read_sift_max_var(&self) -> usize {
        self.sift_max_var
    }

    pub fn set_sift_max_var(&mut self, n: usize) {
        self.sift_max_var = n;
    }

    pub fn read_sift_max_swap(&self) -> usize {
        self.sift_max_swap
    }

    pub fn set_sift_max_swap(&mut self, n: usize) {
        self.sift_max_swap = n;
    }

    pub fn read_max_growth(&self) -> f64 {
        self.max_growth
    }

    pub fn set_max_growth(&mut self, g: f64) {
        self.max_growth = g;
    }

    pub fn read_max_growth_alternate(&self) -> f64 {
        self.max_growth_alt
    }

    pub fn set_max_growth_alternate(&mut self, g: f64) {
        self.max_growth_alt = g;
    }

    /// Every `cycle`-th reordering uses the alternate growth bound; 0
    /// disables the alternation.
    pub fn read_reordering_cycle(&self) -> usize {
        self.reorder_cycle
    }

    pub fn set_reordering_cycle(&mut self, cycle: usize) {
        self.reorder_cycle = cycle;
    }

    pub fn read_next_reordering(&self) -> usize {
        self.next_dyn
    }

    pub fn set_next_reordering(&mut self, next: usize) {
        self.next_dyn = next;
    }

    pub fn read_max_reorderings(&self) -> usize {
        self.max_reorderings
    }

    pub fn set_max_reorderings(&mut self, n: usize) {
        self.max_reorderings = n;
    }

    /// Tolerance for terminal-value equality in the ADD layer.
    pub fn read_epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, eps: f64) {
        self.epsilon = eps;
    }

    pub fn read_groupcheck(&self) -> GroupCheck {
        self.group_check
    }

    pub fn set_groupcheck(&mut self, gc: GroupCheck) {
        self.group_check = gc;
    }

    pub fn read_max_memory(&self) -> usize {
        self.max_memory
    }

    pub fn set_max_memory(&mut self, bytes: usize) {
        self.max_memory = if bytes == 0 { usize::MAX } else { bytes };
    }

    pub fn read_max_live(&self) -> usize {
        self.max_live
    }

    pub fn set_max_live(&mut self, n: usize) {
        self.max_live = n;
    }

    pub fn enable_garbage_collection(&mut self) {
        self.gc_enabled = true;
    }

    pub fn disable_garbage_collection(&mut self) {
        self.gc_enabled = false;
    }

    /// Approximate bytes in use by the node store and the tables.
    pub fn read_memory_in_use(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node>()
            + self
                .subtables
                .iter()
                .map(|s| s.buckets.len() * std::mem::size_of::<Option<NodeId>>())
                .sum::<usize>()
            + self.cache.len() * 48
    }

    // --- manager-owned RNG -------------------------------------------------

    /// Park-Miller multiplicative congruential generator with Schrage's
    /// decomposition; returns values in `[1, 2^31 - 2]`.
    pub fn random(&mut self) -> i64 {
        const A: i64 = 16807;
        const M: i64 = 2147483647;
        const Q: i64 = 127773;
        const R: i64 = 2836;
        let hi = self.rand_state / Q;
        let lo = self.rand_state % Q;
        let t = A * lo - R * hi;
        self.rand_state = if t > 0 { t } else { t + M };
        self.rand_state
    }

    pub fn srandom(&mut self, seed: i64) {
        self.rand_state = if seed <= 0 { 1 } else { seed % 2147483647 };
    }

    /// Uniform draw in `[0, n)`.
    pub(crate) fn random_below(&mut self, n: usize) -> usize {
        (self.random() as usize) % n.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_constants() {
        let dd = DdManager::init(0, 0, 256, 1024, 0);
        assert!(dd.is_constant(dd.one()));
        assert_eq!(dd.const_value(dd.one()), 1.0);
        assert_eq!(dd.const_value(dd.zero()), 0.0);
        assert_eq!(dd.logic_zero(), dd.one().not());
        assert!(dd.const_value(dd.plus_infinity()).is_infinite());
        assert_eq!(dd.background(), dd.zero());
    }

    #[test]
    fn init_vars_identity_order() {
        let mut dd = DdManager::init(4, 0, 256, 1024, 0);
        assert_eq!(dd.read_size(), 4);
        for i in 0..4 {
            assert_eq!(dd.read_perm(i), Some(i));
            assert_eq!(dd.read_inv_perm(i), Some(i));
            let v = dd.ith_var(i).unwrap();
            assert!(dd.is_var(v));
        }
    }

    #[test]
    fn error_deepest_wins() {
        let mut dd = DdManager::default();
        dd.record_error(ErrorCode::TooManyNodes);
        dd.record_error(ErrorCode::InternalError);
        assert_eq!(dd.read_error_code(), ErrorCode::TooManyNodes);
        dd.clear_error_code();
        assert_eq!(dd.read_error_code(), ErrorCode::NoError);
    }

    #[test]
    fn rng_in_range() {
        let mut dd = DdManager::default();
        dd.srandom(42);
        for _ in 0..100 {
            let r = dd.random();
            assert!(r >= 1 && r <= 2147483646);
        }
    }

    #[test]
    fn termination_callback_fires() {
        let mut dd = DdManager::default();
        dd.register_termination_callback(Box::new(|| true));
        assert!(!dd.boundary_check());
        assert_eq!(dd.read_error_code(), ErrorCode::Termination);
        dd.unregister_termination_callback();
        dd.clear_error_code();
        assert!(dd.boundary_check());
    }
}
