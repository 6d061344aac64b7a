use common::prelude::*;

use crate::manager::{DdManager, ErrorCode, GroupCheck};

/// A user-declared variable group: `size` variables starting at index
/// `low`. A fixed group keeps its members in their given order; a
/// permutable group lets sifting rearrange them within the block.
#[derive(Clone, Debug)]
pub struct GroupNode {
    pub low: VarIndex,
    pub size: usize,
    pub fixed: bool,
}

/// The grouping forest consulted by group sifting. Groups stay contiguous
/// in the variable order; sifting moves them as blocks.
#[derive(Clone, Debug, Default)]
pub struct GroupTree {
    pub(crate) groups: Vec<GroupNode>,
}

/// A contiguous block of levels moved as one piece during a pass.
#[derive(Clone, Copy, Debug)]
struct Unit {
    start: Level,
    len: usize,
    permute_inside: bool,
}

impl DdManager {
    /// Declares the variables `low .. low + size` a group. Overlapping
    /// declarations are rejected.
    pub fn make_tree_node(&mut self, low: VarIndex, size: usize, fixed: bool) -> bool {
        if size == 0 || low + size > self.read_size() {
            self.record_error(ErrorCode::InvalidArg);
            return false;
        }
        let tree = self.groups.get_or_insert_with(GroupTree::default);
        for g in &tree.groups {
            if low < g.low + g.size && g.low < low + size {
                self.record_error(ErrorCode::InvalidArg);
                return false;
            }
        }
        tree.groups.push(GroupNode { low, size, fixed });
        true
    }

    pub fn free_tree(&mut self) {
        self.groups = None;
    }

    pub fn read_tree(&self) -> Option<&GroupTree> {
        self.groups.as_ref()
    }

    // --- block movement ----------------------------------------------------

    /// Raises the block at `[start, start + len)` one level by bubbling the
    /// variable above it down past every member.
    fn move_unit_up(&mut self, start: Level, len: usize) -> Option<usize> {
        debug_assert!(start > 0);
        let mut size = self.live_keys();
        for l in (start - 1)..(start + len - 1) {
            size = self.swap_levels(l)?;
        }
        Some(size)
    }

    /// Exchanges the adjacent blocks `[start, start+len1)` and
    /// `[start+len1, start+len1+len2)`, preserving both internal orders.
    fn exchange_units(&mut self, start: Level, len1: usize, len2: usize) -> Option<usize> {
        let mut size = self.live_keys();
        let mut bstart = start + len1;
        for _ in 0..len1 {
            size = self.move_unit_up(bstart, len2)?;
            bstart -= 1;
        }
        Some(size)
    }

    /// Sifts the unit at list position `at` across its siblings, parking it
    /// at the best boundary seen.
    fn sift_unit(
        &mut self,
        units: &mut [Unit],
        at: usize,
        max_growth: f64,
        budget: &mut usize,
    ) -> Option<()> {
        let initial = self.live_keys();
        let bound = (initial as f64 * max_growth) as usize;
        let mut best_size = initial;
        let mut best_pos = at;
        let mut pos = at;

        while pos > 0 && *budget > 0 {
            let size = self.exchange_unit_pair(units, pos - 1)?;
            *budget = budget.saturating_sub(units[pos - 1].len * units[pos].len);
            pos -= 1;
            if size < best_size {
                best_size = size;
                best_pos = pos;
            }
            if size > bound {
                break;
            }
        }
        while pos + 1 < units.len() && *budget > 0 {
            let size = self.exchange_unit_pair(units, pos)?;
            *budget = budget.saturating_sub(units[pos].len * units[pos + 1].len);
            pos += 1;
            if size < best_size {
                best_size = size;
                best_pos = pos;
            }
            if size > bound {
                break;
            }
        }
        while pos > best_pos {
            self.exchange_unit_pair(units, pos - 1)?;
            pos -= 1;
        }
        while pos < best_pos {
            self.exchange_unit_pair(units, pos)?;
            pos += 1;
        }
        Some(())
    }

    /// Exchanges `units[left]` with `units[left + 1]` on the heap and in the
    /// bookkeeping.
    fn exchange_unit_pair(&mut self, units: &mut [Unit], left: usize) -> Option<usize> {
        let a = units[left];
        let b = units[left + 1];
        let size = self.exchange_units(a.start, a.len, b.len)?;
        units[left] = Unit {
            start: a.start,
            ..b
        };
        units[left + 1] = Unit {
            start: a.start + b.len,
            ..a
        };
        Some(size)
    }

    /// One sifting pass over a unit list: population order, block moves,
    /// then member sifting inside permutable multi-variable units.
    fn unit_sift_pass(
        &mut self,
        units: &mut Vec<Unit>,
        max_growth: f64,
        budget: &mut usize,
    ) -> Option<()> {
        // A unit is tracked across exchanges through one of its member
        // variables: the anchor's level always falls inside the unit.
        let mut anchors: Vec<(VarIndex, usize)> = units
            .iter()
            .map(|u| {
                let pop = (u.start..u.start + u.len)
                    .map(|l| self.subtables[l].keys)
                    .sum::<usize>();
                (self.invperm[u.start], pop)
            })
            .collect();
        anchors.sort_by_key(|&(_, pop)| std::cmp::Reverse(pop));
        for (anchor, _) in anchors {
            if *budget == 0 {
                break;
            }
            let lvl = self.perm[anchor];
            let at = units
                .iter()
                .position(|u| u.start <= lvl && lvl < u.start + u.len)
                .expect("anchor level outside every unit");
            self.sift_unit(units, at, max_growth, budget)?;
        }
        for u in 0..units.len() {
            let unit = units[u];
            if unit.permute_inside && unit.len >= 2 {
                let lo = unit.start;
                let hi = unit.start + unit.len - 1;
                for lvl in lo..=hi {
                    if *budget == 0 {
                        break;
                    }
                    let v = self.invperm[lvl];
                    self.sift_var(v, lo, hi, max_growth, budget)?;
                }
            }
        }
        Some(())
    }

    /// Rearranges the order so every declared group is contiguous, members
    /// in their current relative order, and returns the resulting units.
    fn build_units(&mut self) -> Option<Vec<Unit>> {
        let n = self.read_size();
        let groups: Vec<GroupNode> = match &self.groups {
            Some(t) => t.groups.clone(),
            None => Vec::new(),
        };
        let mut claimed: Vec<Option<usize>> = vec![None; n];
        for (gi, g) in groups.iter().enumerate() {
            for v in g.low..g.low + g.size {
                claimed[v] = Some(gi);
            }
        }
        let mut target: Vec<VarIndex> = Vec::with_capacity(n);
        let mut spans: Vec<Unit> = Vec::new();
        let mut emitted = vec![false; groups.len()];
        for lvl in 0..n {
            let v = self.invperm[lvl];
            match claimed[v] {
                None => {
                    spans.push(Unit {
                        start: target.len(),
                        len: 1,
                        permute_inside: false,
                    });
                    target.push(v);
                }
                Some(gi) if !emitted[gi] => {
                    emitted[gi] = true;
                    let start = target.len();
                    // Members enter in their current relative order.
                    let mut members: Vec<VarIndex> = (groups[gi].low
                        ..groups[gi].low + groups[gi].size)
                        .collect();
                    members.sort_by_key(|&m| self.perm[m]);
                    let len = members.len();
                    target.extend(members);
                    spans.push(Unit {
                        start,
                        len,
                        permute_inside: !groups[gi].fixed,
                    });
                }
                Some(_) => {}
            }
        }
        self.shuffle_inner(&target)?;
        Some(spans)
    }

    /// Group sifting: declared groups move as blocks and, unless fixed, are
    /// sifted internally. With group checking enabled, adjacent symmetric
    /// variables outside any group are aggregated first.
    pub(crate) fn group_sift(&mut self, converge: bool, max_growth: f64) -> Option<()> {
        if self.read_size() < 2 {
            return Some(());
        }
        let mut units = self.build_units()?;
        if self.group_check != GroupCheck::NoCheck {
            units = self.aggregate_symmetric_singletons(units);
        }
        let mut budget = self.sift_max_swap;
        loop {
            let before = self.live_keys();
            self.unit_sift_pass(&mut units, max_growth, &mut budget)?;
            if !converge || self.live_keys() >= before || budget == 0 {
                break;
            }
        }
        Some(())
    }

    // --- symmetry ----------------------------------------------------------

    /// Structural check that the variables at levels `i` and `i + 1` are
    /// positively symmetric: exchanging them leaves every function, and
    /// hence the diagram, unchanged.
    pub(crate) fn symm_check(&self, i: Level) -> bool {
        let x = self.invperm[i];
        let y = self.invperm[i + 1];
        if self.subtables[i].keys == 0 || self.subtables[i + 1].keys == 0 {
            return false;
        }
        let mut refs_from_x: DdHashMap<NodeId, usize> = DdHashMap::default();
        for id in self.subtables[i].node_ids(&self.nodes) {
            let rc = self.nt(id).ref_count();
            if rc == 0 {
                continue;
            }
            // An isolated projection function says nothing about symmetry.
            if rc == 1 && self.vars.get(x).map(|v| v.regular().node()) == Some(id) {
                continue;
            }
            let (f0, f1) = {
                let n = self.nt(id);
                (n.low(), n.high())
            };
            let (f10, _f11) = if self.edge_index(f1) == Some(y) {
                self.edge_cofactors(f1)
            } else {
                (f1, f1)
            };
            let (_f00, f01) = if self.edge_index(f0) == Some(y) {
                self.edge_cofactors(f0)
            } else {
                (f0, f0)
            };
            // f(x=1, y=0) must equal f(x=0, y=1).
            if f10 != f01 {
                return false;
            }
            for child in [f0, f1] {
                if self.edge_index(child) == Some(y) {
                    *refs_from_x.entry(child.regular().node()).or_insert(0) += 1;
                }
            }
        }
        // Every node of y must be accounted for by x, save the projection
        // function the manager itself holds.
        for id in self.subtables[i + 1].node_ids(&self.nodes) {
            let rc = self.nt(id).ref_count();
            if rc == 0 {
                continue;
            }
            let from_x = refs_from_x.get(&id).copied().unwrap_or(0);
            let slack = if self.vars.get(y).map(|v| v.regular().node()) == Some(id) {
                1
            } else {
                0
            };
            if rc as usize != from_x + slack {
                return false;
            }
        }
        true
    }

    /// Chains of adjacent symmetric variables, as units.
    fn symmetric_units(&self) -> Vec<Unit> {
        let n = self.read_size();
        let mut units: Vec<Unit> = Vec::new();
        let mut lvl = 0;
        while lvl < n {
            let mut len = 1;
            while lvl + len < n && self.symm_check(lvl + len - 1) {
                len += 1;
            }
            units.push(Unit {
                start: lvl,
                len,
                permute_inside: false,
            });
            lvl += len;
        }
        units
    }

    fn aggregate_symmetric_singletons(&self, units: Vec<Unit>) -> Vec<Unit> {
        let mut out: Vec<Unit> = Vec::new();
        for u in units {
            if let Some(prev) = out.last_mut() {
                if u.len == 1 && !prev.permute_inside && self.symm_check(u.start - 1) {
                    prev.len += 1;
                    continue;
                }
            }
            out.push(u);
        }
        out
    }

    /// Symmetric sifting: detects symmetric adjacent variables, moves each
    /// symmetry group as one block, and parks it at its best position.
    pub(crate) fn symm_sift(&mut self, converge: bool, max_growth: f64) -> Option<()> {
        if self.read_size() < 2 {
            return Some(());
        }
        let mut budget = self.sift_max_swap;
        loop {
            let before = self.live_keys();
            let mut units = self.symmetric_units();
            self.unit_sift_pass(&mut units, max_growth, &mut budget)?;
            if !converge || self.live_keys() >= before || budget == 0 {
                break;
            }
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::reorder::ReorderMethod;

    fn comb(dd: &mut DdManager, pairs: &[(usize, usize)]) -> Edge {
        let mut f = dd.logic_zero();
        dd.ref_edge(f);
        for &(a, b) in pairs {
            let va = dd.ith_var(a).unwrap();
            let vb = dd.ith_var(b).unwrap();
            let t = dd.and(va, vb).unwrap();
            dd.ref_edge(t);
            let nf = dd.or(f, t).unwrap();
            dd.ref_edge(nf);
            dd.recursive_deref(t);
            dd.recursive_deref(f);
            f = nf;
        }
        f
    }

    #[test]
    fn tree_node_validation() {
        let mut dd = DdManager::init(6, 0, 64, 256, 0);
        assert!(dd.make_tree_node(0, 2, false));
        assert!(dd.make_tree_node(2, 2, true));
        // Overlap is rejected.
        assert!(!dd.make_tree_node(1, 2, false));
        assert_eq!(dd.read_error_code(), ErrorCode::InvalidArg);
        dd.clear_error_code();
        assert_eq!(dd.read_tree().unwrap().groups.len(), 2);
        dd.free_tree();
        assert!(dd.read_tree().is_none());
    }

    #[test]
    fn group_sift_keeps_groups_contiguous() {
        let mut dd = DdManager::init(6, 0, 64, 256, 0);
        let f = comb(&mut dd, &[(0, 3), (1, 4), (2, 5)]);
        assert!(dd.make_tree_node(0, 2, false));
        assert!(dd.reduce_heap(ReorderMethod::GroupSift, 0));
        let l0 = dd.read_perm(0).unwrap();
        let l1 = dd.read_perm(1).unwrap();
        assert_eq!(l0.max(l1) - l0.min(l1), 1, "group was torn apart");
        dd.recursive_deref(f);
    }

    #[test]
    fn symmetric_vars_are_detected() {
        let mut dd = DdManager::init(3, 0, 64, 256, 0);
        // f = x0 & x1 is symmetric in x0, x1.
        let f = comb(&mut dd, &[(0, 1)]);
        dd.garbage_collect();
        assert!(dd.symm_check(0));
        assert!(!dd.symm_check(1));
        dd.recursive_deref(f);
    }

    #[test]
    fn symm_sift_preserves_semantics() {
        let mut dd = DdManager::init(6, 0, 64, 256, 0);
        let f = comb(&mut dd, &[(0, 3), (1, 4), (2, 5)]);
        let minterms = dd.count_minterm(f, 6);
        let before = dd.dag_size(f);
        assert!(dd.reduce_heap(ReorderMethod::SymmSift, 0));
        assert!(dd.dag_size(f) <= before);
        assert_eq!(dd.count_minterm(f, 6), minterms);
        dd.recursive_deref(f);
    }

    #[test]
    fn lazy_sift_runs_as_group_sift() {
        let mut dd = DdManager::init(4, 0, 64, 256, 0);
        let f = comb(&mut dd, &[(0, 2), (1, 3)]);
        let minterms = dd.count_minterm(f, 4);
        assert!(dd.reduce_heap(ReorderMethod::LazySift, 0));
        assert_eq!(dd.count_minterm(f, 4), minterms);
        dd.recursive_deref(f);
    }
}
