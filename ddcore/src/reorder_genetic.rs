use common::prelude::*;

use crate::manager::DdManager;

impl DdManager {
    /// Genetic search over variable orders: a small population evolved by
    /// PMX crossover and swap mutation; fitness is the live node count the
    /// order actually produces.
    pub(crate) fn genetic(&mut self) -> Option<()> {
        let n = self.read_size();
        if n < 2 {
            return Some(());
        }
        let pop_size = (2 * n).clamp(4, 12);
        let generations = 4 * n.min(8);

        let seed_order = self.invperm.clone();
        let seed_size = self.live_keys();
        let mut population: Vec<(Vec<VarIndex>, usize)> = vec![(seed_order.clone(), seed_size)];
        while population.len() < pop_size {
            let mut order = seed_order.clone();
            for i in (1..n).rev() {
                let j = self.random_below(i + 1);
                order.swap(i, j);
            }
            let size = self.measure_order(&order)?;
            population.push((order, size));
        }

        for _ in 0..generations {
            let a = self.tournament(&population);
            let b = self.tournament(&population);
            let mut child = self.pmx(&population[a].0.clone(), &population[b].0.clone());
            if self.random_below(10) < 3 {
                let i = self.random_below(n);
                let j = self.random_below(n);
                child.swap(i, j);
            }
            let size = self.measure_order(&child)?;
            let worst = population
                .iter()
                .enumerate()
                .max_by_key(|(_, (_, s))| *s)
                .map(|(i, _)| i)
                .expect("population is nonempty");
            if size < population[worst].1 {
                population[worst] = (child, size);
            }
        }

        let best = population
            .iter()
            .min_by_key(|(_, s)| *s)
            .expect("population is nonempty")
            .0
            .clone();
        self.shuffle_inner(&best)?;
        Some(())
    }

    /// Fitness of an order is measured on the real heap.
    fn measure_order(&mut self, order: &[VarIndex]) -> Option<usize> {
        self.shuffle_inner(order)?;
        Some(self.live_keys())
    }

    fn tournament(&mut self, population: &[(Vec<VarIndex>, usize)]) -> usize {
        let a = self.random_below(population.len());
        let b = self.random_below(population.len());
        if population[a].1 <= population[b].1 {
            a
        } else {
            b
        }
    }

    /// Partially matched crossover: the segment between two cuts comes from
    /// the first parent, the rest from the second with conflicts chased
    /// through the mapping.
    fn pmx(&mut self, p1: &[VarIndex], p2: &[VarIndex]) -> Vec<VarIndex> {
        let n = p1.len();
        let c1 = self.random_below(n);
        let c2 = self.random_below(n);
        let (cut1, cut2) = (c1.min(c2), c1.max(c2));
        let mut child: Vec<Option<VarIndex>> = vec![None; n];
        let mut used = vec![false; n];
        for i in cut1..=cut2 {
            child[i] = Some(p1[i]);
            used[p1[i]] = true;
        }
        for i in 0..n {
            if child[i].is_some() {
                continue;
            }
            let mut v = p2[i];
            while used[v] {
                let j = p1[cut1..=cut2]
                    .iter()
                    .position(|&x| x == v)
                    .map(|k| k + cut1)
                    .expect("mapping segment must contain the conflict");
                v = p2[j];
            }
            child[i] = Some(v);
            used[v] = true;
        }
        child.into_iter().map(|v| v.expect("complete child")).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::manager::DdManager;
    use crate::reorder::ReorderMethod;

    #[test]
    fn genetic_preserves_semantics() {
        let mut dd = DdManager::init(6, 0, 64, 256, 0);
        dd.srandom(999);
        let mut f = dd.logic_zero();
        dd.ref_edge(f);
        for (a, b) in [(0, 3), (1, 4), (2, 5)] {
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
        let minterms = dd.count_minterm(f, 6);
        let before = dd.dag_size(f);
        assert!(dd.reduce_heap(ReorderMethod::Genetic, 0));
        assert!(dd.dag_size(f) <= before);
        assert_eq!(dd.count_minterm(f, 6), minterms);
        // The order is a permutation.
        let mut seen = vec![false; 6];
        for l in 0..6 {
            seen[dd.read_inv_perm(l).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s));
        dd.recursive_deref(f);
    }
}
