use ddpack::prelude::*;

fn clock<F>(s: &str, f: F)
where
    F: FnOnce(),
{
    let start = std::time::Instant::now();
    f();
    let end = start.elapsed();
    println!("{}: time {}", s, end.as_secs_f64());
}

/// Disjoint pair products with the partners far apart in the order: the
/// worst case interleaving for the initial order, the best case once the
/// pairs are adjacent.
fn comb(dd: &mut DdManager, pairs: usize) -> Edge {
    let mut f = dd.logic_zero();
    dd.ref_edge(f);
    for i in 0..pairs {
        let a = dd.ith_var(i).unwrap();
        let b = dd.ith_var(i + pairs).unwrap();
        let t = dd.and(a, b).unwrap();
        dd.ref_edge(t);
        let nf = dd.or(f, t).unwrap();
        dd.ref_edge(nf);
        dd.recursive_deref(t);
        dd.recursive_deref(f);
        f = nf;
    }
    f
}

fn main() {
    let pairs = 10;

    let mut dd = DdManager::init(2 * pairs, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    let f = comb(&mut dd, pairs);
    println!("initial size {}", dd.dag_size(f));
    clock("sift", || {
        dd.reduce_heap(ReorderMethod::Sift, 0);
    });
    println!("after sift {}", dd.dag_size(f));
    dd.recursive_deref(f);

    let mut dd = DdManager::init(2 * pairs, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    let f = comb(&mut dd, pairs);
    clock("sift converge", || {
        dd.reduce_heap(ReorderMethod::SiftConverge, 0);
    });
    println!("after sift converge {}", dd.dag_size(f));
    dd.recursive_deref(f);

    let mut dd = DdManager::init(2 * pairs, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    let f = comb(&mut dd, pairs);
    clock("window4", || {
        dd.reduce_heap(ReorderMethod::Window4, 0);
    });
    println!("after window4 {}", dd.dag_size(f));
    dd.recursive_deref(f);

    let mut dd = DdManager::init(2 * pairs, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    dd.srandom(1);
    let f = comb(&mut dd, pairs);
    clock("annealing", || {
        dd.reduce_heap(ReorderMethod::Annealing, 0);
    });
    println!("after annealing {}", dd.dag_size(f));
    dd.recursive_deref(f);
}
