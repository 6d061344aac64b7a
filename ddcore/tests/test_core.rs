use ddcore::prelude::*;

#[test]
fn build_and_query() {
    let mut dd = DdManager::init(3, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    let x = dd.ith_var(0).unwrap();
    let y = dd.ith_var(1).unwrap();
    let z = dd.ith_var(2).unwrap();
    let f = dd.ite(x, y, z).unwrap();
    dd.ref_edge(f);
    assert_eq!(dd.support_indices(f), vec![0, 1, 2]);
    assert_eq!(dd.count_minterm(f, 3), 4.0);
    dd.recursive_deref(f);
}

#[test]
fn boolean_algebra_via_the_cache() {
    let mut dd = DdManager::init(2, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    let x = dd.ith_var(0).unwrap();
    let y = dd.ith_var(1).unwrap();
    let lookups_before = dd.read_cache_look_ups();
    let a = dd.and(x, y).unwrap();
    dd.ref_edge(a);
    let b = dd.and(x, y).unwrap();
    assert_eq!(a, b);
    assert!(dd.read_cache_look_ups() > lookups_before);
    assert!(dd.read_cache_hits() >= 1);
    dd.recursive_deref(a);
}

#[test]
fn add_and_bdd_interplay() {
    let mut dd = DdManager::init(2, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    let xb = dd.ith_var(0).unwrap();
    let yb = dd.ith_var(1).unwrap();
    let f = dd.or(xb, yb).unwrap();
    dd.ref_edge(f);
    let a = dd.bdd_to_add(f).unwrap();
    dd.ref_edge(a);
    let xa = dd.add_ith_var(0).unwrap();
    dd.ref_edge(xa);
    let ya = dd.add_ith_var(1).unwrap();
    dd.ref_edge(ya);
    let max = dd.add_apply(AddOp::Maximum, xa, ya).unwrap();
    assert_eq!(a, max);
    dd.recursive_deref(f);
    dd.recursive_deref(a);
    dd.recursive_deref(xa);
    dd.recursive_deref(ya);
}

#[test]
fn reorder_then_operate() {
    let mut dd = DdManager::init(6, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
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
    assert!(dd.reduce_heap(ReorderMethod::SiftConverge, 0));
    // The manager is fully usable after the pass.
    let x0 = dd.ith_var(0).unwrap();
    let g = dd.and(f, x0).unwrap();
    dd.ref_edge(g);
    assert!(dd.leq(g, f));
    dd.recursive_deref(g);
    dd.recursive_deref(f);
}

#[test]
fn cube_listing_matches_minterm_count() {
    let mut dd = DdManager::init(3, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    let x = dd.ith_var(0).unwrap();
    let y = dd.ith_var(1).unwrap();
    let z = dd.ith_var(2).unwrap();
    let xy = dd.and(x, y).unwrap();
    dd.ref_edge(xy);
    let f = dd.or(xy, z).unwrap();
    dd.ref_edge(f);
    let mut covered = 0.0;
    let mut seen = std::collections::HashSet::new();
    for (cube, _) in dd.cubes(f) {
        let free = cube.iter().filter(|&&v| v == DONT_CARE).count();
        covered += (free as f64).exp2();
        assert!(seen.insert(cube));
    }
    // Cubes from the path enumeration are disjoint, so they add up.
    assert_eq!(covered, dd.count_minterm(f, 3));
    dd.recursive_deref(xy);
    dd.recursive_deref(f);
}

#[test]
fn error_state_is_sticky_until_cleared() {
    let mut dd = DdManager::init(2, 0, UNIQUE_SLOTS, CACHE_SLOTS, 0);
    let x = dd.ith_var(0).unwrap();
    assert!(dd.exist_abstract(x, x.not()).is_none());
    assert_eq!(dd.read_error_code(), ErrorCode::InvalidArg);
    // Still readable after an unrelated success.
    let y = dd.ith_var(1).unwrap();
    let _ = dd.and(x, y).unwrap();
    assert_eq!(dd.read_error_code(), ErrorCode::InvalidArg);
    dd.clear_error_code();
    assert_eq!(dd.read_error_code(), ErrorCode::NoError);
}
