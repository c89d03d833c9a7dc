//! Integration tests for graph operations on small hand-built transducers.
//!
//! Run: cargo test -p g2pfst --test operations

use g2pfst::ops::{
    ArcOrder, ProjectType, arc_sort, compose, connect, n_shortest_paths, project, rm_epsilon,
};
use g2pfst::{Arc, Fst, Label, Semiring, SymbolTable, Weight};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn syms(symbols: &[&str]) -> SymbolTable {
    SymbolTable::from_symbols(symbols.iter().copied()).unwrap()
}

/// Build an fst from `(source, ilabel, olabel, weight, target)` rows.
/// State 0 is the start; `finals` lists `(state, weight)`.
fn build(
    semiring: Semiring,
    num_states: usize,
    rows: &[(usize, Label, Label, f64, usize)],
    finals: &[(usize, f64)],
) -> Fst {
    let mut fst = Fst::new(semiring);
    for _ in 0..num_states {
        fst.add_nonfinal_state();
    }
    fst.set_start(0).unwrap();
    for &(s, i, o, w, t) in rows {
        fst.add_arc(s, Arc::new(i, o, w, t)).unwrap();
    }
    for &(s, w) in finals {
        fst.set_final(s, w).unwrap();
    }
    fst
}

/// All complete paths of a small acyclic fst as (ilabels, olabels, weight).
fn all_paths(fst: &Fst) -> Vec<(Vec<Label>, Vec<Label>, f64)> {
    let mut paths: Vec<_> = n_shortest_paths(fst, 1000, None)
        .unwrap()
        .into_iter()
        .map(|p| (p.ilabels, p.olabels, p.weight.value()))
        .collect();
    paths.sort_by(|a, b| a.partial_cmp(b).unwrap());
    paths
}

// ---------------------------------------------------------------------------
// ArcSort
// ---------------------------------------------------------------------------

fn unsorted() -> Fst {
    build(
        Semiring::Tropical,
        3,
        &[
            (0, 1, 4, 0.0, 1),
            (0, 3, 5, 0.0, 1),
            (0, 2, 3, 0.0, 1),
            (0, 5, 2, 0.0, 2),
            (0, 4, 1, 0.0, 2),
            (1, 2, 3, 0.0, 1),
            (1, 3, 1, 0.0, 2),
            (1, 1, 2, 0.0, 2),
        ],
        &[(0, 0.0), (1, 0.0), (2, 0.0)],
    )
}

#[test]
fn arc_sort_by_input_label() {
    let mut fst = unsorted();
    let expected = build(
        Semiring::Tropical,
        3,
        &[
            (0, 1, 4, 0.0, 1),
            (0, 2, 3, 0.0, 1),
            (0, 3, 5, 0.0, 1),
            (0, 4, 1, 0.0, 2),
            (0, 5, 2, 0.0, 2),
            (1, 1, 2, 0.0, 2),
            (1, 2, 3, 0.0, 1),
            (1, 3, 1, 0.0, 2),
        ],
        &[(0, 0.0), (1, 0.0), (2, 0.0)],
    );
    assert_ne!(fst, expected);
    arc_sort(&mut fst, ArcOrder::Input);
    assert_eq!(fst, expected);
}

#[test]
fn arc_sort_by_output_label() {
    let mut fst = unsorted();
    let expected = build(
        Semiring::Tropical,
        3,
        &[
            (0, 4, 1, 0.0, 2),
            (0, 5, 2, 0.0, 2),
            (0, 2, 3, 0.0, 1),
            (0, 1, 4, 0.0, 1),
            (0, 3, 5, 0.0, 1),
            (1, 3, 1, 0.0, 2),
            (1, 1, 2, 0.0, 2),
            (1, 2, 3, 0.0, 1),
        ],
        &[(0, 0.0), (1, 0.0), (2, 0.0)],
    );
    arc_sort(&mut fst, ArcOrder::Output);
    assert_eq!(fst, expected);
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

fn project_source() -> Fst {
    let mut fst = build(
        Semiring::Tropical,
        4,
        &[
            (0, 1, 5, 1.0, 1),
            (0, 2, 4, 3.0, 1),
            (1, 3, 3, 7.0, 1),
            (1, 4, 2, 5.0, 2),
            (2, 5, 1, 9.0, 3),
        ],
        &[(3, 2.0)],
    );
    fst.set_input_symbols(Some(syms(&["<eps>", "a", "b", "d", "c", "f"])));
    fst.set_output_symbols(Some(syms(&["<eps>", "u", "w", "v", "x", "y"])));
    fst
}

#[test]
fn project_on_input() {
    let mut fst = project_source();
    project(&mut fst, ProjectType::Input);

    let mut expected = build(
        Semiring::Tropical,
        4,
        &[
            (0, 1, 1, 1.0, 1),
            (0, 2, 2, 3.0, 1),
            (1, 3, 3, 7.0, 1),
            (1, 4, 4, 5.0, 2),
            (2, 5, 5, 9.0, 3),
        ],
        &[(3, 2.0)],
    );
    let table = syms(&["<eps>", "a", "b", "d", "c", "f"]);
    expected.set_input_symbols(Some(table.clone()));
    expected.set_output_symbols(Some(table));
    assert_eq!(fst, expected);
}

#[test]
fn project_on_output() {
    let mut fst = project_source();
    project(&mut fst, ProjectType::Output);

    let mut expected = build(
        Semiring::Tropical,
        4,
        &[
            (0, 5, 5, 1.0, 1),
            (0, 4, 4, 3.0, 1),
            (1, 3, 3, 7.0, 1),
            (1, 2, 2, 5.0, 2),
            (2, 1, 1, 9.0, 3),
        ],
        &[(3, 2.0)],
    );
    let table = syms(&["<eps>", "u", "w", "v", "x", "y"]);
    expected.set_input_symbols(Some(table.clone()));
    expected.set_output_symbols(Some(table));
    assert_eq!(fst, expected);
}

// ---------------------------------------------------------------------------
// Compose
// ---------------------------------------------------------------------------

#[test]
fn compose_with_epsilons_yields_exactly_one_path() {
    // A: a:a b:eps c:eps d:d
    let mut a = build(
        Semiring::Tropical,
        5,
        &[(0, 1, 1, 0.0, 1), (1, 2, 0, 0.0, 2), (2, 3, 0, 0.0, 3), (3, 4, 2, 0.0, 4)],
        &[(4, 0.0)],
    );
    a.set_input_symbols(Some(syms(&["<eps>", "a", "b", "c", "d"])));
    a.set_output_symbols(Some(syms(&["<eps>", "a", "d"])));

    // B: a:d eps:e d:a
    let mut b = build(
        Semiring::Tropical,
        4,
        &[(0, 1, 2, 0.0, 1), (1, 0, 3, 0.0, 2), (2, 2, 1, 0.0, 3)],
        &[(3, 0.0)],
    );
    b.set_input_symbols(Some(syms(&["<eps>", "a", "d"])));
    b.set_output_symbols(Some(syms(&["<eps>", "a", "d", "e"])));

    let mut c = compose(&a, &b).unwrap();
    connect(&mut c).unwrap();

    let paths = all_paths(&c);
    assert_eq!(paths.len(), 1, "paths: {paths:?}");
    let (ilabels, olabels, weight) = &paths[0];
    assert_eq!(weight, &0.0);

    let isyms = c.input_symbols().unwrap();
    let osyms = c.output_symbols().unwrap();
    let input: Vec<&str> = ilabels.iter().filter_map(|&l| isyms.get_value(l)).collect();
    let output: Vec<&str> = olabels.iter().filter_map(|&l| osyms.get_value(l)).collect();
    assert_eq!(input, vec!["a", "b", "c", "d"]);
    assert_eq!(output, vec!["d", "e", "a"]);
}

#[test]
fn compose_is_associative() {
    let a = build(
        Semiring::Tropical,
        3,
        &[(0, 1, 2, 0.5, 1), (0, 1, 3, 1.0, 1), (1, 2, 0, 0.25, 2)],
        &[(2, 0.0)],
    );
    let b = build(
        Semiring::Tropical,
        3,
        &[(0, 2, 4, 1.0, 1), (0, 3, 5, 0.0, 1), (1, 0, 6, 2.0, 2)],
        &[(2, 0.5)],
    );
    let c = build(
        Semiring::Tropical,
        2,
        &[(0, 4, 7, 0.0, 0), (0, 5, 8, 1.0, 0), (0, 6, 9, 0.0, 1)],
        &[(1, 0.0)],
    );

    let left = compose(&compose(&a, &b).unwrap(), &c).unwrap();
    let right = compose(&a, &compose(&b, &c).unwrap()).unwrap();
    let left_paths = all_paths(&left);
    assert!(!left_paths.is_empty());
    assert_eq!(left_paths, all_paths(&right));
}

#[test]
fn compose_multiplies_weights_in_log() {
    let a = build(Semiring::Log, 2, &[(0, 1, 2, 0.5, 1)], &[(1, 0.25)]);
    let b = build(Semiring::Log, 2, &[(0, 2, 3, 1.5, 1)], &[(1, 0.25)]);
    let c = compose(&a, &b).unwrap();
    let paths = n_shortest_paths(&c, 1, None).unwrap();
    assert_eq!(paths[0].weight, Weight::new(2.5));
    assert_eq!(paths[0].olabels, vec![3]);
}

// ---------------------------------------------------------------------------
// RmEpsilon + Connect
// ---------------------------------------------------------------------------

#[test]
fn rm_epsilon_preserves_paths() {
    let mut fst = build(
        Semiring::Tropical,
        5,
        &[
            (0, 0, 0, 0.5, 1),
            (0, 1, 1, 1.0, 2),
            (1, 2, 2, 1.0, 3),
            (2, 0, 0, 0.25, 3),
            (3, 3, 3, 1.0, 4),
        ],
        &[(4, 0.0)],
    );
    let before = all_paths(&fst);
    rm_epsilon(&mut fst).unwrap();
    let after = all_paths(&fst);
    assert_eq!(before, after);
    for state in fst.states() {
        assert!(state.arcs().iter().all(|a| !(a.ilabel == 0 && a.olabel == 0)));
    }
}
