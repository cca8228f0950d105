//! Christofides-style tour construction: MST, minimum-weight matching on the
//! odd-degree vertices, Euler circuit, first-visit shortcut.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::graph::{Edge, Graph};
use crate::matrix::{Distance, Matrix};
use crate::tour::Tour;

const EULER_START_VERTEX: usize = 0;

/// Builds the initial Hamiltonian tour for the given distance matrix.
pub fn construct(matrix: &Matrix) -> Tour {
    let n = matrix.n();
    if n <= 2 {
        return Tour::new((0..n).collect());
    }

    let mst = minimum_spanning_tree(matrix);
    let tree = Graph::from_edges(n, &mst);

    let odd = odd_degree_vertices(&tree);
    let matching = greedy_matching(matrix, &odd);
    log::info!(
        "christofides: mst_edges={} odd_vertices={} matching_edges={}",
        mst.len(),
        odd.len(),
        matching.len()
    );

    // Union of MST and matching, keeping multiplicity: an edge in both
    // appears twice, and every vertex degree is even.
    let mut euler_graph = tree;
    for edge in &matching {
        euler_graph.add_edge(edge.u, edge.v);
    }

    let circuit = euler_circuit(&mut euler_graph, EULER_START_VERTEX);
    let tour = shortcut(&circuit, n);
    log::debug!(
        "christofides: circuit_len={} tour_len={}",
        circuit.len(),
        tour.len()
    );

    Tour::new(tour)
}

/// Prim's algorithm over the complete graph. Heap entries carry
/// `(weight, u, v)` with `u < v`, so equal weights resolve lexicographically.
fn minimum_spanning_tree(matrix: &Matrix) -> Vec<Edge> {
    let n = matrix.n();
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    if n < 2 {
        return edges;
    }

    let mut in_tree = vec![false; n];
    let mut heap = BinaryHeap::new();

    in_tree[0] = true;
    push_frontier(matrix, &in_tree, 0, &mut heap);

    while edges.len() < n - 1 {
        let Some(Reverse((weight, u, v))) = heap.pop() else {
            break;
        };
        let next = match (in_tree[u], in_tree[v]) {
            (true, false) => v,
            (false, true) => u,
            // Stale entry; both endpoints joined the tree since the push.
            _ => continue,
        };
        in_tree[next] = true;
        edges.push(Edge::new(u, v, weight));
        push_frontier(matrix, &in_tree, next, &mut heap);
    }

    edges
}

fn push_frontier(
    matrix: &Matrix,
    in_tree: &[bool],
    from: usize,
    heap: &mut BinaryHeap<Reverse<(Distance, usize, usize)>>,
) {
    for to in 0..matrix.n() {
        if !in_tree[to] {
            let (u, v) = if from < to { (from, to) } else { (to, from) };
            heap.push(Reverse((matrix.get(from, to), u, v)));
        }
    }
}

/// Vertices with odd MST degree; an even-sized set by the handshake lemma.
fn odd_degree_vertices(graph: &Graph) -> Vec<usize> {
    graph
        .vertices()
        .filter(|&v| graph.degree(v) % 2 == 1)
        .collect()
}

/// Deterministic greedy matching: all candidate pairs sorted by
/// `(weight, u, v)`, lightest pair of still-unmatched endpoints first.
/// An optimal blossom matching is traded for simplicity; local search
/// recovers the constructive gap.
fn greedy_matching(matrix: &Matrix, odd: &[usize]) -> Vec<Edge> {
    let mut candidates = Vec::with_capacity(odd.len() * odd.len().saturating_sub(1) / 2);
    for (i, &u) in odd.iter().enumerate() {
        for &v in &odd[i + 1..] {
            candidates.push(Edge::new(u, v, matrix.get(u, v)));
        }
    }
    candidates.sort_unstable_by_key(Edge::sort_key);

    let n = matrix.n();
    let mut matched = vec![false; n];
    let mut matching = Vec::with_capacity(odd.len() / 2);
    for edge in candidates {
        if !matched[edge.u] && !matched[edge.v] {
            matched[edge.u] = true;
            matched[edge.v] = true;
            matching.push(edge);
        }
    }
    matching
}

/// Hierholzer's algorithm. Consumes the multigraph's edges; the smallest
/// available neighbor is taken first so the circuit is deterministic.
fn euler_circuit(graph: &mut Graph, start: usize) -> Vec<usize> {
    let mut stack = vec![start];
    let mut circuit = Vec::with_capacity(graph.edge_count() + 1);

    while let Some(&v) = stack.last() {
        if let Some(next) = graph.smallest_neighbor(v) {
            graph.remove_edge(v, next);
            stack.push(next);
        } else {
            circuit.push(v);
            stack.pop();
        }
    }

    circuit.reverse();
    circuit
}

/// Walks the Euler circuit and keeps the first visit of each vertex.
fn shortcut(circuit: &[usize], n: usize) -> Vec<usize> {
    let mut seen = vec![false; n];
    let mut tour = Vec::with_capacity(n);
    for &v in circuit {
        if !seen[v] {
            seen[v] = true;
            tour.push(v);
        }
    }
    tour
}
