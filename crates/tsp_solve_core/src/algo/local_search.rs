//! Tour improvement: best-improvement 2-opt and or-opt sweeps.
//!
//! Every applied move strictly lowers the integer tour cost, which bounds the
//! number of moves and guarantees termination without an iteration cap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::matrix::{Distance, Matrix};
use crate::tour::Tour;

const MIN_TOUR_SIZE_FOR_SEARCH: usize = 4;
const OR_OPT_MAX_SEGMENT: usize = 3;

#[derive(Clone, Copy, Debug)]
struct TwoOptMove {
    delta: i64,
    i: usize,
    j: usize,
}

#[derive(Clone, Copy, Debug)]
struct OrOptMove {
    delta: i64,
    start: usize,
    len: usize,
    gap: usize,
    reversed: bool,
}

pub struct LocalSearch<'a> {
    matrix: &'a Matrix,
    two_opt: bool,
    or_opt: bool,
    deadline: Option<Instant>,
    stop: Option<Arc<AtomicBool>>,
}

impl<'a> LocalSearch<'a> {
    pub fn new(matrix: &'a Matrix) -> Self {
        Self {
            matrix,
            two_opt: true,
            or_opt: true,
            deadline: None,
            stop: None,
        }
    }

    pub fn with_two_opt(mut self, enabled: bool) -> Self {
        self.two_opt = enabled;
        self
    }

    pub fn with_or_opt(mut self, enabled: bool) -> Self {
        self.or_opt = enabled;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Improves the tour in place until no configured move helps, the
    /// deadline passes, or the stop flag is raised. Returns the final cost.
    pub fn run(&self, tour: &mut Tour) -> Distance {
        let now = Instant::now();
        let mut cost = tour.cost(self.matrix);
        let n = tour.len();
        if n < MIN_TOUR_SIZE_FOR_SEARCH || (!self.two_opt && !self.or_opt) {
            return cost;
        }

        let initial = cost;
        let mut two_opt_moves = 0usize;
        let mut or_opt_moves = 0usize;

        // 2-opt runs until exhausted; or-opt gets one shot, and any or-opt
        // success hands control back to 2-opt.
        loop {
            if self.interrupted() {
                log::warn!("local_search: stopped early cost={cost}");
                break;
            }

            if self.two_opt && let Some(mv) = best_two_opt(self.matrix, tour.order()) {
                apply_two_opt(tour.order_mut(), mv);
                cost -= mv.delta as Distance;
                two_opt_moves += 1;
                log::trace!("local_search.2opt: i={} j={} delta={}", mv.i, mv.j, mv.delta);
                continue;
            }

            if self.or_opt && let Some(mv) = best_or_opt(self.matrix, tour.order()) {
                apply_or_opt(tour.order_mut(), mv);
                cost -= mv.delta as Distance;
                or_opt_moves += 1;
                log::trace!(
                    "local_search.oropt: start={} len={} gap={} reversed={} delta={}",
                    mv.start,
                    mv.len,
                    mv.gap,
                    mv.reversed,
                    mv.delta
                );
                continue;
            }

            break;
        }

        log::info!(
            "local_search: complete n={n} two_opt_moves={two_opt_moves} or_opt_moves={or_opt_moves} \
             initial={initial} cost={cost} secs={:.2}",
            now.elapsed().as_secs_f32()
        );
        cost
    }

    fn interrupted(&self) -> bool {
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return true;
        }
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Largest-delta 2-opt move, ties resolved to the smallest `(i, j)`.
///
/// Rows are evaluated in parallel; the reduction below is sequential and in
/// row order, so the result is identical to a sequential sweep.
fn best_two_opt(matrix: &Matrix, order: &[usize]) -> Option<TwoOptMove> {
    let n = order.len();
    let rows: Vec<Option<TwoOptMove>> = (0..n - 2)
        .into_par_iter()
        .map(|i| best_two_opt_in_row(matrix, order, i))
        .collect();

    let mut best: Option<TwoOptMove> = None;
    for candidate in rows.into_iter().flatten() {
        if best.is_none_or(|b| candidate.delta > b.delta) {
            best = Some(candidate);
        }
    }
    best
}

fn best_two_opt_in_row(matrix: &Matrix, order: &[usize], i: usize) -> Option<TwoOptMove> {
    let n = order.len();
    let a = order[i];
    let b = order[i + 1];
    // The wraparound edge is adjacent to the first edge, so i == 0 stops
    // one pairing short.
    let j_end = if i == 0 { n - 1 } else { n };

    let mut best: Option<TwoOptMove> = None;
    for j in (i + 2)..j_end {
        let c = order[j];
        let d = order[(j + 1) % n];
        let removed = matrix.get(a, b) + matrix.get(c, d);
        let added = matrix.get(a, c) + matrix.get(b, d);
        let delta = removed as i64 - added as i64;
        if delta > 0 && best.is_none_or(|bst| delta > bst.delta) {
            best = Some(TwoOptMove { delta, i, j });
        }
    }
    best
}

/// Replaces edges `(a, b)` and `(c, d)` with `(a, c)` and `(b, d)` by
/// reversing the segment between them.
fn apply_two_opt(order: &mut [usize], mv: TwoOptMove) {
    order[mv.i + 1..=mv.j].reverse();
}

/// Largest-delta or-opt move over segment lengths 1..=3, both orientations.
/// Ties resolve to the shortest segment, then lowest start, then lowest
/// insertion gap, forward before reversed.
fn best_or_opt(matrix: &Matrix, order: &[usize]) -> Option<OrOptMove> {
    let n = order.len();
    let mut best: Option<OrOptMove> = None;

    for len in 1..=OR_OPT_MAX_SEGMENT {
        // At least two cities must remain outside the segment.
        if n < len + 2 {
            break;
        }
        for start in 0..=(n - len) {
            let segment = &order[start..start + len];
            let first = segment[0];
            let last = segment[len - 1];
            let prev = order[(start + n - 1) % n];
            let next = order[(start + len) % n];

            let removed = matrix.get(prev, first) as i64 + matrix.get(last, next) as i64
                - matrix.get(prev, next) as i64;

            let rest = remaining(order, start, len);
            let r = rest.len();
            for gap in 0..r {
                let u = rest[gap];
                let w = rest[(gap + 1) % r];
                let base = matrix.get(u, w) as i64;

                let forward = matrix.get(u, first) as i64 + matrix.get(last, w) as i64 - base;
                consider(&mut best, removed - forward, start, len, gap, false);

                let reversed = matrix.get(u, last) as i64 + matrix.get(first, w) as i64 - base;
                consider(&mut best, removed - reversed, start, len, gap, true);
            }
        }
    }
    best
}

fn consider(
    best: &mut Option<OrOptMove>,
    delta: i64,
    start: usize,
    len: usize,
    gap: usize,
    reversed: bool,
) {
    if delta > 0 && best.is_none_or(|bst| delta > bst.delta) {
        *best = Some(OrOptMove {
            delta,
            start,
            len,
            gap,
            reversed,
        });
    }
}

/// The tour with `order[start..start + len]` removed, in original order.
fn remaining(order: &[usize], start: usize, len: usize) -> Vec<usize> {
    let mut rest = Vec::with_capacity(order.len() - len);
    rest.extend_from_slice(&order[..start]);
    rest.extend_from_slice(&order[start + len..]);
    rest
}

fn apply_or_opt(order: &mut Vec<usize>, mv: OrOptMove) {
    let mut segment = order[mv.start..mv.start + mv.len].to_vec();
    if mv.reversed {
        segment.reverse();
    }
    let rest = remaining(order, mv.start, mv.len);

    let mut rebuilt = Vec::with_capacity(order.len());
    rebuilt.extend_from_slice(&rest[..=mv.gap]);
    rebuilt.extend_from_slice(&segment);
    rebuilt.extend_from_slice(&rest[mv.gap + 1..]);
    *order = rebuilt;
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::{LocalSearch, best_two_opt};
    use crate::matrix::Matrix;
    use crate::tour::Tour;

    fn crossing_matrix() -> Matrix {
        // Tour [0,1,2,3] pays the two weight-5 edges; exchanging them for
        // the weight-1 diagonals is the unique 2-opt improvement.
        let mut m = Matrix::zeroed(4);
        m.set_symmetric(0, 1, 5);
        m.set_symmetric(1, 2, 1);
        m.set_symmetric(2, 3, 5);
        m.set_symmetric(0, 3, 1);
        m.set_symmetric(0, 2, 1);
        m.set_symmetric(1, 3, 1);
        m
    }

    #[test]
    fn best_two_opt_finds_the_crossing_exchange() {
        let m = crossing_matrix();
        let mv = best_two_opt(&m, &[0, 1, 2, 3]).expect("improving move");
        assert_eq!((mv.i, mv.j), (0, 2));
        assert_eq!(mv.delta, 8);
    }

    #[test]
    fn run_applies_two_opt_until_no_improvement_remains() {
        let m = crossing_matrix();
        let mut tour = Tour::new(vec![0, 1, 2, 3]);
        let cost = LocalSearch::new(&m).run(&mut tour);

        assert_eq!(cost, 4);
        assert_eq!(cost, tour.cost(&m));
        tour.validate(4).expect("tour stays a permutation");
    }

    #[test]
    fn run_with_or_opt_only_relocates_a_city() {
        let mut m = Matrix::zeroed(4);
        m.set_symmetric(0, 1, 10);
        m.set_symmetric(1, 2, 10);
        m.set_symmetric(2, 3, 1);
        m.set_symmetric(0, 3, 1);
        m.set_symmetric(0, 2, 1);
        m.set_symmetric(1, 3, 1);

        let mut tour = Tour::new(vec![0, 1, 2, 3]);
        let cost = LocalSearch::new(&m).with_two_opt(false).run(&mut tour);

        assert_eq!(cost, 13);
        assert_eq!(cost, tour.cost(&m));
        tour.validate(4).expect("tour stays a permutation");
    }

    #[test]
    fn run_never_worsens_the_tour() {
        let m = crossing_matrix();
        let mut tour = Tour::new(vec![0, 2, 1, 3]);
        let initial = tour.cost(&m);
        let cost = LocalSearch::new(&m).run(&mut tour);
        assert!(cost <= initial);
        assert_eq!(cost, tour.cost(&m));
    }

    #[test]
    fn run_skips_tiny_tours() {
        let mut m = Matrix::zeroed(3);
        m.set_symmetric(0, 1, 2);
        m.set_symmetric(1, 2, 3);
        m.set_symmetric(0, 2, 4);
        let mut tour = Tour::new(vec![0, 1, 2]);
        assert_eq!(LocalSearch::new(&m).run(&mut tour), 9);
        assert_eq!(tour.order(), &[0, 1, 2]);
    }

    #[test]
    fn run_respects_an_expired_deadline() {
        let m = crossing_matrix();
        let mut tour = Tour::new(vec![0, 1, 2, 3]);
        let initial = tour.cost(&m);
        let cost = LocalSearch::new(&m)
            .with_deadline(Some(Instant::now()))
            .run(&mut tour);

        // The deadline is already over, so no move is applied.
        assert_eq!(cost, initial);
        assert_eq!(tour.order(), &[0, 1, 2, 3]);
    }

    #[test]
    fn run_with_all_moves_disabled_returns_initial_cost() {
        let m = crossing_matrix();
        let mut tour = Tour::new(vec![0, 1, 2, 3]);
        let cost = LocalSearch::new(&m)
            .with_two_opt(false)
            .with_or_opt(false)
            .run(&mut tour);
        assert_eq!(cost, 12);
    }
}
