use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::algo::{christofides, local_search::LocalSearch};
use crate::error::Result;
use crate::matrix::Distance;
use crate::options::SolverOptions;
use crate::tour::Tour;
use crate::tsplib::Instance;

static INTERRUPT_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Shared stop flag raised by Ctrl-C; the search loop polls it and returns
/// the best tour found so far.
fn interrupt_flag() -> Arc<AtomicBool> {
    INTERRUPT_FLAG
        .get_or_init(|| {
            let flag = Arc::new(AtomicBool::new(false));
            let handler_flag = Arc::clone(&flag);
            if let Err(err) = ctrlc::set_handler(move || {
                handler_flag.store(true, Ordering::Relaxed);
            }) {
                log::warn!("solver: failed to install interrupt handler err={err}");
            }
            flag
        })
        .clone()
}

#[derive(Debug)]
pub struct Solution {
    pub tour: Tour,
    pub cost: Distance,
    /// Cost of the constructive tour before local search.
    pub initial_cost: Distance,
}

/// Runs the construction and improvement stages on a parsed instance.
pub fn solve(instance: &Instance, options: &SolverOptions) -> Result<Solution> {
    let n = instance.dimension;
    let now = Instant::now();

    let mut tour = christofides::construct(&instance.matrix);
    let initial_cost = tour.cost(&instance.matrix);
    log::info!(
        "solver: constructed n={n} cost={initial_cost} secs={:.2}",
        now.elapsed().as_secs_f32()
    );

    let deadline = (options.time_limit > 0)
        .then(|| Instant::now() + Duration::from_secs(options.time_limit));
    let cost = LocalSearch::new(&instance.matrix)
        .with_two_opt(options.two_opt)
        .with_or_opt(options.or_opt)
        .with_deadline(deadline)
        .with_stop_flag(interrupt_flag())
        .run(&mut tour);

    tour.validate(n)?;
    log::info!(
        "solver: complete n={n} cost={cost} improvement={} secs={:.2}",
        initial_cost - cost,
        now.elapsed().as_secs_f32()
    );

    Ok(Solution {
        tour,
        cost,
        initial_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::solve;
    use crate::options::SolverOptions;
    use crate::tsplib::Instance;

    #[test]
    fn solve_single_city_returns_zero_cost() {
        let instance = Instance::parse(
            "DIMENSION: 1\nEDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n1 5.0 5.0\nEOF\n",
        )
        .expect("parse");
        let solution = solve(&instance, &SolverOptions::default()).expect("solve");

        assert_eq!(solution.tour.order(), &[0]);
        assert_eq!(solution.cost, 0);
    }

    #[test]
    fn solve_two_cities_pays_the_edge_twice() {
        let instance = Instance::parse(
            "DIMENSION: 2\nEDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n1 0 0\n2 3 4\nEOF\n",
        )
        .expect("parse");
        let solution = solve(&instance, &SolverOptions::default()).expect("solve");

        assert_eq!(solution.tour.order(), &[0, 1]);
        assert_eq!(solution.cost, 10);
    }

    #[test]
    fn solve_never_returns_worse_than_the_construction() {
        let instance = Instance::parse(
            "DIMENSION: 5\nEDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n\
             1 0 0\n2 10 0\n3 10 10\n4 0 10\n5 5 5\nEOF\n",
        )
        .expect("parse");
        let solution = solve(&instance, &SolverOptions::default()).expect("solve");

        assert!(solution.cost <= solution.initial_cost);
        assert_eq!(solution.cost, solution.tour.cost(&instance.matrix));
        solution.tour.validate(5).expect("permutation");
    }
}
