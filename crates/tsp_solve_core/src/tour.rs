use crate::error::{Error, Result};
use crate::matrix::{Distance, Matrix};

/// Cyclic visit order over cities `0..n`; the last city connects back to the
/// first.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tour {
    order: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct TourMetrics {
    pub total: Distance,
    pub longest: Distance,
    pub average: f64,
}

impl Tour {
    pub fn new(order: Vec<usize>) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub(crate) fn order_mut(&mut self) -> &mut Vec<usize> {
        &mut self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total length including the wraparound edge. A two-city tour pays the
    /// connecting edge twice.
    pub fn cost(&self, matrix: &Matrix) -> Distance {
        let n = self.order.len();
        (0..n)
            .map(|i| matrix.get(self.order[i], self.order[(i + 1) % n]))
            .sum()
    }

    /// Checks that the tour is a permutation of `0..n`.
    pub fn validate(&self, n: usize) -> Result<()> {
        if self.order.len() != n {
            return Err(Error::invalid_instance(format!(
                "tour visits {} cities, expected {n}",
                self.order.len()
            )));
        }
        let mut seen = vec![false; n];
        for &city in &self.order {
            if city >= n {
                return Err(Error::invalid_instance(format!(
                    "tour city {city} out of range 0..{n}"
                )));
            }
            if seen[city] {
                return Err(Error::invalid_instance(format!(
                    "tour visits city {city} twice"
                )));
            }
            seen[city] = true;
        }
        Ok(())
    }

    pub fn metrics(&self, matrix: &Matrix) -> TourMetrics {
        let n = self.order.len();
        if n < 2 {
            log::info!("metrics: n={n} total=0 longest=0 avg=0");
            return TourMetrics::default();
        }

        let distances: Vec<Distance> = (0..n)
            .map(|i| matrix.get(self.order[i], self.order[(i + 1) % n]))
            .collect();
        let total = distances.iter().sum();
        let longest = distances.iter().copied().max().unwrap_or(0);
        let average = total as f64 / n as f64;

        log::info!("metrics: n={n} total={total} longest={longest} avg={average:.1}");

        TourMetrics {
            total,
            longest,
            average,
        }
    }
}
