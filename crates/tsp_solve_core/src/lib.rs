//! Symmetric TSP solving on TSPLIB instances: a Christofides-style
//! construction refined by 2-opt / or-opt local search, emitted as JSON.

pub(crate) mod algo;
mod error;
mod graph;
mod io;
pub mod logging;
mod matrix;
mod report;
mod solver;
mod tour;
mod tsplib;

pub(crate) use io::options;

pub use algo::LocalSearch;
pub use error::{Error, Result};
pub use graph::{Edge, Graph};
pub use io::input::SolverInput;
pub use io::options::{LogFormat, LogLevel, SolverOptions};
pub use matrix::{Distance, Matrix};
pub use report::Report;
pub use solver::{Solution, solve};
pub use tour::Tour;
pub use tsplib::{Instance, Node, WeightKind};
