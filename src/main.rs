use std::fs;

use log::info;

use tsp_solve_core::{Instance, Report, Result, SolverInput, SolverOptions, logging, solve};

fn main() -> Result<()> {
    let options = SolverOptions::from_args()?;
    logging::init_logger(&options)?;

    run(options)
}

fn run(options: SolverOptions) -> Result<()> {
    let input = SolverInput::from_options(&options)?;
    info!("input: {input}");

    let instance = Instance::parse(input.text())?;
    let solution = solve(&instance, &options)?;

    let report = Report::new(&instance, &solution.tour, solution.cost);
    let json = report.to_json()?;

    match options.output_path() {
        Some(path) => fs::write(path, format!("{json}\n"))?,
        None => println!("{json}"),
    }

    solution.tour.metrics(&instance.matrix);

    Ok(())
}
