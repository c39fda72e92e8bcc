use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};

use crate::contact::{ContactGraph, ContactGraphBuilder};
use crate::error::{Result, SirdError};
use crate::parameters::Parameters;
use crate::population::Population;
use crate::simulate::{EpidemicSimulator, SimulationHistory};

/// Contact graph and daily history of a completed run.
#[derive(Debug, Clone)]
pub struct Outbreak {
    pub graph: ContactGraph,
    pub history: SimulationHistory,
}

pub struct OutbreakModel {}

impl OutbreakModel {
    /// Validates `parameters`, then draws the initial grid (unless one is
    /// given), builds the contact graph and runs `n_days`. All randomness
    /// comes from one `StdRng` seeded with `parameters.seed`.
    pub fn simulate(parameters: &Parameters, initial: Option<Population>) -> Result<Outbreak> {
        parameters.validate()?;
        let mut rng = StdRng::seed_from_u64(parameters.seed);

        let mut live = match initial {
            Some(grid) => {
                if grid.rows() != parameters.rows || grid.cols() != parameters.cols {
                    return Err(SirdError::GridShape {
                        expected_rows: parameters.rows,
                        expected_cols: parameters.cols,
                        rows: grid.rows(),
                        cols: grid.cols(),
                    });
                }
                warn!("using supplied initial state, alpha parameters ignored");
                grid
            }
            None => Population::random(
                parameters.rows,
                parameters.cols,
                parameters.alpha_infected,
                parameters.alpha_recovered,
                &mut rng,
            )?,
        };

        let graph = ContactGraphBuilder::new(
            parameters.rows,
            parameters.cols,
            parameters.radius,
            parameters.mean_degree,
        )
        .target_offset(parameters.edge_target_offset)
        .max_attempts(parameters.max_attempts)
        .sampling(parameters.sampling)
        .build(&mut rng)?;

        let simulator = EpidemicSimulator::new(
            &graph,
            parameters.gamma,
            parameters.beta_recovered,
            parameters.beta_death,
        )?;
        let history = simulator.run(&mut live, parameters.n_days, &mut rng)?;

        let last = history.last().counts();
        info!(
            seed = parameters.seed,
            edges = graph.len(),
            mean_degree = graph.mean_degree(),
            days = parameters.n_days,
            susceptible = last.susceptible,
            infected = last.infected,
            recovered = last.recovered,
            dead = last.dead,
            "outbreak simulated"
        );
        Ok(Outbreak { graph, history })
    }
}
