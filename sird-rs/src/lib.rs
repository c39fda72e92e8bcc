//! Stochastic SIRD epidemic on a spatial grid, spread over a random
//! radius-limited contact graph.

pub mod contact;
pub mod error;
pub mod outbreak;
pub mod parameters;
pub mod population;
pub mod run_context;
pub mod simulate;

pub use contact::{ContactEdge, ContactGraph, ContactGraphBuilder, EDGE_TARGET_OFFSET, Sampling};
pub use error::{Result, SirdError};
pub use outbreak::{Outbreak, OutbreakModel};
pub use parameters::Parameters;
pub use population::{Coord, Population, Status, StatusCounts};
pub use run_context::RunContext;
pub use simulate::{EpidemicSimulator, SimulationHistory};
