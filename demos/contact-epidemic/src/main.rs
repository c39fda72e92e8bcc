pub mod output;

use grid_sird::{OutbreakModel, Parameters, Population, RunContext, SirdError};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SirdError> {
    // stdout may carry CSV output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = RunContext::<Parameters>::load()?;
    let parameters: &Parameters = ctx
        .input
        .as_ref()
        .ok_or(SirdError::EmptyInput)?;

    let initial = ctx
        .file("initial_state")
        .map(Population::from_csv_path)
        .transpose()?;

    info!(
        replicate = ctx.replicate,
        rows = parameters.rows,
        cols = parameters.cols,
        days = parameters.n_days,
        "starting run"
    );
    let outbreak = OutbreakModel::simulate(parameters, initial)?;

    ctx.write_csv("daily_counts.csv", &output::daily_counts(&outbreak.history))?;
    if ctx.output_dir().is_some() {
        ctx.write_csv("contact_graph.csv", &output::edge_rows(&outbreak.graph))?;
    }
    Ok(())
}
