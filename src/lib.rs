pub mod blob;
pub mod calendar;
pub mod config;
pub mod dataset;
pub mod gateway;
pub mod resolver;
pub mod state;
pub mod tabular;

use tracing::info;

use crate::config::Config;
use crate::dataset::builder::DatasetBuilder;
use crate::state::AppState;

/// Loads the configured GTFS feed into `state`. Installed atomically on
/// success; a load-time failure here is the caller's cue to exit non-zero
/// rather than start the listener.
pub fn load_dataset(config: &Config, state: &AppState) -> anyhow::Result<()> {
    let source = config.build_blob_source()?;
    info!("loading GTFS feed");
    let dataset = DatasetBuilder::new(&source).build()?;
    info!(
        shapes = dataset.shapes.len(),
        stops = dataset.stops.len(),
        routes = dataset.routes.len(),
        trips = dataset.trips.len(),
        "GTFS feed loaded"
    );
    state.install(dataset);
    Ok(())
}
