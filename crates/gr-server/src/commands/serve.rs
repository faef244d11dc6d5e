use std::path::Path;
use std::time::Duration;

use gr_simulation::{SimConfig, Simulation};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::net;
use crate::store::JsonFileStore;

pub fn run(
    listen: &str,
    map: Option<&Path>,
    content: Option<&Path>,
    data: &Path,
    tick_ms: u64,
    max_players: usize,
    seed: u64,
) -> Result<(), String> {
    if tick_ms == 0 {
        return Err("tick period must be at least 1 ms".into());
    }
    let (map, content) = super::load_world(map, content)?;
    let store = JsonFileStore::open(data)
        .map_err(|e| format!("cannot open character store {}: {e}", data.display()))?;
    let config = SimConfig::default()
        .with_seed(seed)
        .with_tick_period(Duration::from_millis(tick_ms))
        .with_max_players(max_players);
    let config = super::walkable_spawn(config, &map)?;

    let mut sim = Simulation::new(map, content, Box::new(store), config);
    sim.populate()
        .map_err(|e| format!("cannot populate world: {e}"))?;
    sim.init()
        .map_err(|e| format!("simulation init failed: {e}"))?;
    info!(characters = %data.display(), "character store ready");

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("cannot start runtime: {e}"))?;
    runtime.block_on(async {
        let listener = TcpListener::bind(listen)
            .await
            .map_err(|e| format!("cannot listen on {listen}: {e}"))?;
        let shutdown = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutdown requested"),
                Err(e) => {
                    error!(error = %e, "cannot watch for ctrl-c");
                    std::future::pending::<()>().await;
                }
            }
        };
        net::serve_until(listener, sim, shutdown)
            .await
            .map_err(|e| format!("server failed: {e}"))?;
        Ok::<(), String>(())
    })
}
