//! statreg host
//!
//! Usage: `statreg-host [config.yaml] [replay.yaml]`
//!
//! - Loads config (strict parsing + validate) and pre-registers counters
//! - Runs the replay script if one is given, on a manual clock
//! - Prints the Prometheus rendering of the sink
//! - Serves `/metrics` and `/stats.json` when `http.enabled`

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use statreg_core::ManualClock;
use statreg_host::{app_state::HostState, config, replay, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let cfg_path = args.next().unwrap_or_else(|| "statreg.yaml".to_owned());
    let replay_path = args.next();

    let cfg = config::load_from_file(&cfg_path)?;
    let serve = cfg.http.enabled.then(|| cfg.http.listen.clone());

    let state = match replay_path {
        Some(path) => {
            let script = replay::load_from_file(&path)?;
            let clock = Arc::new(ManualClock::new());
            let state = HostState::with_clock(cfg, clock.clone())?;
            let outcomes = replay::run(&state, Some(clock.as_ref()), &script)?;
            tracing::info!(%path, steps = outcomes.len(), "replay finished");
            state
        }
        None => HostState::new(cfg)?,
    };

    print!("{}", state.sink().render());

    if let Some(listen) = serve {
        let listen: SocketAddr = listen.parse()?;
        let app = router::build_router(state);
        tracing::info!(%listen, "statreg-host serving");
        let listener = tokio::net::TcpListener::bind(listen).await?;
        axum::serve(listener, app).await?;
    }
    Ok(())
}
