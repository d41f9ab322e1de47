use marker_signal_common::config::Config;
use marker_signal_controller::control::{ControlLoop, LoopSettings};
use marker_signal_controller::link::{open_serial, SignalTransmitter};
use marker_signal_controller::observer;
use marker_signal_controller::{detector, policy, source, ControlError};
use std::path::PathBuf;
use tracing::{error, info};

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        serial = config.serial.path,
        baud = config.serial.baud_rate,
        mode = ?config.source.mode,
        policy = ?config.detection.effective_policy(),
        interest_ids = ?config.detection.interest_ids,
        rate_hz = config.control.rate_hz,
        debug = config.debug.enabled,
        "starting marker-signal controller"
    );

    if let Err(e) = run(&config) {
        error!(error = %e, "controller stopped");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), ControlError> {
    // Serial link first, then the camera.
    let link = open_serial(&config.serial)?;
    let frames = source::open_source(config)?;
    let markers = detector::open_detector(&config.detection)?;
    let presence = policy::from_config(&config.detection);

    let mut control = ControlLoop::new(
        LoopSettings::try_from(config)?,
        frames,
        markers,
        presence,
        SignalTransmitter::new(link),
    );
    for watcher in observer::from_config(config)? {
        control = control.with_observer(watcher);
    }

    control.run()
}
