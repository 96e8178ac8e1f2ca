//! hospital-sim — the dispatch kernel's entry point. Loads configuration,
//! builds the shared `Bus`, spawns the four subsystem coordinators, then
//! runs the kernel's command loop against stdin until shutdown.

use std::io::BufReader;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};

use common::config::Config;
use ipc::Bus;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = match std::env::args().nth(1) {
        Some(config_path) => {
            let config = Config::load(std::path::Path::new(&config_path))?;
            info!(%config_path, "hospital simulator starting");
            config
        }
        None => {
            info!("no config path given, starting with built-in defaults");
            Config::default()
        }
    };

    let bus = Arc::new(Bus::new(config));

    let triage_handles = triage::spawn(bus.clone());
    let surgery_handles = surgery::spawn(bus.clone());
    let lab_handles = lab::spawn(bus.clone());
    let pharmacy_handles = pharmacy::spawn(bus.clone());

    let input = BufReader::new(std::io::stdin());
    let code = kernel::run(bus, input);

    for handle in triage_handles.threads {
        let _ = handle.join();
    }
    for handle in surgery_handles.threads {
        let _ = handle.join();
    }
    for handle in lab_handles.threads {
        let _ = handle.join();
    }
    for handle in pharmacy_handles.threads {
        let _ = handle.join();
    }

    info!("hospital simulator exiting");
    std::process::exit(code);
}
