use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::*;

use lnview::config::parse_args_and_config;
use lnview::driver::Driver;
use lnview::file_source::FileSource;
use lnview::util::setup_logging;
use lnview_core::Models;

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args_and_config();
    fs::create_dir_all(&args.datadir)
        .with_context(|| format!("creating {}", args.datadir.display()))?;
    setup_logging(&args.datadir, "lnview", &args.log_level)?;

    let snapshot = args.snapshot_path();
    info!("lnview: watching {}", snapshot.display());
    let source = Arc::new(FileSource::new(&snapshot));
    let models = Arc::new(Models::new(source, args.models_config()));
    let driver = Driver::new(models, args.pubsub_config(), args.refresh_interval());

    let (shutdown_trigger, shutdown_signal) = triggered::trigger();
    ctrlc::set_handler(move || {
        shutdown_trigger.trigger();
    })
    .context("setting Ctrl-C handler")?;

    driver.run(shutdown_signal).await;
    Ok(())
}
