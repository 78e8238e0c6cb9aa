use anyhow::{Context, Result};
use coffeechat_core::{Config, ProviderBackend, RunOptions, Scheduler};
use tracing::debug;

use crate::render::{ConsoleProgress, Render};
use crate::utils::tui;

/// Switches from the command line.
pub struct Flags {
    pub dry_run: bool,
    pub send_email: bool,
}

pub async fn run(flags: Flags) -> Result<()> {
    let config = Config::load().context("Could not load coffeechat config")?;
    let backend = ProviderBackend::from_config(&config.provider);

    let options = RunOptions {
        dry_run: flags.dry_run,
        send_email: flags.send_email,
        ..RunOptions::new(&config)
    };

    debug!(
        provider = backend.provider().name(),
        dry_run = options.dry_run,
        send_email = options.send_email,
        "starting schedule run"
    );

    if options.dry_run {
        println!("Dry run: no events will be created.\n");
    }

    let mut progress = ConsoleProgress::new(tui::create_spinner("Loading roster".to_string()));
    let result = Scheduler::new(&config, &backend, options).run(&mut progress).await;
    progress.finish();

    let report = result.with_context(|| {
        format!(
            "Scheduling aborted. If the session expired, run `coffeechat auth {}`",
            backend.provider().name()
        )
    })?;

    println!("\n{}", report.render());

    Ok(())
}
