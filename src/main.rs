/*
 *  main.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use tokio::signal::unix::{signal, SignalKind};

use pistatus::config::{self, Cli};
use pistatus::display::{DisplaySurface, DisplaySurfaceFactory, FontBook};
use pistatus::metrics::SystemSampler;
use pistatus::scheduler::{RefreshScheduler, SchedulerSettings};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP.
async fn signal_handler() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Blanking display and exiting.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Blanking display and exiting.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Blanking display and exiting.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        print!("{}", serde_yaml::to_string(&cfg).context("serializing configuration")?);
        return Ok(());
    }

    let level = if cli.debug {
        "debug".to_string()
    } else {
        cfg.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} - host status at a glance", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    // fonts first: no point touching the panel without them
    let fonts = FontBook::load(&cfg.fonts.clone().unwrap_or_default()).context("loading fonts")?;

    let display_cfg = cfg.display.clone().unwrap_or_default();
    let mut surface = DisplaySurfaceFactory::create_from_config(&display_cfg)
        .context("opening display")?;
    surface.init().context("initializing display")?;
    let (width, height) = surface.dimensions();
    info!("Display ready: {}x{}", width, height);

    let sampler = SystemSampler::new(&cfg.sampler.clone().unwrap_or_default());
    let settings = SchedulerSettings::from_config(&cfg, &fonts).context("loading font rules")?;
    let mut scheduler = RefreshScheduler::new(sampler, surface, fonts, settings)
        .context("starting refresh loop")?;

    // signals get their own task; the panel is blanked once the cycle in flight ends
    let signals = tokio::spawn(signal_handler());
    let outcome = tokio::select! {
        res = scheduler.run() => res.context("refresh loop stopped"),
        res = signals => res.context("signal handler task failed").and_then(|r| r),
    };

    if let Err(e) = scheduler.blank() {
        warn!("Could not blank display: {}", e);
    }
    if let Err(e) = outcome.as_ref() {
        error!("{:#}", e);
    }
    outcome
}
