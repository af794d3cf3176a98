// FILE: crates/cli/src/commands.rs

use crate::config::FetchConfig;
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use netaction::{
    human_readable_size, Fetch, HttpTransport, NetAction, SharedTransport, TaskEvent,
    TaskListener, TaskStatus, UnitSystem,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything one fetch needs, resolved from flags and the config file
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub url: String,
    pub output: Option<PathBuf>,
    pub head: bool,
    pub max_bytes: Option<usize>,
    pub config: FetchConfig,
}

impl FetchSettings {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>("url")
            .ok_or_else(|| anyhow::anyhow!("URL is required"))?
            .clone();

        let mut config = match matches.get_one::<String>("config") {
            Some(path) => FetchConfig::load(Path::new(path)).context("Failed to load config")?,
            None => FetchConfig::default(),
        };

        if matches.get_flag("si") {
            config.decimal_units = true;
        }
        if let Some(precision) = matches.get_one::<i32>("precision") {
            config.precision = *precision;
        }
        config.validate().context("Invalid settings")?;

        Ok(Self {
            url,
            output: matches.get_one::<String>("output").map(PathBuf::from),
            head: matches.get_flag("head"),
            max_bytes: matches.get_one::<usize>("max-bytes").copied(),
            config,
        })
    }

    fn behavior(&self) -> Fetch {
        let fetch = if self.head { Fetch::head() } else { Fetch::new() };
        match self.max_bytes {
            Some(max) => fetch.with_max_bytes(max),
            None => fetch,
        }
    }
}

/// Byte count for the formatter, saturating instead of wrapping negative
fn byte_count<T: TryInto<i64>>(bytes: T) -> i64 {
    bytes.try_into().unwrap_or(i64::MAX)
}

fn format_progress(received: u64, total: Option<u64>, units: UnitSystem, precision: i32) -> String {
    let received = human_readable_size(byte_count(received), units, precision);
    match total {
        Some(total) => format!(
            "{} / {}",
            received,
            human_readable_size(byte_count(total), units, precision)
        ),
        None => received,
    }
}

fn progress_listener(units: UnitSystem, precision: i32) -> TaskListener {
    Arc::new(move |event: &TaskEvent| match event {
        TaskEvent::Started => log::debug!("Transfer started"),
        TaskEvent::Progress { received, total } => {
            eprint!("\r{}   ", format_progress(*received, *total, units, precision));
        }
        TaskEvent::Succeeded | TaskEvent::Failed(_) | TaskEvent::Cancelled => eprintln!(),
    })
}

/// Fetch one URL and write or summarize the body
pub async fn fetch_url(settings: FetchSettings) -> Result<()> {
    let units = settings.config.unit_system();
    let precision = settings.config.precision;

    let transport: SharedTransport = Arc::new(
        HttpTransport::with_config(settings.config.client_config())
            .context("Failed to create HTTP transport")?,
    );

    let mut action = NetAction::parse(&settings.url, settings.behavior())?;
    action.subscribe(progress_listener(units, precision));

    let cancel = action.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    action.start(transport)?;
    let status = action.run().await;

    match status {
        TaskStatus::Succeeded => {}
        TaskStatus::Failed(reason) => bail!("{} failed: {}", settings.url, reason),
        TaskStatus::Cancelled => bail!("{} was cancelled", settings.url),
        other => bail!("{} ended in unexpected state {}", settings.url, other),
    }

    let fetch = action.into_behavior();
    if fetch.overflowed() {
        log::warn!("Body truncated to {} bytes", fetch.len());
    }

    let size = human_readable_size(byte_count(fetch.len()), units, precision);
    match &settings.output {
        Some(path) => {
            tokio::fs::write(path, fetch.body())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Saved {} to {}",
                style("✓").green(),
                style(size).bold(),
                path.display()
            );
        }
        None => println!("{} Received {}", style("✓").green(), style(size).bold()),
    }

    Ok(())
}
