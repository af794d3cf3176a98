// FILE: crates/cli/src/main.rs

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};

mod commands;
mod config;

fn build_cli() -> Command {
    Command::new("netfetch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fetch a URL as a single network action")
        .arg(Arg::new("url").required(true).value_name("URL").help("Address to fetch"))
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the body to FILE"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML settings file"),
        )
        .arg(
            Arg::new("si")
                .long("si")
                .help("Report sizes in powers of 1000")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("precision")
                .short('p')
                .long("precision")
                .value_name("DIGITS")
                .help("Decimals used when picking the size unit")
                .value_parser(value_parser!(i32)),
        )
        .arg(
            Arg::new("head")
                .long("head")
                .help("Send a HEAD request instead of GET")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-bytes")
                .long("max-bytes")
                .value_name("BYTES")
                .help("Keep at most BYTES of the body")
                .value_parser(value_parser!(usize)),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();
    let settings = commands::FetchSettings::from_matches(&matches)?;
    commands::fetch_url(settings).await
}
