use std::path::Path;

use anyhow::Result;
use clap::Parser;

use transcribe_translate::{Credentials, logging, server, settings};

#[derive(Parser, Debug)]
#[command(
    name = "transcribe-translate",
    version,
    about = "Transcribe uploaded audio and translate the transcript"
)]
struct Cli {
    /// Address to listen on (overrides [server] addr)
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = settings::load_settings(cli.read_settings.as_deref().map(Path::new))?;
    logging::init(cli.verbose, &settings.log_level)?;
    if let Some(addr) = cli.addr {
        settings.server_addr = addr;
    }
    let credentials = Credentials::from_env(&settings)?;
    server::run_server(settings, credentials).await
}
