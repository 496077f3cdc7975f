use clap::Parser;
use std::path::PathBuf;

use interview_server::config::Config;
use interview_server::serve;

#[derive(Parser, Debug)]
#[command(author, version, about = "AI interview session backend")]
struct Args {
    /// Path to config file (TOML format); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }

    serve::run_server(config)
}
