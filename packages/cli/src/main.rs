use clap::Parser;
use tracing_subscriber::EnvFilter;

use nodetree_cli::{run, Cli};

fn main() {
    // Logs go to stderr; stdout carries only the command's JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error [cli.output]: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("error [{}]: {}", e.code(), e);
            std::process::exit(1);
        }
    }
}
