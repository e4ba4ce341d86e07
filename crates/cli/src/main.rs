use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use pv_cli::cli::{self, Cli, Command, ConfigCommand};
use pv_domain::config::ObservabilityConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let (config, config_path) = cli::load_config()?;
    init_tracing(&config.observability);

    let code = match args.command {
        Command::Scan { dir, json } => {
            cli::scan::run(&config, &dir, json)?;
            0
        }
        Command::Patch { dir, out } => {
            cli::patch::run(&config, &dir, &out)?;
            0
        }
        Command::MockClient { out } => {
            let module = pv_mockgen::generate_mock_client();
            match out {
                Some(path) => std::fs::write(&path, module)?,
                None => print!("{module}"),
            }
            0
        }
        Command::Tree { dir } => {
            cli::tree::run(&dir)?;
            0
        }
        Command::Boot { dir, workdir } => cli::boot::run(&config, &dir, workdir).await?,
        Command::Config(ConfigCommand::Validate) => {
            if cli::config::validate(&config, &config_path) {
                0
            } else {
                1
            }
        }
        Command::Config(ConfigCommand::Show) => {
            cli::config::show(&config)?;
            0
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Compact logs on stderr, or JSON when `observability.json_logs` is set.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pv_sandbox=debug"));

    if obs.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
