use clap::Parser;
use servlet_engine::cli::{run_cli, Cli};
use servlet_engine::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logging = init_logging_with_config(&LogConfig::from_env())?;
    run_cli(cli)
}
