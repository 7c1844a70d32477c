use std::process::exit;

use clap::Parser;
use rolldog_config::Config;
use tracing::error;

use rolldog::cli::{self, Cli, Commands};
use rolldog::{logger, Error};

fn main() {
    let cli = Cli::parse();
    logger::setup();

    match run(cli) {
        Ok(code) => exit(code),
        Err(err) => {
            error!("{}", err);
            exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32, Error> {
    match cli.command {
        Commands::Plan { queries } => {
            let config = Config::load(&cli.config)?;
            cli::plan(&config, &queries)?;
            Ok(0)
        }

        Commands::Prepare { data_path } => {
            let config = Config::load(&cli.config)?;
            cli::prepare(&config, &data_path)?;
            Ok(0)
        }

        Commands::Verify {
            baseline,
            candidate,
        } => {
            // Non-zero exit on any mismatch, for use in CI.
            if cli::verify(&baseline, &candidate)? {
                Ok(0)
            } else {
                Ok(1)
            }
        }

        Commands::Configcheck => {
            cli::config_check(&cli.config)?;
            Ok(0)
        }
    }
}
