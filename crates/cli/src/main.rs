// prefile CLI - manifest transformation and pre-alert dispatch

mod download;
mod exit_codes;
mod forecast;
mod net;
mod prealert;
mod prompt;
mod rate;
mod run;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use prefile_config::{ConfigError, Settings};
use prefile_engine::EngineError;

use exit_codes::{engine_exit_code, EXIT_CONFIG, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "prefile")]
#[command(about = "Customs pre-filing for TEMU air-cargo manifests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform manifests, update the register, and send pre-alerts
    #[command(after_help = "\
Each waybill is looked up in the register, its manifest {awb}.xlsx is
transformed through the arrival station's pipeline, and the pre-alert
goes out with the waybill document attached.

Examples:
  prefile run 160-12345675
  prefile run 160-12345675,160-12345686 --update
  prefile run 160-12345675 --dry-run
  prefile run")]
    Run {
        /// Waybill numbers (comma or space separated; prompted when omitted)
        awbs: Vec<String>,

        /// Mark the pre-alert as an update (subject prefix)
        #[arg(long)]
        update: bool,

        /// Transform only: skip download, mail, and register save
        #[arg(long)]
        dry_run: bool,

        /// Continue with remaining waybills after a classification halt
        #[arg(long)]
        keep_going: bool,

        /// Suppress progress notes
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Fetch and print the exchange rate
    Rate,

    /// Validate settings and probe catalog and register reachability
    Check,

    /// Settings file utilities
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the settings file location
    Path,
    /// Print the effective settings as TOML
    Show,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: prefile <command> [options]");
            eprintln!("       prefile --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            awbs,
            update,
            dry_run,
            keep_going,
            quiet,
        }) => run::cmd_run(awbs, update, dry_run, keep_going, quiet),
        Some(Commands::Rate) => cmd_rate(),
        Some(Commands::Check) => run::cmd_check(),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => cmd_config_path(),
            ConfigCommands::Show => cmd_config_show(),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self {
            code: exit_codes::EXIT_USAGE,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_CONFIG,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self {
            code: exit_codes::EXIT_DATA,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn review(msg: impl Into<String>) -> Self {
        Self {
            code: exit_codes::EXIT_REVIEW,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self {
            code: exit_codes::EXIT_NETWORK,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        Self {
            code: exit_codes::EXIT_MAIL,
            message: msg.into(),
            hint: None,
        }
    }

    /// Wrap an engine error with its registered exit code.
    pub fn engine(err: &EngineError) -> Self {
        let hint = match err {
            EngineError::WaybillNotFound { .. } => {
                Some("check register_paths in settings (prefile config show)".to_string())
            }
            EngineError::UnknownStation { .. } => {
                Some("the register's arrival-station column carries an unsupported code".to_string())
            }
            _ => None,
        };
        Self {
            code: engine_exit_code(err),
            message: err.to_string(),
            hint,
        }
    }

    /// Wrap a settings error.
    pub fn settings(err: ConfigError) -> Self {
        Self {
            code: EXIT_CONFIG,
            message: err.to_string(),
            hint: None,
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// rate / config
// ============================================================================

fn cmd_rate() -> Result<(), CliError> {
    let settings = Settings::load().map_err(CliError::settings)?;
    let client = rate::RateClient::new(&settings.rate_url);
    let rate = client.fetch()?;
    println!("{rate}");
    Ok(())
}

fn cmd_config_path() -> Result<(), CliError> {
    println!("{}", Settings::path().display());
    Ok(())
}

fn cmd_config_show() -> Result<(), CliError> {
    let settings = Settings::load().map_err(CliError::settings)?;
    print!("{}", settings.to_toml().map_err(CliError::settings)?);
    Ok(())
}
