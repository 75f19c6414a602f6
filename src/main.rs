// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use orm_sandbox::app_config::{self, Config};
use orm_sandbox::database::Session;
use orm_sandbox::demo;
use orm_sandbox::errors::AppError;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for orm-sandbox
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// orm-sandbox - create, read, update and delete students through a session
#[derive(Parser, Debug)]
#[command(name = "orm-sandbox")]
#[command(version)]
#[command(about = "ORM walkthrough over an embedded SQLite store")]
#[command(long_about = "orm-sandbox declares a students table with integrity constraints, \
then inserts, queries, updates and deletes records through a unit-of-work session, \
printing each step.

EXAMPLES:
    orm-sandbox                                 # Run against an in-memory store
    orm-sandbox --echo                          # Also log every SQL statement
    orm-sandbox --database students.db          # Keep the data in a file
    orm-sandbox completions bash > orm-sandbox.bash

CONFIGURATION:
    An optional JSON file (orm-sandbox.json by default) may set
    database.path, database.echo and log_level. Command line flags win.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "orm-sandbox.json")]
    config_path: PathBuf,

    /// Database file path, or :memory:
    #[arg(short, long)]
    database: Option<String>,

    /// Log every SQL statement
    #[arg(short, long)]
    echo: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Stderr logger with colour per level
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                tag,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> ExitCode {
    // Trace lets every record through; the max level does the filtering.
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "orm-sandbox", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(options: CommandLineOptions) -> Result<(), AppError> {
    let mut config = Config::load_or_default(&options.config_path)
        .map_err(|e| AppError::Config(format!("{:#}", e)))?;

    // Override config with CLI options if provided
    if let Some(path) = options.database {
        config.database.path = path;
    }
    if options.echo {
        config.database.echo = true;
    }
    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }

    config
        .validate()
        .map_err(|e| AppError::Config(format!("Configuration validation failed: {:#}", e)))?;
    log::set_max_level(config.log_level.to_level_filter());
    debug!("Effective configuration: {:?}", config);

    let mut session = Session::open(&config.database)?;
    info!("Database ready at {}", session.connection().path().display());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = demo::run(&mut session, &mut out)?;
    out.flush()?;

    info!(
        "Walkthrough finished with {} student(s) remaining",
        report.remaining.len()
    );
    debug!("{}", session.connection().stats()?);

    Ok(())
}
