//! Dictionaria submission converter CLI.

use clap::{ColorChoice, Parser};
use dict_cli::commands::{run_check, run_ls, run_repair, run_stat};
use dict_cli::logging::{LogConfig, LogFormat, init_logging};
use dict_cli::pipeline::{ProcessOptions, process_submission};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::summary::{print_findings, print_stats, print_submissions, print_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let repos = cli.repos.as_deref();
    let result = match &cli.command {
        Command::Process(args) => {
            let options = ProcessOptions {
                repos: cli.repos.clone(),
                output_dir: args.output_dir.clone(),
                dry_run: args.dry_run,
            };
            process_submission(&args.submission, &options).map(|result| print_summary(&result))
        }
        Command::Check(args) => {
            run_check(&args.submission, repos).map(|result| print_findings(&result.findings))
        }
        Command::Stat(args) => run_stat(&args.submission, repos).map(|stats| print_stats(&stats)),
        Command::Repair(args) => run_repair(&args.submission, repos).map(|repaired| {
            println!("Repaired {repaired} homonym collision(s).");
        }),
        Command::Ls(args) => run_ls(&args.dir).map(|listings| print_submissions(&listings)),
    };
    let exit_code = match result {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
