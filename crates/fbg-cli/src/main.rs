//! Feedback grid CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use fbg_cli::config::Settings;
use fbg_cli::host::{GridHost, HostError};
use fbg_cli::logging::{LogConfig, LogFormat, init_logging};
use fbg_model::{NoticeReceiver, Notices};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_edit, run_history, run_page, run_save};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("error: failed to start runtime: {error}");
            std::process::exit(1);
        }
    };

    let (notices, mut receiver) = Notices::channel();
    let exit_code = runtime.block_on(run(&cli, notices));
    print_notices(&mut receiver);
    std::process::exit(exit_code);
}

async fn run(cli: &Cli, notices: Notices) -> i32 {
    let host = match Settings::load(cli.config.as_deref())
        .map_err(HostError::from)
        .and_then(|settings| GridHost::connect(settings, notices))
    {
        Ok(host) => host,
        Err(error) => {
            eprintln!("error: {error}");
            return 1;
        }
    };

    let outcome = match &cli.command {
        Command::Page(args) => run_page(&host, args).await.map(|()| 0),
        Command::Edit(args) => run_edit(&host, args).map(|()| 0),
        Command::Save(args) => run_save(&host, args)
            .await
            .map(|result| i32::from(!result.success && !result.is_noop())),
        Command::History(args) => run_history(&host, args).await.map(|()| 0),
    };
    match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    }
}

fn print_notices(receiver: &mut NoticeReceiver) {
    let mut notices = Vec::new();
    while let Ok(notice) = receiver.try_recv() {
        notices.push(notice);
    }
    if notices.is_empty() {
        return;
    }
    eprintln!("Warnings:");
    for notice in notices {
        eprintln!("- {notice}");
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level_filter = match cli.log_level {
        Some(LogLevelArg::Error) => LevelFilter::ERROR,
        Some(LogLevelArg::Warn) => LevelFilter::WARN,
        Some(LogLevelArg::Info) => LevelFilter::INFO,
        Some(LogLevelArg::Debug) => LevelFilter::DEBUG,
        Some(LogLevelArg::Trace) => LevelFilter::TRACE,
        None => cli.verbosity.tracing_level_filter(),
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let mut config = LogConfig::default()
        .with_level_filter(level_filter)
        .with_format(format)
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
