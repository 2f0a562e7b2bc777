//! Process startup: arguments, configuration, logging, then the subcommand

use crate::app::cli::args::{Args, Command};
use crate::app::commands;
use crate::app::error::{AppError, AppResult};
use crate::core::config::{ConfigError, Configuration};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::dispatcher::api::TaskRequest;
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;

/// Entry point used by the binary
pub fn startup() -> ExitCode {
    let args = Args::parse();
    let use_color = args.use_color(std::io::stderr().is_terminal());
    colored::control::set_override(use_color);

    let config = if args.needs_configuration() {
        Configuration::resolve_path(args.config.clone())
            .and_then(|path| Configuration::from_file(&path))
            .map(Some)
    } else {
        Ok(None)
    };

    let log_config = config.as_ref().ok().and_then(|c| c.as_ref()).map(|c| &c.log);
    let log_level = args
        .log_level
        .as_deref()
        .or(log_config.map(|l| l.level.as_str()));
    let log_format = args
        .log_format
        .as_deref()
        .or(log_config.map(|l| l.format.as_str()));
    let log_file = args
        .log_file
        .as_deref()
        .or(log_config.and_then(|l| l.file.as_deref()));

    if let Err(e) = init_logging(log_level, log_format, log_file, use_color) {
        eprintln!("Unable to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log_error_with_context(&AppError::from(e), "Loading configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = config.as_ref().and_then(|c| c.filename.as_ref()) {
        log::debug!("Configuration loaded from {}", path.display());
    }

    match run(args.command, config, use_color) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error_with_context(&e, "snapscan");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: Option<Configuration>, use_color: bool) -> AppResult<()> {
    let configured = || config.clone().ok_or(AppError::Config(ConfigError::Unspecified));

    match command {
        Command::Receivers => {
            let (receivers, _) = commands::builtin_registries()?;
            println!("{}", commands::render_names("receiver", &receivers.list()));
        }
        Command::Scanners => {
            let (_, scanners) = commands::builtin_registries()?;
            println!("{}", commands::render_names("scanner", &scanners.list()));
        }
        Command::Serve => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(AppError::Runtime)?;
            runtime.block_on(commands::serve(configured()?))?;
        }
        Command::Submit {
            target_type,
            target,
            scanners,
        } => {
            let request = TaskRequest::new(target_type, target, scanners);
            let task = commands::submit(&configured()?, request)?;
            println!("{}", task.id);
        }
        Command::List { area } => {
            let tasks = commands::list(&configured()?, area)?;
            println!("{}", commands::render_list(&tasks, use_color));
        }
        Command::Show { id } => {
            let (area, task) = commands::show(&configured()?, &id)?;
            println!("{}", commands::render_task(area, &task)?);
        }
    }
    Ok(())
}
