use std::process::ExitCode;

use clap::error::ErrorKind;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vsdte::options::Options;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = match Options::try_parse_from(&args) {
        Ok(options) => options,
        Err(e) => {
            let (text, status) = parse_failure(&args, &e);
            print!("{text}");
            return ExitCode::from(status);
        }
    };

    match run_main(&options) {
        Ok(report) => {
            info!(
                working_dirs = report.working_dirs_set,
                config = report.config_set,
                startup = report.startup_set,
                closed = report.closed,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// What to print when the command line can't be used, and the exit status.
fn parse_failure(args: &[String], e: &clap::Error) -> (String, u8) {
    use std::fmt::Write;

    // --help and --version
    if !e.use_stderr() {
        return (e.to_string(), 0);
    }

    let reason = if e.kind() == ErrorKind::MissingRequiredArgument {
        "The --solution option is required.".to_string()
    } else {
        let message = e.to_string();
        message
            .lines()
            .map(str::trim)
            .take_while(|line| !line.starts_with("Usage:") && !line.starts_with("tip:"))
            .filter(|line| !line.is_empty())
            .map(|line| line.trim_start_matches("error: "))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut text = String::new();
    let _ = writeln!(text, "Oops! {reason}");
    let command_line = args.get(1..).unwrap_or_default().join(" ");
    let _ = writeln!(text, "Command line: {command_line}\n");
    let _ = writeln!(text, "VSTool command line usage");
    let _ = writeln!(text, "{}", Options::usage());
    (text, 1)
}

#[cfg(windows)]
fn run_main(options: &Options) -> vsdte::Result<vsdte::session::Report> {
    use vsdte::dte::DteAutomation;
    use vsdte::{Error, com, session};

    // SAFETY: every COM object is created and released inside the closure.
    let result = unsafe {
        com::with_com(|| {
            let _filter = com::MessageFilter::register()
                .map_err(|e| Error::com("CoRegisterMessageFilter", e))?;
            session::run(&DteAutomation, options)
        })
    };
    result.map_err(|e| Error::com("CoInitializeEx", e))?
}

#[cfg(not(windows))]
fn run_main(_options: &Options) -> vsdte::Result<vsdte::session::Report> {
    Err(vsdte::Error::Unsupported)
}
