//! wcadm binary entry point.

use std::process::ExitCode;

use log::LevelFilter;

fn main() -> ExitCode {
    let debug = std::env::args().any(|arg| arg == "--debug");
    init_logging(debug);

    match wcadm::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// `--debug` forces debug level; otherwise `RUST_LOG` applies, default warn.
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}
