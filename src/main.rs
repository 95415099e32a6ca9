use clap::{Arg, Command};
use std::fs;
use std::path::Path;
use std::process;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs a stderr subscriber, but only when `RUST_LOG` is set.
///
/// Enable with `RUST_LOG=yail=debug` or `RUST_LOG=yail=trace`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

fn main() {
    init_tracing();

    let matches = Command::new("yail")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tree-walking interpreter for the YAIL language")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let interactive = matches.get_flag("interactive");
    if let Some(file_path) = matches.get_one::<String>("file") {
        if !run_file(file_path) && !interactive {
            process::exit(1);
        }
        if !interactive {
            return;
        }
    }
    yail::start_repl();
}

fn run_file(path: &str) -> bool {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        return false;
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.display().to_string();
            tracing::debug!(file = %filename, bytes = source.len(), "running file");
            yail::run(&source, Some(&filename))
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            false
        }
    }
}
