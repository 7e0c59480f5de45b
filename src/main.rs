use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use clap::error::ErrorKind;
use line_calc::PipelineError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const USAGE: &str = "Usage: line_calc input.txt output.txt";

/// Evaluates one `<int> <op> <int>` expression per line and writes
/// `expression=result` lines.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File with one expression per line
    #[arg(allow_hyphen_values = true)]
    input: OsString,
    /// Destination for the results, truncated before the run
    #[arg(allow_hyphen_values = true)]
    output: OsString,
    #[arg(hide = true, allow_hyphen_values = true, trailing_var_arg = true)]
    _rest: Vec<OsString>,
}

fn main() {
    install_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            tracing::debug!("{e}");
            println!("{USAGE}");
            process::exit(1);
        }
        Err(e) => e.exit(),
    };
    let input = PathBuf::from(args.input);
    let output = PathBuf::from(args.output);

    if let Err(e) = line_calc::clear_output(&output) {
        println!("Error clearing output file: {e}");
        fail(e);
    }

    if let Err(e) = line_calc::process_file(&input, &output) {
        println!("Error processing file: {e}");
        fail(e);
    }

    println!("Calculation results written to {}", output.display());
}

fn fail(e: PipelineError) -> ! {
    tracing::debug!("{:?}", miette::Report::new(e));
    process::exit(1);
}

fn install_tracing() {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .with_filter(filter_layer);

    tracing_subscriber::registry().with(fmt_layer).init();
}
