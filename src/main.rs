//! odinscan — run the scanning agents over a source tree and emit one document

use clap::Parser;

use odinscan::cli::{self, Args, EXIT_CONFIG_ERROR};
use odinscan::logging::init_logging;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = match init_logging(&args.log_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let exit_code = cli::run(args).await;
    drop(_guard);
    std::process::exit(exit_code);
}
