mod cli;

use std::process::ExitCode;

use clap::Parser;

pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Children are killed and batches stop once this fires; see img::cancel.
    if let Err(e) = ctrlc::set_handler(img::cancel::request) {
        log::warn!("could not install the interrupt handler: {e}");
    }

    let args = cli::Cli::parse();
    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            // A failed child's own exit code is passed through unchanged.
            e.exit_code()
                .and_then(|code| u8::try_from(code).ok())
                .filter(|&code| code != 0)
                .map_or(ExitCode::FAILURE, ExitCode::from)
        }
    }
}
