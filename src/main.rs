use std::process::ExitCode;

use loose_shape::{cli, logging};

fn main() -> ExitCode {
    let command_line_interface = cli::CommandLineInterface::load();
    logging::init(command_line_interface.verbose());
    match command_line_interface.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(?error, "command failed");
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
