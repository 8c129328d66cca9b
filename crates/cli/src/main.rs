use std::process::ExitCode;

fn main() -> ExitCode {
    medicord_cli::run()
}
