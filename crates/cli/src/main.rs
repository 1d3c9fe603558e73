use std::process::ExitCode;

fn main() -> ExitCode {
    mspquote_cli::run()
}
