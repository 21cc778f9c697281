use std::process::ExitCode;

fn main() -> ExitCode {
    sir_ode::runner::run()
}
