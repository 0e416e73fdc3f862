use std::process::ExitCode;

fn main() -> ExitCode {
    uebuild_app::app::launch()
}
