use std::process::ExitCode;

use loxc_driver::{Config, Session};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match Config::parse(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(64);
        }
    };

    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(70);
        }
    };

    match session.run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(70)
        }
    }
}
