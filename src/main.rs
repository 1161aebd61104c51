#![forbid(unsafe_code)]

//! cadra — Complex Active Directory Risk Assessment CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    let exit_code = cli_app::run(&args).map_or_else(
        |e| {
            eprintln!("cadra: {e}");
            e.exit_code()
        },
        |()| 0,
    );
    std::process::exit(exit_code);
}
