use linkpack_core::logging;

mod cli;
mod http;
mod runtime;

use crate::cli::Cli;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_stderr());

    let rt = match runtime::build() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("linkpack error: {:#}", err);
            std::process::exit(1);
        }
    };
    let result = rt.block_on(cli.run());
    runtime::shutdown(rt, runtime::SHUTDOWN_GRACE);

    if let Err(err) = result {
        eprintln!("linkpack error: {:#}", err);
        std::process::exit(1);
    }
}
