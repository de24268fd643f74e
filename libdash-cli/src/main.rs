mod args;
mod commands;

use args::Cli;
use clap::Parser;
use core_service::CoreError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = commands::run(cli).await {
        eprintln!("Error: {}", e);
        if e
            .downcast_ref::<CoreError>()
            .is_some_and(CoreError::is_unauthenticated)
        {
            eprintln!("Run `libdash login <email> --password <password>` to sign in.");
        }
        std::process::exit(1);
    }
}
