use clap::Parser;
use patchstack::cli::output::Output;
use patchstack::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        Output::error(&e);
        std::process::exit(e.exit_code());
    }
}
