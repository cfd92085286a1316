use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = lead_relay::cli::Cli::parse();
    if let Err(e) = lead_relay::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
