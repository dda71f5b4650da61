mod client_manager;
mod game;
mod network;

use clap::Parser;
use log::info;
use network::Server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Maximum number of connected peers
    #[arg(short, long, default_value = "8")]
    max_clients: usize,

    /// Put a player controlled by the host process itself on the pitch.
    /// This binary captures no keyboard input; the player stays on its
    /// spawn point unless an embedding frontend feeds
    /// `Server::set_local_input`.
    #[arg(short = 'n', long)]
    player_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    info!("Starting host on {}", address);

    let mut server = Server::new(&address, args.max_clients).await?;

    if let Some(name) = &args.player_name {
        server.add_host_player(name);
        info!("Host player '{}' joined the pitch", name);
    }

    server.run().await?;

    Ok(())
}
