//! Simple signaling server example
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:3456
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:3456
//!   cargo run --example simple_server 127.0.0.1:9000     # binds to 127.0.0.1:9000
//!
//! Seeds one broadcast (id 1) in an in-memory store. Connect with any
//! WebSocket client and send JSON messages, e.g.:
//!
//!   {"type":"join-room","liveId":1}
//!   {"type":"start-stream","liveId":1}
//!   {"type":"offer","liveId":1,"targetId":2,"sdp":{"sdp":"v=0..."}}
//!   {"type":"new-comment","liveId":1,"comment":{"text":"hello"}}

use std::net::SocketAddr;
use std::sync::Arc;

use signaling_rs::{MemoryBroadcastStore, ServerConfig, SignalingServer};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:3456
/// - "127.0.0.1" -> 127.0.0.1:3456
/// - "127.0.0.1:9000" -> 127.0.0.1:9000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 3456;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: simple_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:3456)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:3456".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("signaling_rs=debug".parse()?)
                .add_directive("simple_server=debug".parse()?),
        )
        .init();

    let store = Arc::new(MemoryBroadcastStore::new());
    let broadcast = store.create("Demo live", "In-memory demo broadcast", "demo").await;

    let config = ServerConfig::with_addr(bind_addr);

    println!("Starting signaling server on {}", config.bind_addr);
    println!();
    println!("Seeded broadcast id {} (join with liveId {})", broadcast.id, broadcast.id);
    println!("Connect: websocat ws://{}/", config.bind_addr);
    println!();

    let server = SignalingServer::new(config, store);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    let snapshot = server.stats().snapshot();
    println!(
        "Served {} connections, routed {} messages",
        snapshot.total_connections, snapshot.messages_routed
    );

    Ok(())
}
