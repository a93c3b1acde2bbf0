// renderer_main.rs
//
// Minimal stand-in for the external renderer: listens for the snapshot
// stream, decodes each direction record, and prints it as JSON.
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crossroad_sim::communication::messages::decode_direction_record;
use crossroad_sim::global_variables::RENDERER_ADDR;

#[derive(Parser)]
#[command(name = "crossroad_renderer")]
#[command(about = "Snapshot stream listener for the crossroad simulation")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = RENDERER_ADDR)]
    listen: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let listener = match TcpListener::bind(&cli.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("cannot listen on {}: {}", cli.listen, e);
            std::process::exit(1);
        }
    };
    log::info!("[Renderer] listening on {}", cli.listen);

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                log::info!("[Renderer] simulation connected from {}", peer);
                show_snapshots(socket).await;
                log::info!("[Renderer] simulation disconnected");
            }
            Err(e) => log::warn!("[Renderer] accept failed: {}", e),
        }
    }
}

async fn show_snapshots(socket: TcpStream) {
    let mut lines = BufReader::new(socket).lines();
    let mut record = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        record.push_str(&line);
        record.push('\n');
        // A record's last line is the closing "]." of the vehicle list.
        if !line.ends_with("].") {
            continue;
        }
        match decode_direction_record(&record) {
            Ok(snapshot) => match serde_json::to_string(&snapshot) {
                Ok(json) => println!("{}", json),
                Err(e) => log::warn!("[Renderer] cannot serialize snapshot: {}", e),
            },
            // A malformed record is dropped, the stream keeps going.
            Err(e) => log::warn!("[Renderer] dropping malformed record: {}", e),
        }
        record.clear();
    }
}
