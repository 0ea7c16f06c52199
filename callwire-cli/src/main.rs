use anyhow::{Context, Result};
use callwire_client::WsSignalChannel;
use callwire_core::{ParticipantId, Room, RoomId, RoomStatus, RoomStore};
use callwire_relay::{RelayConfig, RelayService};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "callwire")]
#[command(about = "Signal relay and room administration for two-party calls")]
struct Cli {
    /// Log filter, e.g. `info` or `callwire_relay=debug`.
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the signal relay until Ctrl-C.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        bind: SocketAddr,
    },

    /// Creates, inspects or ends rooms on a running relay.
    Room {
        #[arg(long, default_value = "ws://127.0.0.1:8787")]
        relay: String,

        #[command(subcommand)]
        action: RoomAction,
    },
}

#[derive(Subcommand)]
enum RoomAction {
    Create {
        /// Room id to claim; generated when omitted.
        #[arg(long)]
        id: Option<String>,

        #[arg(long, default_value_t = 30)]
        minutes: u64,
    },
    Status {
        id: String,
    },
    End {
        id: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).context("Invalid --log filter")?)
        .init();

    match cli.command {
        Commands::Serve { bind } => serve(bind).await,
        Commands::Room { relay, action } => room(&relay, action).await,
    }
}

async fn serve(bind: SocketAddr) -> Result<()> {
    println!("{}", "📡 Starting callwire relay...".green().bold());
    println!("   🔌 WebSocket: ws://{}/ws/<participant>", bind);
    println!("   💓 Health:    http://{}/health", bind);

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
        }
    };

    callwire_relay::serve(RelayConfig { bind }, RelayService::in_memory(), shutdown).await?;

    println!("{}", "👋 Relay stopped".cyan());
    Ok(())
}

async fn room(relay: &str, action: RoomAction) -> Result<()> {
    let channel = WsSignalChannel::connect(relay, ParticipantId::new_guest())
        .await
        .with_context(|| format!("Failed to reach relay at {}", relay))?;

    match action {
        RoomAction::Create { id, minutes } => {
            let room = channel
                .create_room(id.map(RoomId::from), Duration::from_secs(minutes * 60))
                .await
                .context("Failed to create room")?;
            println!("{}", "✨ Room created".green().bold());
            print_room(&room);
        }
        RoomAction::Status { id } => {
            let room = channel
                .room(&RoomId::from(id))
                .await
                .context("Failed to look up room")?;
            print_room(&room);
        }
        RoomAction::End { id, yes } => {
            let room_id = RoomId::from(id);
            if !yes && !confirm_end(&room_id)? {
                println!("{}", "Cancelled".yellow());
                return Ok(());
            }
            let room = channel
                .end_room(&room_id)
                .await
                .context("Failed to end room")?;
            println!("{}", "🛑 Room ended".red().bold());
            print_room(&room);
        }
    }

    Ok(())
}

fn confirm_end(room_id: &RoomId) -> Result<bool> {
    Confirm::new()
        .with_prompt(format!("End room {} for every participant?", room_id))
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

fn print_room(room: &Room) {
    let status = match room.status {
        RoomStatus::Active => "active".green(),
        RoomStatus::Ended => "ended".red(),
    };
    println!("   🏷  Id:       {}", room.id.to_string().bold());
    println!("   📶 Status:   {}", status);
    println!("   ⏱  Duration: {} min", room.duration.as_secs() / 60);
    if let Some(ended_at) = room.ended_at {
        let lasted = ended_at
            .duration_since(room.created_at)
            .unwrap_or_default();
        println!("   ⌛ Lasted:   {}s", lasted.as_secs());
    }
}
