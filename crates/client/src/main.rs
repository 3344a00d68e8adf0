mod game;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use exodus::{Client, ClientConfig, ConnectionState, MalformedDatagramPolicy, outbound};
use game::GameState;

#[derive(Parser)]
#[command(name = "exodus-client")]
#[command(about = "Headless Space Exodus network client")]
struct Args {
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = exodus::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value = "pilot")]
    username: String,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, default_value_t = 2, help = "I/O worker threads")]
    workers: usize,

    #[arg(long, help = "Local UDP port (defaults to the TCP local port)")]
    udp_port: Option<u16>,

    #[arg(long, default_value_t = exodus::codec::DEFAULT_MAX_FRAME_LEN, help = "Largest accepted TCP frame in bytes")]
    max_frame_len: usize,

    #[arg(long, help = "Drop malformed datagrams instead of disconnecting")]
    drop_malformed: bool,

    #[arg(long, default_value_t = 0, help = "Movement inputs sent over UDP each tick")]
    inputs: usize,

    #[arg(long, help = "Exit after this many seconds")]
    duration: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ClientConfig {
        port: args.port,
        worker_threads: args.workers,
        udp_local_port: args.udp_port,
        max_frame_len: args.max_frame_len,
        malformed_datagram: if args.drop_malformed {
            MalformedDatagramPolicy::Drop
        } else {
            MalformedDatagramPolicy::Disconnect
        },
        ..Default::default()
    };

    let mut client = Client::new(config, game::dispatch_table()?)?;
    let mut state = GameState::new(client.connection().clone(), args.username.clone());

    client.connect(&args.host)?;
    run(&mut client, &mut state, &args);

    client.disconnect();
    log::info!(
        "Received {} messages from server{}",
        state.total_received(),
        client
            .connection()
            .last_disconnect_reason()
            .map(|reason| format!(" ({})", reason))
            .unwrap_or_default()
    );

    Ok(())
}

fn run(client: &mut Client<GameState>, state: &mut GameState, args: &Args) {
    let tick = Duration::from_secs(1) / args.tick_rate.max(1);
    let deadline = args.duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    let inputs = vec![false; args.inputs];

    loop {
        let started = Instant::now();

        client.update(state);

        if !client.is_connected() {
            log::warn!("Connection lost");
            break;
        }
        if state.game_over {
            break;
        }
        if deadline.is_some_and(|deadline| started >= deadline) {
            log::info!("Run time elapsed");
            break;
        }

        if !inputs.is_empty() && client.state() == ConnectionState::Connected {
            if let Err(e) = outbound::player_movement(client.connection(), &inputs) {
                log::debug!("Movement not sent: {}", e);
            }
        }

        let elapsed = started.elapsed();
        if elapsed < tick {
            thread::sleep(tick - elapsed);
        }
    }
}
