use clap::{Parser, ValueEnum};
use log::info;
use server::game::RaceSession;
use server::network::{BoxError, Server};
use shared::{CircuitConfig, DragConfig, TieBreak};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TieBreakArg {
    /// Exact ties are reported as a draw
    Draw,
    /// Exact ties go to the first racer
    FirstRacer,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::Draw => TieBreak::Draw,
            TieBreakArg::FirstRacer => TieBreak::FirstRacer,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Laps needed to finish the circuit race
    #[arg(short = 'l', long, default_value = "3", allow_negative_numbers = true)]
    total_laps: i32,

    /// X coordinate of the drag race finish line
    #[arg(short = 'f', long, default_value = "20.0", allow_negative_numbers = true)]
    finish_line: f32,

    /// How an exact drag race tie is settled
    #[arg(short = 't', long, value_enum, default_value = "draw")]
    tie_break: TieBreakArg,

    /// Directory of static client files to serve
    #[arg(short = 's', long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let circuit_config = CircuitConfig::with_laps(args.total_laps);
    let drag_config = DragConfig {
        finish_line_x: args.finish_line,
        tie_break: args.tie_break.into(),
        ..DragConfig::default()
    };
    let session = RaceSession::new(circuit_config, drag_config)?;

    info!("Starting race server...");
    info!(
        "Circuit: {} laps, drag finish line at x = {}, ties: {:?}",
        args.total_laps, args.finish_line, args.tie_break
    );

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::new(&address, session, args.static_dir).await?;

    server.run().await?;

    Ok(())
}
