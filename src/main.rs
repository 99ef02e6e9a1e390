use anyhow::Result;
use clap::{Parser, Subcommand};

use basalt::board::Position;
use basalt::{bench, perft, uci};

#[derive(Parser, Debug)]
#[command(author, version, about = "UCI chess engine", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the fixed-depth benchmark suite and print the node signature
    Bench {
        #[arg(long, default_value_t = bench::DEFAULT_DEPTH)]
        depth: i32,
    },
    /// Count leaf nodes of the move generator from a position
    Perft {
        #[arg(long, default_value_t = 5)]
        depth: u32,
        /// Position to count from, startpos when omitted
        #[arg(long)]
        fen: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Some(Command::Bench { depth }) => bench::run(depth)?,
        Some(Command::Perft { depth, fen }) => {
            let pos = match fen {
                Some(f) => Position::from_fen(&f)?,
                None => Position::startpos(),
            };
            perft::perft_divide(&pos, depth);
        }
        None => uci::Uci::new().run_loop(),
    }
    Ok(())
}
