//! Write a seeded synthetic trajectory in the binary format read by `twodes`.

use anyhow::Context;
use clap::Parser;
use log::info;
use traj::Frames;

#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// output directory, created if needed
    #[arg(value_parser, default_value_t = String::from("."))]
    dir: String,

    /// number of one-exciton states
    #[arg(short, long, default_value_t = 4)]
    singles: usize,

    /// number of frames
    #[arg(short, long, default_value_t = 1000)]
    length: usize,

    /// spread of the site energies in cm-1
    #[arg(short, long, default_value_t = 100.0)]
    width: f32,

    /// random seed
    #[arg(short = 'r', long, default_value_t = 42)]
    seed: u64,

    /// also write cluster labels, cycling through this many clusters frame by
    /// frame
    #[arg(short, long)]
    clusters: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();
    let args = Args::parse();
    let mut frames =
        Frames::random(args.singles, args.length, args.width, args.seed);
    if let Some(n) = args.clusters {
        let n = n.max(1);
        frames = frames.with_clusters(|f| (f % n) as i32);
    }
    std::fs::create_dir_all(&args.dir)
        .with_context(|| format!("failed to create {}", args.dir))?;
    let written = frames
        .write(&args.dir)
        .with_context(|| format!("failed to write frames to {}", args.dir))?;
    info!("wrote {} frames of {} states", frames.len(), args.singles);
    info!("{written:?}");
    Ok(())
}
