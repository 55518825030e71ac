use clap::Parser;
use comm::{Communicator, Topology};
use log::{error, info};
use twodes::{config::Config, die, engine, max_threads, output};

/// two-dimensional electronic spectra from exciton trajectories
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// input file
    #[arg(value_parser, default_value_t = String::from("twodes.toml"))]
    infile: String,

    /// Overwrite existing output from a previous run. Defaults to false.
    #[arg(short, long, default_value_t = false)]
    overwrite: bool,

    /// Print the version and exit. Defaults to false.
    #[arg(short, long, default_value_t = false)]
    version: bool,

    /// Set the maximum number of threads to use. Defaults to 0, which means to
    /// use as many threads as there are CPUS.
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Number of in-process group members to split the samples over. Ignored
    /// when running under MPI.
    #[arg(short = 'n', long, default_value_t = 1)]
    processes: usize,

    /// Number of consecutive group members sharing a node for the first
    /// reduction tier. Ignored when running under MPI.
    #[arg(short, long, default_value_t = 1)]
    local: usize,

    /// Serialize the input file to JSON and exit.
    #[arg(short, default_value_t = false, hide = true)]
    json: bool,
}

/// run the calculation on one member of `topology`, taking the whole group
/// down on failure
fn finish<C: Communicator>(config: &Config, topology: &Topology<C>) {
    if let Err(e) = engine::run(config, topology) {
        error!("{e}");
        topology.world.abort(1);
    }
    if topology.is_root() {
        info!("normal termination of twodes");
    }
}

#[cfg(feature = "mpi")]
fn launch(config: &Config, args: &Args) {
    if args.processes != 1 || args.local != 1 {
        log::warn!("ignoring -n and -l under MPI");
    }
    let Some(universe) = comm::mpi::initialize() else {
        die!("failed to initialize MPI");
    };
    finish(config, &comm::mpi::topology(&universe));
}

#[cfg(not(feature = "mpi"))]
fn launch(config: &Config, args: &Args) {
    comm::threads::launch(args.processes, args.local, |t| finish(config, &t));
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();
    let args = Args::parse();
    if args.version {
        println!("version: {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    let config = match Config::load(&args.infile) {
        Ok(c) => c,
        Err(e) => die!("{e}"),
    };
    if args.json {
        match serde_json::to_string(&config) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                die!("failed to serialize {} with {e}", args.infile);
            }
        };
        return;
    }
    if output::exists(&config.output_dir) && !args.overwrite {
        die!(
            "existing output in {}. overwrite with -o/--overwrite",
            config.output_dir
        );
    }
    max_threads(args.threads);
    info!("{config}");

    launch(&config, &args);
}
