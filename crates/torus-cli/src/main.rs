use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "torusplace",
    about = "Place shaped jobs onto a 3D torus",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a placement table for a job set.
    ///
    /// Torus, policy and jobs come from --config, from flags, or both
    /// (flags win). The table is written as JSON to --output, or stdout.
    Place(commands::place::PlaceArgs),
    /// Write a torusplace.toml scaffold
    Init {
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        path: String,
        /// Torus dimensions, WxLxH
        #[arg(short, long, default_value = "4x4x4")]
        dims: String,
        /// Placement policy
        #[arg(long, default_value = "first-fit")]
        policy: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Merge per-job comm_group.json files through a placement table
    Groups {
        /// Placement table produced by `place`
        #[arg(short, long)]
        placement: String,
        /// Directory holding one sub-directory per job
        #[arg(short, long)]
        input: String,
        /// Comma-separated jobs to merge (default: every job in the table)
        #[arg(long, value_delimiter = ',')]
        traces: Option<Vec<String>>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("torusplace=info".parse()?)
                .add_directive("torus_placement=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Place(args) => commands::place::place(&args),
        Commands::Init { path, dims, policy, force } => {
            commands::init::init(&path, &dims, &policy, force)
        }
        Commands::Groups { placement, input, traces, output } => {
            commands::groups::groups(&placement, &input, traces.as_deref(), output.as_deref())
        }
    }
}
