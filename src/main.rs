use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bwalign::align::{self, AlignOpt};
use bwalign::index::{FMIndex, IndexMeta, IndexParams};
use bwalign::io;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "bwalign", author, version, about = "FM-index seeded short-read aligner", arg_required_else_help = true)]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the FM index of a reference FASTA (first record only)
    Index {
        /// Reference FASTA file
        reference: String,
        /// Output prefix; the index is written to <prefix>.fm
        #[arg(short, long, default_value = "ref")]
        output: String,
        /// Suffix-array sampling interval K
        #[arg(long = "sa-interval", default_value_t = 5)]
        sample_interval: u32,
        /// Rank checkpoint interval C
        #[arg(long = "checkpoint-interval", default_value_t = 5)]
        checkpoint_interval: u32,
    },
    /// Align FASTQ reads against an index and write SAM
    Align {
        /// Path to FM index (.fm)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Reads FASTQ file
        reads: String,
        /// Output SAM path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        #[arg(short = 'k', long = "seed-length", default_value_t = 19)]
        seed_length: usize,
        /// Distance between seed windows (0 = seed length, non-overlapping)
        #[arg(long = "seed-stride", default_value_t = 0)]
        seed_stride: usize,
        /// Skip seeds with more hits than this (0 = unlimited)
        #[arg(long = "max-occ", default_value_t = 0)]
        max_occurrences: usize,
        #[arg(long = "mismatch", default_value_t = 2)]
        mismatch_cost: i32,
        #[arg(long = "gap-open", default_value_t = 2)]
        gap_open_cost: i32,
        #[arg(long = "gap-ext", default_value_t = 2)]
        gap_extend_cost: i32,
        #[arg(long = "band-width", default_value_t = 10, allow_negative_numbers = true)]
        band_width: i32,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
        #[arg(long = "batch-size", default_value_t = 4096)]
        batch_size: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.quiet { "warn" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command {
        Commands::Index { reference, output, sample_interval, checkpoint_interval } => {
            run_index(&reference, &output, IndexParams { sample_interval, checkpoint_interval })
        }
        Commands::Align {
            index,
            reads,
            out,
            seed_length,
            seed_stride,
            max_occurrences,
            mismatch_cost,
            gap_open_cost,
            gap_extend_cost,
            band_width,
            threads,
            batch_size,
        } => {
            let opt = AlignOpt {
                seed_length,
                seed_stride,
                max_occurrences,
                mismatch_cost,
                gap_open_cost,
                gap_extend_cost,
                band_width,
                threads,
                batch_size,
            };
            align::align_fastq_with_opt(&index, &reads, out.as_deref(), opt)?;
            Ok(())
        }
    }
}

fn run_index(reference: &str, output: &str, params: IndexParams) -> Result<()> {
    params.validate()?;
    let rec = io::fasta::read_reference(reference)?;
    info!(reference, name = %rec.id, len = rec.seq.len(), "reference loaded");

    let mut fm = FMIndex::build(&rec.id, &rec.seq, params)
        .map_err(|e| anyhow::anyhow!("cannot index '{}': {}", reference, e))?;
    fm.set_meta(IndexMeta {
        reference_file: Some(reference.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });

    let out_path = format!("{}.fm", output);
    fm.save_to_file(&out_path)?;
    info!(path = %out_path, "FM index saved");
    Ok(())
}
