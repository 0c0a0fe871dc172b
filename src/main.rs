use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use resmut::catalog::{self, CatalogOptions, DEFAULT_COLUMN};
use resmut::evaluate::PositionPolicy;
use resmut::report::{self, IdCleanup, ReportSummary, ScreenConfig};
use resmut::seqio::SequenceStore;

#[derive(Parser)]
#[command(name = "resmut")]
#[command(version)]
#[command(about = "Screen translated CDS sequences for catalogued resistance mutations")]
#[command(long_about = r#"
resmut - resistance mutation screening of translated CDS sequences

For every sequence in the translation FASTA and every rule in the mutation
catalog, reports whether the rule's residues are present at its positions.

RULES:
  F264L          Single mutation: residue L expected at position 264 (1-based)
  K272M+F264L    Combination: every listed mutation must be present

OUTPUT:
  CSV with columns: seqName, Gene, Mutation, Detected, Note
  Fields are not quoted; embedded , " \ and line breaks are backslash-escaped.

POSITIONS PAST THE END OF A SEQUENCE:
  Reported as Absent with an explanatory note, unless --strict-positions
  is given, in which case the run fails.

EXAMPLES:
  resmut --cds-translation nextclade.cds_translation.F.fasta \
         --resistance-mutation-list mutations.csv --gene F -o results.csv

  # Drop a reference qualifier from sequence names
  resmut --cds-translation f.fasta --resistance-mutation-list m.csv --gene F \
         --strip-id " Human respiratory syncytial virus B isolate X, complete genome"
"#)]
struct Args {
    #[arg(long = "cds-translation", value_name = "FILE", help_heading = "Input")]
    cds_translation: PathBuf,

    #[arg(long = "resistance-mutation-list", value_name = "FILE", help_heading = "Input")]
    resistance_mutation_list: PathBuf,

    #[arg(long, value_name = "NAME", default_value = DEFAULT_COLUMN, help_heading = "Input")]
    column: String,

    #[arg(long, value_name = "LABEL", help_heading = "Input")]
    gene: String,

    #[arg(short = 'o', long, value_name = "FILE", help_heading = "Output")]
    output: Option<PathBuf>,

    #[arg(long = "strip-id", value_name = "TEXT", allow_hyphen_values = true, help_heading = "Output")]
    strip_id: Vec<String>,

    #[arg(long = "strip-id-file", value_name = "FILE", help_heading = "Output")]
    strip_id_file: Option<PathBuf>,

    #[arg(long = "strict-positions", help_heading = "Detection")]
    strict_positions: bool,

    #[arg(short = 't', long, value_name = "NUM", default_value = "0", help_heading = "Runtime")]
    threads: usize,

    #[arg(short = 'v', long, help_heading = "Runtime")]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("RESMUT_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn build_config(args: &Args) -> Result<ScreenConfig> {
    let mut cleanup = IdCleanup::new(args.strip_id.iter().cloned());
    if let Some(path) = &args.strip_id_file {
        cleanup.extend(IdCleanup::from_file(path)?);
    }
    if !cleanup.patterns().is_empty() {
        debug!(count = cleanup.patterns().len(), "identifier cleanup rules");
    }

    Ok(ScreenConfig {
        gene: args.gene.clone(),
        cleanup,
        position_policy: if args.strict_positions {
            PositionPolicy::Strict
        } else {
            PositionPolicy::Report
        },
        threads: args.threads,
    })
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    let start_time = Instant::now();
    init_tracing(args.verbose);

    if args.threads == 0 {
        args.threads = num_cpus::get();
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .ok();

    let config = build_config(&args)?;

    let sequences = SequenceStore::open(&args.cds_translation)?;
    if sequences.is_empty() {
        warn!(path = %args.cds_translation.display(), "no sequences found");
    }
    info!(count = sequences.len(), "loaded sequences");

    let options = CatalogOptions {
        column: args.column.clone(),
        delimiter: None,
    };
    let specs = catalog::load(&args.resistance_mutation_list, &options)?;
    info!(count = specs.len(), "loaded mutation rules");

    let rows = report::build(&sequences, &specs, &config)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output: {}", path.display()))?;
            report::write_report(BufWriter::new(file), &rows)?;
            info!(path = %path.display(), "wrote report");
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            report::write_report(&mut out, &rows)?;
            out.flush()?;
        }
    }

    let summary = ReportSummary::from_rows(&rows);
    if summary.out_of_range > 0 {
        warn!(
            assertions = summary.out_of_range,
            "positions beyond sequence end were reported as Absent"
        );
    }
    info!(
        rows = summary.rows,
        present = summary.present,
        absent = summary.absent,
        threads = args.threads,
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "done"
    );

    Ok(())
}
