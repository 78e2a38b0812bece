use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use hvconv::archive::{ArchiveStore, TarballStore};
use hvconv::convergence::{ConvergenceDriver, ReferenceBasis, WorkerPool};
use hvconv::reference::ReferenceSetBuilder;
use hvconv::{Direction, Result, RunConfig};
use tracing_subscriber::EnvFilter;

fn config_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("config")
            .long("config")
            .short('c')
            .value_parser(value_parser!(PathBuf))
            .help("JSON run configuration"),
    )
    .arg(
        Arg::new("objectives")
            .long("objectives")
            .value_delimiter(',')
            .help("Objective column names, comma separated"),
    )
    .arg(
        Arg::new("directions")
            .long("directions")
            .value_delimiter(',')
            .value_parser(value_parser!(Direction))
            .help("One of min/max per objective, comma separated"),
    )
    .arg(
        Arg::new("epsilons")
            .long("epsilons")
            .value_delimiter(',')
            .value_parser(value_parser!(f64))
            .help("Epsilon per objective, comma separated"),
    )
    .arg(
        Arg::new("variants")
            .long("variants")
            .value_delimiter(',')
            .help("Run-variant identifiers, comma separated"),
    )
    .arg(Arg::new("nfe").long("nfe").help("Target NFE as written in archive names"))
    .arg(
        Arg::new("input-dir")
            .long("input-dir")
            .value_parser(value_parser!(PathBuf))
            .help("Directory holding .tar.gz archive bundles"),
    )
    .arg(
        Arg::new("output-dir")
            .long("output-dir")
            .value_parser(value_parser!(PathBuf))
            .help("Directory receiving reference sets and score tables"),
    )
    .arg(
        Arg::new("threads")
            .long("threads")
            .value_parser(value_parser!(usize))
            .help("Worker threads for hypervolume scoring"),
    )
}

fn cli() -> Command {
    Command::new("hvconv")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reference sets and hypervolume convergence of archived multi-objective runs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(config_args(
            Command::new("reference-set")
                .about("Build the epsilon non-dominated reference set of every variant"),
        ))
        .subcommand(
            config_args(Command::new("hypervolume").about("Score every generation of run files"))
                .arg(
                    Arg::new("reference-set")
                        .long("reference-set")
                        .value_parser(value_parser!(PathBuf))
                        .help("Reference set CSV to normalize against (default: pooled archive)"),
                )
                .arg(
                    Arg::new("files")
                        .action(ArgAction::Append)
                        .help("Archive bundles in the input directory (default: all matching variants)"),
                ),
        )
}

/// Config file (if any) with command-line overrides applied.
fn load_config(args: &ArgMatches) -> Result<RunConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(values) = args.get_many::<String>("objectives") {
        config.objectives = values.cloned().collect();
    }
    if let Some(values) = args.get_many::<Direction>("directions") {
        config.directions = values.copied().collect();
    }
    if let Some(values) = args.get_many::<f64>("epsilons") {
        config.epsilons = values.copied().collect();
    }
    if let Some(values) = args.get_many::<String>("variants") {
        config.variants = values.cloned().collect();
    }
    if let Some(nfe) = args.get_one::<String>("nfe") {
        config.nfe = Some(nfe.clone());
    }
    if let Some(dir) = args.get_one::<PathBuf>("input-dir") {
        config.input_dir = Some(dir.clone());
    }
    if let Some(dir) = args.get_one::<PathBuf>("output-dir") {
        config.output_dir = Some(dir.clone());
    }
    if let Some(&threads) = args.get_one::<usize>("threads") {
        config.threads = Some(threads);
    }
    if let Some(path) = args.try_get_one::<PathBuf>("reference-set").ok().flatten() {
        config.reference_set_file = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn reference_sets(config: &RunConfig) -> Result<bool> {
    let nfe = config.nfe()?;
    let output_dir = config.output_dir()?;
    std::fs::create_dir_all(output_dir)?;

    let store = TarballStore::new(config.input_dir()?);
    let builder = ReferenceSetBuilder::new(config.objectives()?);
    let sets = builder.build_variants(&store, &config.variants, nfe, Some(output_dir))?;
    for variant in &config.variants {
        match sets.get(variant) {
            Some(set) => println!("{variant}: {} solutions", set.len()),
            None => println!("{variant}: no archives, skipped"),
        }
    }
    Ok(true)
}

fn hypervolumes(config: &RunConfig, files: Vec<String>) -> Result<bool> {
    let output_dir = config.output_dir()?;
    std::fs::create_dir_all(output_dir)?;
    let objectives = config.objectives()?;
    let store = TarballStore::new(config.input_dir()?);

    let files = if files.is_empty() {
        let mut found = Vec::new();
        for variant in &config.variants {
            let prefix = match config.nfe.as_deref() {
                Some(nfe) => format!("{variant}_{nfe}"),
                None => variant.clone(),
            };
            found.extend(store.find(&prefix)?);
        }
        found
    } else {
        files
    };
    tracing::info!(files = files.len(), "scoring run files");

    let basis = match &config.reference_set_file {
        Some(path) => ReferenceBasis::load(path, &objectives)?,
        None => ReferenceBasis::Pooled,
    };
    let pool = match config.threads {
        Some(threads) => WorkerPool::with_threads(threads)?,
        None => WorkerPool::new()?,
    };
    let driver = ConvergenceDriver::with_pool(objectives, pool);

    let report = driver.run_batch(&store, &files, &basis, Some(output_dir));
    for (name, table) in &report.completed {
        println!("{name}: {table}");
    }
    for (name, error) in &report.failed {
        eprintln!("{name}: {error}");
    }
    Ok(report.is_success())
}

/// Bare file names; the store resolves them against the input directory.
fn file_args(args: &ArgMatches) -> Vec<String> {
    args.get_many::<String>("files")
        .map(|values| {
            values
                .map(|v| {
                    std::path::Path::new(v)
                        .file_name()
                        .and_then(|s| s.to_str())
                        .unwrap_or(v)
                        .to_owned()
                })
                .collect()
        })
        .unwrap_or_default()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let outcome = match matches.subcommand() {
        Some(("reference-set", args)) => load_config(args).and_then(|c| reference_sets(&c)),
        Some(("hypervolume", args)) => load_config(args).and_then(|c| hypervolumes(&c, file_args(args))),
        _ => return ExitCode::FAILURE,
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "aborted");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
