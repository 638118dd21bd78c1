//! bioflow command-line interface

use std::path::Path;

use clap::Parser;
use log::{info, LevelFilter};

use bioflow::cli::{Cli, Commands, JobsAction};
use bioflow::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["analyze", "validate", "submit", "jobs", "fetch", "help"];
    let has_subcommand = first_positional.map_or(false, |a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        // No subcommand: handle top-level help/version manually
        if args.iter().any(|a| a == "-h" || a == "--help") {
            print_help();
        } else if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("bioflow {}", VERSION);
        } else {
            print_no_args();
        }
        return;
    }

    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Analyze {
            input,
            output,
            plot,
            summary,
            eps,
            fc_threshold,
        }) => run_analyze(
            &input,
            &output,
            plot.as_deref(),
            summary.as_deref(),
            eps,
            fc_threshold,
        ),
        Some(Commands::Validate { input }) => run_validate(&input),
        Some(Commands::Submit {
            input,
            user,
            store,
            max_jobs,
            eps,
        }) => run_submit(&input, &user, &store, max_jobs, eps),
        Some(Commands::Jobs { action }) => run_jobs(action),
        Some(Commands::Fetch {
            user,
            name,
            output,
            store,
        }) => run_fetch(&user, &name, &output, &store),
        None => {
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Custom help output
// ---------------------------------------------------------------------------

fn print_no_args() {
    println!("bioflow v{}", VERSION);
    println!("Run `bioflow --help` for usage.");
}

fn print_help() {
    println!("bioflow v{}", VERSION);
    println!("Two-condition fold-change analysis with volcano plots");
    println!();
    println!("Usage: bioflow <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  analyze    Analyze one expression table");
    println!("  validate   Print the validation report of a table as JSON");
    println!("  submit     Analyze a table as a stored job for a user");
    println!("  jobs       List, show or delete stored jobs");
    println!("  fetch      Copy a stored result or plot file");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h, --help       Print help");
    println!("  -V, --version    Print version");
    println!();
    println!("Examples:");
    println!("  bioflow analyze -i expression.csv -o result.csv --plot volcano.png");
    println!("  bioflow submit -i expression.csv -u alice");
    println!("  bioflow jobs list -u alice");
    println!();
    println!("Run `bioflow <COMMAND> --help` for command-specific options.");
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn run_analyze(
    input: &str,
    output: &str,
    plot: Option<&str>,
    summary_path: Option<&str>,
    eps: f64,
    fc_threshold: f64,
) -> Result<()> {
    info!("Loading table from: {}", input);
    let table = read_table(input)?;

    let out = run_pipeline(&table, &DiffParams { eps })?;
    if out.report.numeric_issue {
        log::warn!("Non-numeric ctrl/treat values were dropped during cleaning");
    }

    write_results(output, &out.results)?;
    info!("Results written to: {}", output);

    if let Some(path) = summary_path {
        write_summary(path, &out.summary)?;
        info!("Summary written to: {}", path);
    }

    if let Some(path) = plot {
        let config = VolcanoConfig {
            fc_threshold,
            ..VolcanoConfig::default()
        };
        plot_volcano(&out.results, path, &config)?;
        info!("Volcano plot written to: {}", path);
    }

    println!("{}", out.summary);
    Ok(())
}

fn run_validate(input: &str) -> Result<()> {
    let table = read_table(input)?;
    let report = validate(&table);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_submit(input: &str, user: &str, store: &str, max_jobs: usize, eps: f64) -> Result<()> {
    let config = JobStoreConfig {
        max_jobs_per_user: max_jobs,
        ..JobStoreConfig::with_root(store)
    };
    let mut job_store = config.open_store()?;
    let job = submit_job(
        &mut job_store,
        &config,
        user,
        Path::new(input),
        &DiffParams { eps },
        &VolcanoConfig::default(),
    )?;

    println!("{}", job.job_id);
    if let Some(summary) = &job.summary {
        println!("{}", summary);
    }
    Ok(())
}

fn run_jobs(action: JobsAction) -> Result<()> {
    match action {
        JobsAction::List { user, store } => {
            let job_store = JobStoreConfig::with_root(&store).open_store()?;
            let jobs = job_store.list_jobs(&user)?;
            if jobs.is_empty() {
                println!("No jobs for user '{}'", user);
            }
            for job in jobs {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    job.job_id,
                    job.status.as_str(),
                    job.created_at,
                    job.result_filename().unwrap_or_default(),
                    job.plot_filename().unwrap_or_default(),
                    job.summary.unwrap_or_default()
                );
            }
        }
        JobsAction::Show {
            user,
            job_id,
            store,
        } => {
            let job_store = JobStoreConfig::with_root(&store).open_store()?;
            let job = job_store.get_job(&user, &job_id)?;
            println!("{}", serde_json::to_string_pretty(&job)?);
        }
        JobsAction::Delete {
            user,
            job_id,
            store,
        } => {
            let job_store = JobStoreConfig::with_root(&store).open_store()?;
            job_store.delete_job(&user, &job_id)?;
            println!("Deleted {}", job_id);
        }
    }
    Ok(())
}

fn run_fetch(user: &str, name: &str, output: &str, store: &str) -> Result<()> {
    let job_store = JobStoreConfig::with_root(store).open_store()?;
    let source = job_store.find_artifact(user, name)?;
    std::fs::copy(&source, output)?;
    info!("Copied {} to {}", source.display(), output);
    Ok(())
}
