//! Command-line interface for bioflow

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bioflow")]
#[command(version)]
#[command(about = "Two-condition fold-change analysis with volcano plots")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one expression table
    #[command(
        long_about = "Analyze one expression table\n\n\
            Normalizes column names, validates and cleans the table, then computes\n\
            delta, fold change and log2 fold change per gene. Genes with\n\
            |log2FC| >= 1 are called up or down. Results are ranked by |log2FC|.",
        after_long_help = "\
Examples:
  bioflow analyze -i expression.csv -o result.csv

  # Also render a volcano plot and a one-line summary file
  bioflow analyze -i expression.csv -o result.csv --plot volcano.png --summary summary.csv"
    )]
    Analyze {
        /// Path to the expression table (CSV or TSV)
        #[arg(short, long,
            long_help = "Path to the expression table.\n\
                Needs a gene column (gene, gene_id, symbol, Gene, GENE),\n\
                a control column (ctrl, control, CTRL, Control, ctl) and\n\
                a treatment column (treat, treatment, TREAT, Treatment, trt).\n\
                Comma and tab delimiters are auto-detected.")]
        input: String,

        /// Output file path [default: result.csv]
        #[arg(short, long, default_value = "result.csv")]
        output: String,

        /// Write a volcano plot (PNG) to this path
        #[arg(long, value_name = "PNG")]
        plot: Option<String>,

        /// Write the text summary as CSV to this path
        #[arg(long, value_name = "CSV")]
        summary: Option<String>,

        /// Pseudo-value added to ctrl and treat before dividing [default: 1e-9]
        #[arg(long, default_value = "1e-9")]
        eps: f64,

        /// Position of the volcano plot guide lines [default: 1.0]
        #[arg(long, default_value = "1.0")]
        fc_threshold: f64,
    },

    /// Print the validation report of a table as JSON
    #[command(
        after_long_help = "\
Examples:
  bioflow validate -i expression.csv"
    )]
    Validate {
        /// Path to the expression table (CSV or TSV)
        #[arg(short, long)]
        input: String,
    },

    /// Analyze a table as a stored job for a user
    #[command(
        long_about = "Analyze a table as a stored job for a user\n\n\
            The upload is copied into the store, analyzed, and its result table\n\
            and volcano plot are kept under the store's results directory.\n\
            Only the newest --max-jobs jobs per user are kept.",
        after_long_help = "\
Examples:
  bioflow submit -i expression.csv -u alice
  bioflow submit -i expression.csv -u alice --store /srv/bioflow --max-jobs 50"
    )]
    Submit {
        /// Path to the expression table (CSV or TSV)
        #[arg(short, long)]
        input: String,

        /// User owning the job
        #[arg(short, long)]
        user: String,

        /// Store directory [default: bioflow_data]
        #[arg(long, default_value = "bioflow_data")]
        store: String,

        /// Jobs kept per user, at least 1 [default: 20]
        #[arg(long, default_value = "20", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        max_jobs: usize,

        /// Pseudo-value added to ctrl and treat before dividing [default: 1e-9]
        #[arg(long, default_value = "1e-9")]
        eps: f64,
    },

    /// List, show or delete stored jobs
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },

    /// Copy a stored result or plot file
    #[command(
        after_long_help = "\
Examples:
  bioflow fetch -u alice result_20250101-120000.000000_1b2c3d4e.csv -o result.csv"
    )]
    Fetch {
        /// User owning the file
        #[arg(short, long)]
        user: String,

        /// File name as shown by `bioflow jobs list`
        name: String,

        /// Destination path
        #[arg(short, long)]
        output: String,

        /// Store directory [default: bioflow_data]
        #[arg(long, default_value = "bioflow_data")]
        store: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// List a user's jobs, newest first
    List {
        #[arg(short, long)]
        user: String,

        #[arg(long, default_value = "bioflow_data")]
        store: String,
    },

    /// Show one job as JSON
    Show {
        #[arg(short, long)]
        user: String,

        job_id: String,

        #[arg(long, default_value = "bioflow_data")]
        store: String,
    },

    /// Delete one job and its files
    Delete {
        #[arg(short, long)]
        user: String,

        job_id: String,

        #[arg(long, default_value = "bioflow_data")]
        store: String,
    },
}
