extern crate env_logger;
#[macro_use]
extern crate log;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

mod cli;
mod duplicates;
mod error;
mod filter;
mod io;
mod progress;
mod quality;
mod reader;
mod reconcile;
mod record;
mod stats;
mod store;
mod summary;

use cli::{paint, Cli, Commands, BANNER};
use error::Termination;
use filter::FilterOpts;
use io::{PendingOutput, SeparatorPolicy};
use record::QualityScoring;
use stats::StatsSummary;
use store::DedupKey;
use summary::RunSummary;

#[derive(Serialize)]
#[serde(untagged)]
enum Outcome {
    Run(RunSummary),
    Stats(StatsSummary),
}

/// Settings a run was made with. Only the ones the subcommand uses are set.
#[derive(Serialize, Default)]
struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<DedupKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    separator: Option<SeparatorPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scoring: Option<QualityScoring>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<FilterOpts>,
}

/// What a subcommand reports back for `--summary-json`.
#[derive(Serialize)]
struct Report {
    command: &'static str,
    parameters: Parameters,
    summary: Outcome,
}

fn banner(module: &str) {
    println!("readtidy v{}", cli::VERSION);
    println!("{}", paint(&format!("Beginning the {module} module."), BANNER));
}

fn run(cli: &Cli) -> Result<Report> {
    let report = match &cli.command {
        Commands::Dedup {
            input,
            output,
            common,
        } => {
            banner("dedup");
            info!("Removing duplicates keyed by {:?}", common.key);
            let summary = duplicates::dedup(
                input,
                output,
                &common.stats,
                common.key,
                common.separator,
                QualityScoring::default(),
            )?;
            Report {
                command: "dedup",
                parameters: Parameters {
                    key: Some(common.key),
                    separator: Some(common.separator),
                    ..Default::default()
                },
                summary: Outcome::Run(summary),
            }
        }
        Commands::DedupPaired { mates, common } => {
            banner("paired-end dedup");
            info!("Removing duplicate pairs keyed by {:?}", common.key);
            let summary = duplicates::dedup_paired(
                mates.inputs(),
                mates.outputs(),
                &common.stats,
                common.key,
                common.separator,
                QualityScoring::default(),
            )?;
            Report {
                command: "dedup-paired",
                parameters: Parameters {
                    key: Some(common.key),
                    separator: Some(common.separator),
                    ..Default::default()
                },
                summary: Outcome::Run(summary),
            }
        }
        Commands::Qc {
            input,
            output,
            common,
        } => {
            banner("quality control");
            let opts = common.filter_opts()?;
            let scoring = common.scoring.scoring();
            let summary = quality::quality_control(
                input,
                output,
                &common.stats,
                &opts,
                common.separator,
                scoring,
            )?;
            Report {
                command: "qc",
                parameters: Parameters {
                    separator: Some(common.separator),
                    scoring: Some(scoring),
                    filter: Some(opts),
                    ..Default::default()
                },
                summary: Outcome::Run(summary),
            }
        }
        Commands::QcPaired { mates, common } => {
            banner("paired-end quality control");
            let opts = common.filter_opts()?;
            let scoring = common.scoring.scoring();
            let summary = quality::quality_control_paired(
                mates.inputs(),
                mates.outputs(),
                &common.stats,
                &opts,
                common.separator,
                scoring,
            )?;
            Report {
                command: "qc-paired",
                parameters: Parameters {
                    separator: Some(common.separator),
                    scoring: Some(scoring),
                    filter: Some(opts),
                    ..Default::default()
                },
                summary: Outcome::Run(summary),
            }
        }
        Commands::Reconcile {
            mates,
            stats,
            separator,
        } => {
            banner("reconcile");
            let summary = reconcile::reconcile(
                mates.inputs(),
                mates.outputs(),
                stats,
                *separator,
                QualityScoring::default(),
            )?;
            Report {
                command: "reconcile",
                parameters: Parameters {
                    key: Some(DedupKey::Id),
                    separator: Some(*separator),
                    ..Default::default()
                },
                summary: Outcome::Run(summary),
            }
        }
        Commands::Stats {
            input,
            output,
            scoring,
        } => {
            banner("read statistics");
            let scoring = scoring.scoring();
            let summary = stats::read_stats(input, output, scoring)?;
            Report {
                command: "stats",
                parameters: Parameters {
                    scoring: Some(scoring),
                    ..Default::default()
                },
                summary: Outcome::Stats(summary),
            }
        }
    };
    Ok(report)
}

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // help and version are not errors
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(Termination::InvalidParameter.exit_code());
        }
    };

    // reserved before any other output is created
    let summary_json = cli
        .summary_json
        .as_deref()
        .map(PendingOutput::open)
        .transpose()?;

    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            if let Some(pending) = summary_json {
                pending.discard();
            }
            return Err(e);
        }
    };

    if let Some(pending) = summary_json {
        let mut out = pending.commit()?;
        summary::write_summary_json(&report, &mut out)?;
        info!("Wrote run summary to {}", out.path().display());
    }

    info!("Run {}.", Termination::Completed);
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        error!("{}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| error!("  because: {}", cause));

        let termination = Termination::of(&err);
        error!("Stopped: {termination}");
        std::process::exit(termination.exit_code());
    }
}
