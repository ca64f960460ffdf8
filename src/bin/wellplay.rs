//! Wellplay CLI - run the data-cleaning pipeline from the command line
//!
//! Commands:
//! - run: process one platform/wave and write the three snapshots
//! - validate: check that the exports carry the required columns

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use wellplay::adapters::{EaAdapter, NintendoAdapter, PlatformAdapter, TelemetryTables};
use wellplay::loader::RawTable;
use wellplay::{PipelineError, StudyPipeline, DEFAULT_WINDOW_DAYS, WELLPLAY_VERSION};

/// Wellplay - survey and game-telemetry data-cleaning pipeline
#[derive(Parser)]
#[command(name = "wellplay")]
#[command(version = WELLPLAY_VERSION)]
#[command(about = "Clean and merge survey and game-telemetry exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one platform/wave
    Run {
        /// Source platform of the exports
        #[arg(long, value_enum)]
        platform: PlatformArg,

        /// Survey export CSV
        #[arg(long)]
        survey: PathBuf,

        /// Directory holding the telemetry export CSVs
        #[arg(long)]
        telemetry_dir: PathBuf,

        /// Directory to write the snapshot CSVs into
        #[arg(long)]
        out_dir: PathBuf,

        /// Trailing window in days before each survey response
        #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
        window_days: i64,
    },

    /// Validate export schemas without running the pipeline
    Validate {
        /// Source platform of the exports
        #[arg(long, value_enum)]
        platform: PlatformArg,

        /// Survey export CSV
        #[arg(long)]
        survey: PathBuf,

        /// Directory holding the telemetry export CSVs
        #[arg(long)]
        telemetry_dir: PathBuf,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    /// Nintendo wave (sessions-only telemetry)
    Nintendo,
    /// EA wave (full event telemetry)
    Ea,
}

impl PlatformArg {
    fn adapter(&self) -> Box<dyn PlatformAdapter> {
        match self {
            PlatformArg::Nintendo => Box::new(NintendoAdapter),
            PlatformArg::Ea => Box::new(EaAdapter),
        }
    }
}

/// Telemetry export file stems looked up under --telemetry-dir
const TELEMETRY_FILES: &[&str] = &[
    "sessions",
    "authentications",
    "friends",
    "leveling",
    "prestige",
    "gestures",
    "experience",
];

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "error": e.to_string(),
                })
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Commands::Run {
            platform,
            survey,
            telemetry_dir,
            out_dir,
            window_days,
        } => cmd_run(platform, &survey, &telemetry_dir, &out_dir, window_days),
        Commands::Validate {
            platform,
            survey,
            telemetry_dir,
            json,
        } => cmd_validate(platform, &survey, &telemetry_dir, json),
    }
}

fn cmd_run(
    platform: PlatformArg,
    survey_path: &Path,
    telemetry_dir: &Path,
    out_dir: &Path,
    window_days: i64,
) -> Result<(), PipelineError> {
    let adapter = platform.adapter();

    let survey_table = RawTable::from_path(survey_path, "survey")?;
    let survey = adapter.parse_survey(&survey_table)?;
    if survey.is_empty() {
        return Err(PipelineError::EmptyTable("survey".to_string()));
    }

    let tables = load_telemetry_tables(telemetry_dir)?;
    let telemetry = adapter.parse_telemetry(&tables)?;

    std::fs::create_dir_all(out_dir)?;
    let pipeline = StudyPipeline::with_window_days(window_days);
    let (output, paths) = pipeline.run_and_persist(survey, &telemetry, out_dir)?;

    println!("Pipeline complete ({})", adapter.platform().as_str());
    println!("  merged rows:        {}", output.raw_merged.len());
    println!("  after exclusions:   {}", output.exclusions_applied.len());
    for path in paths {
        println!("  wrote {}", path.display());
    }

    Ok(())
}

fn cmd_validate(
    platform: PlatformArg,
    survey_path: &Path,
    telemetry_dir: &Path,
    json: bool,
) -> Result<(), PipelineError> {
    let adapter = platform.adapter();
    let mut checks: Vec<FileCheck> = Vec::new();

    let survey_result = RawTable::from_path(survey_path, "survey")
        .and_then(|t| adapter.parse_survey(&t).map(|r| r.len()));
    checks.push(FileCheck::from_result("survey", survey_result));

    for &stem in TELEMETRY_FILES {
        let path = telemetry_dir.join(format!("{stem}.csv"));
        if !path.exists() {
            checks.push(FileCheck {
                file: stem.to_string(),
                status: "absent".to_string(),
                detail: "not exported by this platform".to_string(),
            });
            continue;
        }

        let result = RawTable::from_path(&path, stem).and_then(|t| {
            let mut tables = TelemetryTables::default();
            set_table(&mut tables, stem, t);
            adapter.parse_telemetry(&tables).map(|b| {
                b.sessions.len()
                    + b.authentications.len()
                    + b.friends.len()
                    + b.level_ups.len()
                    + b.prestige_changes.len()
                    + b.gestures.len()
                    + b.experience.len()
            })
        });
        checks.push(FileCheck::from_result(stem, result));
    }

    let failed = checks.iter().filter(|c| c.status == "error").count();

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        println!("Validation report ({})", adapter.platform().as_str());
        for check in &checks {
            println!("  [{}] {}: {}", check.status, check.file, check.detail);
        }
    }

    if failed > 0 {
        Err(PipelineError::ValidationFailed(format!(
            "{failed} export(s) failed schema checks"
        )))
    } else {
        Ok(())
    }
}

fn load_telemetry_tables(dir: &Path) -> Result<TelemetryTables, PipelineError> {
    let mut tables = TelemetryTables::default();
    for &stem in TELEMETRY_FILES {
        let path = dir.join(format!("{stem}.csv"));
        if path.exists() {
            let table = RawTable::from_path(&path, stem)?;
            set_table(&mut tables, stem, table);
        }
    }
    Ok(tables)
}

fn set_table(tables: &mut TelemetryTables, stem: &str, table: RawTable) {
    match stem {
        "sessions" => tables.sessions = Some(table),
        "authentications" => tables.authentications = Some(table),
        "friends" => tables.friends = Some(table),
        "leveling" => tables.leveling = Some(table),
        "prestige" => tables.prestige = Some(table),
        "gestures" => tables.gestures = Some(table),
        "experience" => tables.experience = Some(table),
        _ => {}
    }
}

#[derive(serde::Serialize)]
struct FileCheck {
    file: String,
    status: String,
    detail: String,
}

impl FileCheck {
    fn from_result(file: &str, result: Result<usize, PipelineError>) -> Self {
        match result {
            Ok(rows) => FileCheck {
                file: file.to_string(),
                status: "ok".to_string(),
                detail: format!("{rows} rows"),
            },
            Err(e) => FileCheck {
                file: file.to_string(),
                status: "error".to_string(),
                detail: e.to_string(),
            },
        }
    }
}
