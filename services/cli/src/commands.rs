use badge_scoring::error::AppError;
use badge_scoring::ingest::{EntityTable, DEFAULT_ID_COLUMN};
use badge_scoring::report::{write_csv_to_path, BadgeDistribution, ExportOptions};
use badge_scoring::scoring::{Rule, RuleDef, ScoringConfig, ScoringEngine};
use badge_scoring::settings::AppConfig;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Path to the input CSV file
    #[arg(long)]
    pub(crate) inp: PathBuf,
    /// Path to the scoring configuration (defaults to SCORING_CONFIG)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Path to write the output CSV
    #[arg(long)]
    pub(crate) out: PathBuf,
    /// Primary key column name
    #[arg(long, default_value = DEFAULT_ID_COLUMN)]
    pub(crate) id_col: String,
    /// Display name column
    #[arg(long, default_value = "name")]
    pub(crate) name_col: String,
}

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Path to the scoring configuration (defaults to SCORING_CONFIG)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
}

pub(crate) fn load_engine(path: &Path) -> Result<ScoringEngine, AppError> {
    let config = ScoringConfig::from_path(path)?;
    info!(
        path = %path.display(),
        rules = config.rules().len(),
        badges = config.badges().len(),
        "scoring configuration loaded"
    );
    Ok(ScoringEngine::new(config))
}

pub(crate) fn run_score(args: ScoreArgs, settings: &AppConfig) -> Result<(), AppError> {
    let ScoreArgs {
        inp,
        config,
        out,
        id_col,
        name_col,
    } = args;

    let config_path = config.unwrap_or_else(|| settings.scoring.rules_path.clone());
    let engine = load_engine(&config_path)?;

    let table = EntityTable::from_path(&inp, &id_col)?;
    for column in engine.missing_columns(&table.headers) {
        warn!(
            column,
            "input has no column for a configured rule; every entity will miss it"
        );
    }

    let results = engine.score_all(&table.entities);
    let degraded = results.iter().filter(|result| result.is_degraded()).count();
    info!(entities = results.len(), degraded, "scoring complete");

    let options = ExportOptions {
        name_column: name_col,
    };
    write_csv_to_path(&out, &table, &results, &options)?;

    let distribution = BadgeDistribution::from_results(engine.config().badges(), &results);
    println!(
        "Badge distribution: {}",
        serde_json::to_string_pretty(&distribution)?
    );
    println!("Wrote: {}", out.display());

    Ok(())
}

pub(crate) fn run_check(args: CheckArgs, settings: &AppConfig) -> Result<(), AppError> {
    let config_path = args
        .config
        .unwrap_or_else(|| settings.scoring.rules_path.clone());
    let engine = load_engine(&config_path)?;
    print!("{}", describe_config(engine.config()));
    Ok(())
}

fn describe_config(config: &ScoringConfig) -> String {
    let mut output = format!("Rules ({})\n", config.rules().len());
    for rule in config.rules() {
        output.push_str(&format!("- {}\n", describe_rule(rule)));
    }

    output.push_str(&format!("\nBadges ({})\n", config.badges().len()));
    for badge in config.badges() {
        output.push_str(&format!("- {}: [{}, {}]\n", badge.name, badge.min, badge.max));
    }
    output
}

fn describe_rule(rule: &Rule) -> String {
    let detail = match &rule.def {
        RuleDef::Bin(def) => {
            let ladder: Vec<_> = def
                .bins
                .iter()
                .map(|bin| format!(">={} -> {:+}", bin.threshold, bin.points))
                .collect();
            ladder.join(", ")
        }
        RuleDef::Boolean(def) => format!("{:+} when true", def.points),
        RuleDef::Categorical(def) => {
            let values: Vec<_> = def.values.iter().map(String::as_str).collect();
            format!("{:+} when one of {}", def.points, values.join("/"))
        }
        RuleDef::ConditionalPenalty(def) => format!("{:+} when false or missing", def.points),
    };

    format!(
        "{} [{} on {}]: {}",
        rule.name,
        rule.def.kind().label(),
        rule.field,
        detail
    )
}
