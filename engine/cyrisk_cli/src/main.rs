use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use cyrisk_mitigation::{
    MitigationConfig, MitigationError, MitigationOptimizer, OptionSelector, PerturbationOracle,
};
use cyrisk_model::{BackendError, DenseNetwork, FeatureSchema, ModelError, RiskScorer};
use log::LevelFilter;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(
    name = "cyrisk",
    version,
    about = "Cyber-risk scoring and mitigation planning for project questionnaires",
    long_about = "cyrisk scores questionnaire answers with a trained multi-label classifier\n\
        and proposes rounds of answer changes that lower the composite risk.\n\n\
        Answers are given as one level index per feature group, in catalog order.\n\n\
        EXAMPLES:\n\
        \n  cyrisk predict --model model.json 0 1 0 2 1 0 0 0 1 0 0 1 0 0 0 1\n\
        \n  cyrisk mitigate --model model.json --seed 7 0 1 0 2 1 0 0 0 1 0 0 1 0 0 0 1\n\
        \n  cyrisk recommend --model model.json --group 4.3 --option Yes 0 1 0 2 1 0 0 0 1 0 0 1 0 0 0 1\n\
        \n  cyrisk columns"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Per-category probabilities and composite risk score
    Predict(ModelArgs),

    /// Full round-by-round mitigation strategy
    #[command(
        long_about = "Ranks feature groups by importance, then improves them round by round.\n\n\
            Without a usable importance ranking a fixed schedule is used and the report\n\
            says so in its orderingSource field."
    )]
    Mitigate(MitigateArgs),

    /// Risk change of a single recommendation applied alone
    Recommend(RecommendArgs),

    /// List the standard feature groups and their one-hot columns
    Columns,
}

#[derive(Debug, Args, Clone)]
struct ModelArgs {
    /// JSON file with the trained network weights
    #[arg(long, value_name = "FILE")]
    model: PathBuf,

    /// Per-category exceedance threshold in [0, 1]
    #[arg(long, value_name = "P", value_parser = parse_threshold)]
    threshold: Option<f64>,

    /// One level index per feature group, in catalog order
    #[arg(value_name = "LEVELS", required = true)]
    levels: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OracleKind {
    Perturbation,
    None,
}

#[derive(Debug, Args, Clone)]
struct MitigateArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Importance oracle used to order the rounds
    #[arg(long, value_enum, default_value_t = OracleKind::Perturbation)]
    oracle: OracleKind,

    /// Baseline samples per feature group for the perturbation oracle
    #[arg(long, value_name = "N", default_value_t = 32)]
    samples: usize,

    /// Seed for the importance oracle
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Skip re-scoring each recommendation on its own
    #[arg(long)]
    no_isolated_deltas: bool,
}

#[derive(Debug, Args, Clone)]
#[command(group(ArgGroup::new("selector").required(true).args(["option_index", "option"])))]
struct RecommendArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Feature group code, e.g. 4.3
    #[arg(long, value_name = "CODE")]
    group: String,

    /// Recommended level index
    #[arg(long, value_name = "N")]
    option_index: Option<usize>,

    /// Recommended level label, e.g. "Yes"
    #[arg(long, value_name = "LABEL")]
    option: Option<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to load model: {0}")]
    Model(#[from] BackendError),
    #[error("{0}")]
    Scoring(#[from] ModelError),
    #[error("{0}")]
    Mitigation(#[from] MitigationError),
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// 1 when the classifier failed mid-request, 2 for bad input or model
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Scoring(e) if e.is_scoring_failure() => 1,
            CliError::Mitigation(e) if e.is_scoring_failure() => 1,
            CliError::Output(_) => 1,
            _ => 2,
        }
    }
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let t: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&t) {
        Ok(t)
    } else {
        Err(format!("threshold must be within [0, 1], got {t}"))
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG still wins over the -v default
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn load_scorer(args: &ModelArgs, config: &MitigationConfig) -> Result<RiskScorer, CliError> {
    let network = DenseNetwork::load_model(&args.model)?;
    let scorer = RiskScorer::new(Arc::new(network), Arc::new(FeatureSchema::standard()))?;
    Ok(scorer.with_threshold(config.threshold))
}

fn base_config(args: &ModelArgs) -> MitigationConfig {
    let mut config = MitigationConfig::from_env();
    if let Some(t) = args.threshold {
        config.threshold = t;
    }
    config
}

fn run_predict(args: &ModelArgs) -> Result<JsonValue, CliError> {
    let scorer = load_scorer(args, &base_config(args))?;
    let vector = scorer.encode(&args.levels)?;
    let assessment = scorer.assess(&vector)?;
    Ok(serde_json::to_value(assessment)?)
}

fn mitigation_config(args: &MitigateArgs) -> MitigationConfig {
    let mut config = base_config(&args.model);
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.no_isolated_deltas {
        config.isolated_deltas = false;
    }
    config
}

fn run_mitigate(args: &MitigateArgs) -> Result<JsonValue, CliError> {
    let config = mitigation_config(args);
    let scorer = load_scorer(&args.model, &config)?;
    let mut optimizer = MitigationOptimizer::new(scorer, config);
    if args.oracle == OracleKind::Perturbation {
        optimizer = optimizer.with_oracle(Arc::new(PerturbationOracle::new(args.samples)));
    }
    let strategy = optimizer.generate_strategy(&args.model.levels)?;
    Ok(serde_json::to_value(strategy)?)
}

fn selector(args: &RecommendArgs) -> OptionSelector {
    match (&args.option_index, &args.option) {
        (Some(i), _) => OptionSelector::Index(*i),
        (None, Some(label)) => OptionSelector::Label(label.clone()),
        // clap's selector group requires one of the two
        (None, None) => OptionSelector::Index(0),
    }
}

fn run_recommend(args: &RecommendArgs) -> Result<JsonValue, CliError> {
    let config = base_config(&args.model);
    let scorer = load_scorer(&args.model, &config)?;
    let optimizer = MitigationOptimizer::new(scorer, config);
    let delta = optimizer.recommendation_delta(&args.model.levels, &args.group, &selector(args))?;
    Ok(serde_json::to_value(delta)?)
}

fn run_columns() -> Result<JsonValue, CliError> {
    let schema = FeatureSchema::standard();
    let groups: Vec<JsonValue> = schema
        .groups()
        .iter()
        .map(|g| {
            serde_json::json!({
                "featureGroup": g.code(),
                "featureName": cyrisk_model::catalog::feature_name(g.code()),
                "levels": g.levels(),
            })
        })
        .collect();
    Ok(serde_json::json!({
        "width": schema.width(),
        "groups": groups,
        "columns": schema.column_names(),
    }))
}

fn run(command: &Command) -> Result<JsonValue, CliError> {
    match command {
        Command::Predict(args) => run_predict(args),
        Command::Mitigate(args) => run_mitigate(args),
        Command::Recommend(args) => run_recommend(args),
        Command::Columns => run_columns(),
    }
}

fn run_cli() -> i32 {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let rendered = run(&cli.command)
        .and_then(|value| serde_json::to_string_pretty(&value).map_err(CliError::from));
    match rendered {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

fn main() {
    std::process::exit(run_cli());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_verbose_flag() {
        let cli = Cli::try_parse_from(["cyrisk", "-vvv", "columns"]).unwrap();
        assert_eq!(cli.verbose, 3, "verbose count should be 3 for -vvv");
    }

    #[test]
    fn cli_parses_mitigate_flags() {
        let cli = Cli::try_parse_from([
            "cyrisk",
            "mitigate",
            "--model",
            "model.json",
            "--oracle",
            "none",
            "--seed",
            "9",
            "--no-isolated-deltas",
            "0",
            "1",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::Mitigate(args) => {
                assert_eq!(args.model.model, PathBuf::from("model.json"));
                assert_eq!(args.model.levels, vec![0, 1, 2]);
                assert_eq!(args.oracle, OracleKind::None);
                assert_eq!(args.samples, 32);
                let config = mitigation_config(&args);
                assert_eq!(config.seed, 9);
                assert!(!config.isolated_deltas);
            }
            _ => panic!("expected Mitigate command"),
        }
    }

    #[test]
    fn recommend_requires_exactly_one_selector() {
        let base = ["cyrisk", "recommend", "--model", "m.json", "--group", "4.3"];
        assert!(Cli::try_parse_from(base.iter().chain(&["0"])).is_err());
        assert!(Cli::try_parse_from(
            base.iter()
                .chain(&["--option", "Yes", "--option-index", "1", "0"])
        )
        .is_err());

        let cli = Cli::try_parse_from(base.iter().chain(&["--option", "Yes", "0"])).unwrap();
        match cli.command {
            Command::Recommend(args) => {
                assert_eq!(selector(&args), OptionSelector::Label("Yes".into()));
            }
            _ => panic!("expected Recommend command"),
        }
    }

    #[test]
    fn threshold_flag_is_range_checked() {
        assert_eq!(parse_threshold("0.5"), Ok(0.5));
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("abc").is_err());
        assert!(Cli::try_parse_from([
            "cyrisk",
            "predict",
            "--model",
            "m.json",
            "--threshold",
            "-0.1",
            "0"
        ])
        .is_err());
    }

    #[test]
    fn levels_are_required() {
        assert!(Cli::try_parse_from(["cyrisk", "predict", "--model", "m.json"]).is_err());
    }

    #[test]
    fn exit_codes_separate_bad_input_from_scoring_failures() {
        let bad_input = CliError::Scoring(ModelError::InputLength {
            expected: 16,
            actual: 3,
        });
        assert_eq!(bad_input.exit_code(), 2);
        let broken = CliError::Mitigation(MitigationError::Model(ModelError::ScoringFailure(
            BackendError::InferenceError("nan".into()),
        )));
        assert_eq!(broken.exit_code(), 1);
        assert_eq!(
            CliError::Model(BackendError::LoadError("gone".into())).exit_code(),
            2
        );
    }

    #[test]
    fn columns_lists_the_standard_layout() {
        let value = run_columns().unwrap();
        assert_eq!(value["width"], 72);
        assert_eq!(value["groups"].as_array().unwrap().len(), 16);
        assert_eq!(value["columns"][0], "1.1_0");
    }

    #[test]
    fn help_contains_examples() {
        use clap::CommandFactory;
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        cmd.write_long_help(&mut buf).unwrap();
        let help = String::from_utf8(buf).unwrap();
        assert!(help.contains("EXAMPLES"));
        assert!(help.contains("mitigate"));
        assert!(help.contains("--verbose"));
    }
}
