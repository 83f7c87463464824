use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use num_format::{Locale, ToFormattedString};

use reco_eval::config::AppConfig;
use reco_eval::evaluator;
use reco_eval::io;
use reco_eval::metrics::evaluation_reporter::EvaluationReporter;
use reco_eval::metrics::report::MetricsReport;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// Scores ranked recommendation lists against per-user relevant items.
#[derive(Parser, Debug)]
#[command(name = "evaluate")]
struct Args {
    /// Config file with data, eval, output and log sections.
    #[arg(long)]
    config: Option<String>,

    /// JSON file with ranked recommendations per user.
    #[arg(long)]
    recommendations: Option<String>,

    /// CSV file with user_id,tour_id rows of relevant items.
    #[arg(long)]
    groundtruth: Option<String>,

    /// Number of top-ranked recommendations considered per user.
    #[arg(long)]
    k: Option<usize>,

    /// Also write the scores of every evaluated user to this CSV file.
    #[arg(long)]
    per_user_out: Option<String>,

    /// Re-rank candidates by descending score before cutting at k.
    #[arg(long)]
    sort_by_score: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::new(args.config.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log.level.as_str()),
    )
    .init();

    let recommendations_path = args
        .recommendations
        .or(config.data.recommendations_path)
        .context("no recommendations file given, use --recommendations or data.recommendations_path")?;
    let groundtruth_path = args
        .groundtruth
        .or(config.data.groundtruth_path)
        .context("no ground truth file given, use --groundtruth or data.groundtruth_path")?;
    let k = args.k.unwrap_or(config.eval.k);
    let sort_by_score = args.sort_by_score || config.data.sort_by_score;
    let per_user_path = args.per_user_out.or(config.output.per_user_path);

    let recommendations = io::read_recommendations(&recommendations_path, sort_by_score)?;
    info!(
        "Loaded recommendations for {} users from {}",
        recommendations.len().to_formatted_string(&Locale::en),
        recommendations_path
    );
    let groundtruth = io::read_groundtruth(&groundtruth_path)?;
    info!(
        "Loaded relevant items for {} users from {}",
        groundtruth.len().to_formatted_string(&Locale::en),
        groundtruth_path
    );

    let exact = evaluator::evaluate_exact(&recommendations, &groundtruth, k)?;
    info!(
        "Evaluated {} users at k={}",
        exact.users_evaluated.to_formatted_string(&Locale::en),
        k
    );

    if let Some(per_user_path) = per_user_path {
        let scores = evaluator::score_users(&recommendations, &groundtruth, k)?;
        io::write_user_scores(&per_user_path, &scores)?;
        info!("Wrote scores of {} users to {}", scores.len(), per_user_path);
    }

    let report = MetricsReport::from_exact(&exact, config.output.decimals);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => {
            println!("{}", EvaluationReporter::new(k).get_name());
            println!("{}", report.to_csv_row(config.output.decimals));
        }
    }
    Ok(())
}
