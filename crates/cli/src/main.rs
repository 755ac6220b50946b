use anyhow::Context;
use clap::Parser;
use orderpilot_core::domain::policy::DiscountPolicy;
use orderpilot_core::forecast::trend::LeastSquaresTrend;
use orderpilot_core::ingest::{normalize, tables};
use orderpilot_core::llm::error::LlmDiagnosticsError;
use orderpilot_core::llm::openai::OpenAiClient;
use orderpilot_core::llm::RecommendationEngine;
use orderpilot_core::pipeline::{self, RunContext};
use orderpilot_core::{config::Settings, export};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_POLICY_TEXT: &str = "\
Wir möchten im Juli noch eine ausreichende Auswahl an Sommerartikeln verfügbar haben.
Ab Beginn des Abverkaufs soll der Lagerbestand zügig sinken.
Zum Saisonende soll der Lagerbestand möglichst gering sein.
Restposten sollen max. 5 % des Anfangsbestands betragen.
Bei schwacher Nachfrage soll der Abverkauf früher starten.";

#[derive(Debug, Parser)]
#[command(name = "orderpilot")]
struct Args {
    /// Sales history CSV (columns: article, date, quantity[, purchase_price, sale_price]).
    #[arg(long)]
    input: PathBuf,

    /// Sell-down start date (YYYY-MM-DD).
    #[arg(long)]
    sell_down_start: String,

    /// Phase-1 discount in percent (0..=100).
    #[arg(long)]
    discount_pct: f64,

    /// Season end date (YYYY-MM-DD).
    #[arg(long)]
    season_end: String,

    /// Residual value at season end, percent of purchase cost (0..=100).
    #[arg(long)]
    residual_pct: f64,

    /// Free-text firm policy handed to the recommendation engine.
    #[arg(long, default_value = DEFAULT_POLICY_TEXT)]
    policy_text: String,

    /// Location context for the recommendation engine.
    #[arg(long, default_value = "")]
    location: String,

    /// Forecast horizon in weekly periods.
    #[arg(long, default_value_t = orderpilot_core::forecast::DEFAULT_HORIZON)]
    horizon: usize,

    /// Output CSV path; prints the table to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Do everything except calling the recommendation engine.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let policy = DiscountPolicy {
        sell_down_start: parse_date_arg("--sell-down-start", &args.sell_down_start)?,
        phase1_discount_pct: args.discount_pct,
        season_end: parse_date_arg("--season-end", &args.season_end)?,
        residual_value_pct: args.residual_pct,
    };
    let ctx = RunContext::try_new(policy, args.policy_text, args.location, args.horizon)?;

    let rows = tables::load_sales_file(&args.input)?;
    let input = normalize::normalize(&rows)?;
    tracing::info!(
        articles = input.article_order.len(),
        rejected_rows = input.row_errors.len(),
        "input normalized"
    );

    let forecaster = LeastSquaresTrend::default();
    let evaluations = pipeline::evaluate_articles(&ctx, &input, &forecaster);
    let request = pipeline::build_request(&ctx, &evaluations)?;

    if args.dry_run {
        tracing::info!(
            dry_run = true,
            articles = request.facts.len(),
            "dry-run: skipping recommendation engine call"
        );
        println!("{}", serde_json::to_string_pretty(&request.facts_json())?);
        return Ok(());
    }

    let engine = OpenAiClient::from_settings(&settings)?;
    let proposals = match engine.recommend(&request).await {
        Ok(proposals) => proposals,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
                if let Some(raw) = diag.raw_output.as_deref() {
                    tracing::error!(stage = diag.stage, raw_output = raw, "raw engine reply kept for diagnosis");
                }
            }
            return Err(err);
        }
    };

    let recommendations = pipeline::assemble(&evaluations, proposals)?;

    match &args.out {
        Some(path) => {
            export::write_recommendations_file(path, &recommendations)?;
            tracing::info!(path = %path.display(), rows = recommendations.len(), "wrote recommendation table");
        }
        None => {
            export::write_recommendations(std::io::stdout().lock(), &recommendations)?;
        }
    }

    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

fn parse_date_arg(name: &str, value: &str) -> anyhow::Result<chrono::NaiveDate> {
    normalize::parse_date(value).with_context(|| format!("{name}: unparseable date {value:?}"))
}
