use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use plan_derive_lib::{
  store, AthleteProfile, DerivationConfig, IntakeForm, PlanEngine, PlanError,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Derive a training plan from an athlete profile and print it as JSON
#[derive(Parser, Debug)]
#[command(name = "derive-plan", version, about)]
struct Args {
  /// Athlete profile JSON (or a raw intake form with --intake)
  #[arg(long)]
  profile: PathBuf,

  /// Derivation config JSON. Falls back to PLAN_CONFIG_PATH, then built-in defaults
  #[arg(long)]
  config: Option<PathBuf>,

  /// Date to derive against (YYYY-MM-DD). Defaults to today in UTC
  #[arg(long)]
  as_of: Option<NaiveDate>,

  /// Treat the profile file as a raw intake form submission
  #[arg(long)]
  intake: bool,

  /// Append the derived plan to this SQLite plan store
  #[arg(long)]
  store: Option<PathBuf>,
}

fn init_logging() {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn load_profile(args: &Args) -> anyhow::Result<AthleteProfile> {
  let raw = fs::read_to_string(&args.profile)
    .with_context(|| format!("Failed to read profile {}", args.profile.display()))?;

  if args.intake {
    Ok(IntakeForm::from_json(&raw)?.to_profile()?)
  } else {
    serde_json::from_str(&raw).context("Failed to parse athlete profile")
  }
}

/// Print a plan error as JSON on stdout and exit non-zero
fn fail(err: PlanError) -> ! {
  tracing::warn!(error = %err, "Plan derivation failed");
  match serde_json::to_string_pretty(&err) {
    Ok(json) => println!("{}", json),
    Err(_) => println!("{{\"error\": \"{}\"}}", err),
  }
  std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_logging();
  let args = Args::parse();

  let config = match &args.config {
    Some(path) => DerivationConfig::from_file(path),
    None => DerivationConfig::from_env(),
  };
  let engine = match config.and_then(PlanEngine::new) {
    Ok(engine) => engine,
    Err(err) => fail(err.into()),
  };

  let profile = load_profile(&args)?;
  let today = args.as_of.unwrap_or_else(|| Utc::now().date_naive());

  let plan = match engine.derive_as_of(&profile, today) {
    Ok(plan) => plan,
    Err(err) => fail(err.into()),
  };

  if let Some(path) = &args.store {
    let pool = plan_derive_lib::db::initialize_db(path).await?;
    let id = store::save_plan(&pool, &plan).await?;
    tracing::info!(id, "Plan stored");
    pool.close().await;
  }

  println!("{}", plan.to_json());
  Ok(())
}
