use anyhow::{anyhow, bail, Context, Result};
use csvstats::{
    analytics::{self, DEFAULT_PERIODS, DEFAULT_WINDOW},
    process::{load_csv, normalize},
};
use std::{env, path::Path, process::exit};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str =
    "<CSV_FILE> <total|moving-average|correlation|forecast> [SERIES] [WINDOW|PERIODS]";

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr) // keep stdout for the JSON result
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} {}", args[0], USAGE);
        exit(1);
    }
    match run(&args[1], &args[2], &args[3..]) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit(1);
        }
    }
}

/// Load `csv_path`, run one analysis and return the result as pretty JSON.
fn run(csv_path: &str, view: &str, rest: &[String]) -> Result<String> {
    let table =
        load_csv(Path::new(csv_path)).with_context(|| format!("failed to load {csv_path}"))?;
    tracing::info!(rows = table.row_count(), "loaded {}", csv_path);

    let series = normalize(&table).ok_or_else(|| anyhow!("{csv_path} has no data rows"))?;

    let series_name = rest
        .first()
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{view} needs a SERIES argument"));
    let count_arg = |default: usize| -> Result<usize> {
        match rest.get(1) {
            Some(n) => n.parse().with_context(|| format!("invalid count {n:?}")),
            None => Ok(default),
        }
    };

    let json = match view {
        "total" => serde_json::to_string_pretty(&analytics::series_totals(&series)?)?,
        "correlation" => serde_json::to_string_pretty(&analytics::correlation_matrix(&series))?,
        "moving-average" => serde_json::to_string_pretty(&analytics::moving_average(
            &series,
            series_name?,
            count_arg(DEFAULT_WINDOW)?,
        )?)?,
        "forecast" => serde_json::to_string_pretty(&analytics::forecast(
            &series,
            series_name?,
            count_arg(DEFAULT_PERIODS)?,
        )?)?,
        other => bail!("unknown analysis {other:?}; usage: {USAGE}"),
    };
    Ok(json)
}
