use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod anomaly;
mod config;
mod data;
mod decomposition;
mod error;
mod export;
mod models;
mod report;
mod seasonal;
mod stats;
mod weather;

use config::{AnalysisConfig, WeatherSettings};
use error::AnalysisError;
use models::Series;
use report::LiveSection;
use weather::WeatherClient;

#[derive(Parser)]
#[command(name = "city-temperature-monitor")]
#[command(about = "Historical temperature anomalies and live seasonal comparison per city", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum City {
    NewYork,
    Moscow,
    Berlin,
    Cairo,
    Dubai,
    Beijing,
}

impl City {
    fn name(self) -> &'static str {
        match self {
            City::NewYork => "New York",
            City::Moscow => "Moscow",
            City::Berlin => "Berlin",
            City::Cairo => "Cairo",
            City::Dubai => "Dubai",
            City::Beijing => "Beijing",
        }
    }
}

#[derive(clap::Args)]
struct HistoricalArgs {
    /// Standard deviations from the series mean before a reading is flagged
    #[arg(long, default_value_t = config::DEFAULT_ANOMALY_SIGMA)]
    anomaly_sigma: f64,
    /// Seasonal period in days
    #[arg(long, default_value_t = config::DEFAULT_PERIOD)]
    period: usize,
}

#[derive(clap::Args)]
struct SeasonalArgs {
    /// Standard deviations from the monthly mean before the live reading is anomalous
    #[arg(long, default_value_t = config::DEFAULT_SEASONAL_SIGMA)]
    seasonal_sigma: f64,
}

/// Configuration from whichever threshold groups a command accepts; the rest
/// keep their defaults.
fn build_config(
    historical: Option<&HistoricalArgs>,
    seasonal: Option<&SeasonalArgs>,
) -> anyhow::Result<AnalysisConfig> {
    let mut config = AnalysisConfig::default();
    if let Some(args) = historical {
        config.anomaly_sigma = args.anomaly_sigma;
        config.period = args.period;
    }
    if let Some(args) = seasonal {
        config.seasonal_sigma = args.seasonal_sigma;
    }
    config.validate()?;
    Ok(config)
}

#[derive(clap::Args)]
struct LiveArgs {
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Calendar month to compare against; defaults to the current local month
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
    #[arg(long, default_value = config::DEFAULT_WEATHER_URL)]
    weather_url: String,
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl LiveArgs {
    fn settings(&self) -> WeatherSettings {
        WeatherSettings {
            base_url: self.weather_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    fn month(&self) -> u32 {
        self.month.unwrap_or_else(|| Local::now().month())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Descriptive statistics, anomalies and seasonal decomposition
    Analyze {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum)]
        city: City,
        #[command(flatten)]
        historical: HistoricalArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compare the live temperature with the historical monthly mean
    Current {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum)]
        city: City,
        #[command(flatten)]
        seasonal: SeasonalArgs,
        #[command(flatten)]
        live: LiveArgs,
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown report covering both historical and live analysis
    Report {
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long, value_enum)]
        city: City,
        #[command(flatten)]
        historical: HistoricalArgs,
        #[command(flatten)]
        seasonal: SeasonalArgs,
        #[command(flatten)]
        live: LiveArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export per-day temperature, anomaly flag and components as CSV
    Export {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum)]
        city: City,
        #[command(flatten)]
        historical: HistoricalArgs,
        #[arg(long, default_value = "anomalies.csv")]
        out: PathBuf,
    },
}

fn load_series(csv: &std::path::Path, city: City) -> anyhow::Result<Series> {
    let observations = data::load_observations(csv)
        .context("failed to load historical data")?;
    let series = data::filter_city(&observations, city.name());
    if series.is_empty() {
        let known: Vec<String> = data::cities(&observations).into_iter().collect();
        return Err(AnalysisError::EmptySeries {
            city: city.name().to_string(),
        })
        .with_context(|| format!("cities present in file: {}", known.join(", ")));
    }
    tracing::info!(city = city.name(), observations = series.len(), "series ready");
    Ok(series)
}

async fn fetch_live(live: &LiveArgs, city: City) -> Result<models::LiveReading, error::FetchError> {
    let client = WeatherClient::new(live.api_key.as_deref().unwrap_or(""), &live.settings())?;
    client.current_temperature(city.name()).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            csv,
            city,
            historical,
            limit,
            json,
        } => {
            let config = build_config(Some(&historical), None)?;
            let series = load_series(&csv, city)?;
            let stats = stats::describe(&series)?;
            let anomalies = anomaly::flag_anomalies(&series, config.anomaly_sigma)?;
            let decomposition = decomposition::decompose(&series, config.period)
                .map(|result| decomposition::summarize(&result));

            if json {
                let (summary, decomposition_error) = match &decomposition {
                    Ok(summary) => (Some(summary), None),
                    Err(error) => (None, Some(error.to_string())),
                };
                let output = serde_json::json!({
                    "city": city.name(),
                    "stats": stats,
                    "anomalies": anomalies,
                    "decomposition": summary,
                    "decomposition_error": decomposition_error,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            println!("Descriptive statistics for {}:", city.name());
            println!(
                "  count {}  mean {:.2}  std {}  min {:.2}  25% {:.2}  50% {:.2}  75% {:.2}  max {:.2}",
                stats.count,
                stats.mean,
                stats
                    .std_dev
                    .map(|std| format!("{std:.2}"))
                    .unwrap_or_else(|| "n/a".to_string()),
                stats.min,
                stats.q25,
                stats.median,
                stats.q75,
                stats.max
            );

            if anomalies.anomalies.is_empty() {
                println!("No anomalies beyond {} standard deviations.", config.anomaly_sigma);
            } else {
                println!(
                    "{} anomalies beyond {} standard deviations:",
                    anomalies.anomalies.len(),
                    config.anomaly_sigma
                );
                for anomaly in anomalies.anomalies.iter().take(limit) {
                    println!(
                        "- {} {:.2} ({:+.2})",
                        anomaly.date, anomaly.temperature, anomaly.deviation
                    );
                }
            }

            match decomposition {
                Ok(summary) => println!(
                    "Seasonal decomposition (period {}): seasonal amplitude {:.2}, residual std {}",
                    summary.period,
                    summary.seasonal_amplitude,
                    summary
                        .residual_std_dev
                        .map(|std| format!("{std:.2}"))
                        .unwrap_or_else(|| "n/a".to_string())
                ),
                Err(error) => println!("Seasonal decomposition unavailable: {error}"),
            }
        }
        Commands::Current {
            csv,
            city,
            seasonal: seasonal_args,
            live,
            json,
        } => {
            let config = build_config(None, Some(&seasonal_args))?;
            let series = load_series(&csv, city)?;
            let reading = fetch_live(&live, city).await?;
            let comparison =
                seasonal::compare(reading.temperature, live.month(), &series, config.seasonal_sigma)?;

            if json {
                let output = serde_json::json!({
                    "city": city.name(),
                    "reading": reading,
                    "comparison": comparison,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            println!(
                "Current temperature in {}: {:.2}°C",
                city.name(),
                reading.temperature
            );
            println!(
                "Historical mean for month {}: {:.2}°C (std {:.2}, {} observations)",
                comparison.month, comparison.mean, comparison.std_dev, comparison.samples
            );
            println!("{}", report::verdict_sentence(comparison.verdict));
        }
        Commands::Report {
            csv,
            city,
            historical,
            seasonal: seasonal_args,
            live,
            limit,
            out,
        } => {
            let config = build_config(Some(&historical), Some(&seasonal_args))?;
            let historical = match &csv {
                Some(path) => data::load_observations(path)
                    .map(|observations| data::filter_city(&observations, city.name()))
                    .and_then(|series| {
                        if series.is_empty() {
                            Err(AnalysisError::EmptySeries {
                                city: city.name().to_string(),
                            })
                        } else {
                            Ok(series)
                        }
                    }),
                None => Err(AnalysisError::MissingFileInput),
            };

            let live_section = match fetch_live(&live, city).await {
                Ok(reading) => match &historical {
                    Ok(series) => match seasonal::compare(
                        reading.temperature,
                        live.month(),
                        series,
                        config.seasonal_sigma,
                    ) {
                        Ok(comparison) => LiveSection::Compared {
                            reading,
                            comparison,
                        },
                        Err(error) => LiveSection::ComparisonFailed { reading, error },
                    },
                    Err(_) => LiveSection::NoBaseline { reading },
                },
                Err(error) => LiveSection::FetchFailed(error),
            };

            let report = report::build_report(city.name(), &historical, &live_section, &config, limit);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            csv,
            city,
            historical,
            out,
        } => {
            let config = build_config(Some(&historical), None)?;
            let series = load_series(&csv, city)?;
            let analysis = anomaly::detect(&series, &config)?;
            let rows = export::export_rows(&series, &analysis);
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            export::write_export(file, &rows)?;
            println!(
                "Exported {} rows ({} anomalies, mean {:.2}°C) to {}.",
                rows.len(),
                analysis.anomalies.anomalies.len(),
                analysis.stats.mean,
                out.display()
            );
        }
    }

    Ok(())
}
