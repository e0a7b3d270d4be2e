use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use dsn_collectors::{init_logging, CollectorManager};
use dsn_core::{AppConfig, Article, ArticleStorage};
use dsn_filter::{Pipeline, RunStatus};
use dsn_inference::{create_model, Enricher};
use dsn_storage::{create_storage, StorageKind};
use dsn_web::AppState;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// `<number><unit>` groups (`s`, `m`, `h`, `d`) summed, e.g. `1h30m`. A
    /// trailing number without a unit counts as seconds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let mut rest = compact.as_str();
        if rest.is_empty() {
            return Err("Duration must include a number".to_string());
        }

        let mut total_seconds = 0u64;
        while !rest.is_empty() {
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits == 0 {
                return Err(format!("Expected a number before {:?}", rest));
            }
            let value: u64 = rest[..digits]
                .parse()
                .map_err(|_| format!("Number too large in duration: {}", &rest[..digits]))?;
            rest = &rest[digits..];

            let mut chars = rest.chars();
            let factor = match chars.next() {
                None | Some('s') => 1,
                Some('m') => 60,
                Some('h') => 3600,
                Some('d') => 86_400,
                Some(other) => return Err(format!("Invalid duration unit: {}", other)),
            };
            rest = chars.as_str();

            total_seconds = value
                .checked_mul(factor)
                .and_then(|secs| total_seconds.checked_add(secs))
                .ok_or_else(|| format!("Duration too long: {}", s))?;
        }

        if total_seconds == 0 {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Data science news aggregator", long_about = None)]
struct Cli {
    /// JSON configuration file. Built-in defaults are used when absent.
    #[arg(long, global = true, env = "DSN_CONFIG")]
    config: Option<PathBuf>,
    /// Directory holding the daily article files
    #[arg(long, global = true, env = "DSN_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value_t = StorageKind::Json)]
    storage: StorageKind,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, global = true, env = "GEMINI_MODEL")]
    model: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect, filter, enrich and save today's articles
    Run {
        /// Keep the filtered articles untranslated and unsummarized
        #[arg(long)]
        skip_enrich: bool,
        /// Repeat every interval (e.g. 6h, 30m, 1h30m)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Run the filter pipeline over a JSON array of raw articles
    Filter {
        #[arg(long)]
        input: PathBuf,
        /// Defaults to stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Reference time for the recency window (RFC 3339)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Serve the dashboard and JSON API
    Serve {
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },
    /// List configured sources
    Sources,
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(key) = &cli.api_key {
        config.inference.api_key = Some(key.clone());
    }
    if let Some(model) = &cli.model {
        config.inference.model = model.clone();
    }
    Ok(config)
}

async fn open_storage(kind: StorageKind, data_dir: &Path) -> anyhow::Result<Arc<dyn ArticleStorage>> {
    let storage = create_storage(kind, data_dir).await?;
    info!("💾 Storage ready ({} at {})", kind, data_dir.display());
    Ok(storage)
}

struct Runner {
    collectors: CollectorManager,
    pipeline: Pipeline,
    enricher: Option<Enricher>,
    storage: Arc<dyn ArticleStorage>,
}

impl Runner {
    fn new(config: &AppConfig, storage: Arc<dyn ArticleStorage>, skip_enrich: bool) -> anyhow::Result<Self> {
        let collectors = CollectorManager::from_config(config)?;
        info!("🦗 {} sources configured", collectors.collectors().len());

        let pipeline = Pipeline::new(config.filter_config());

        let enricher = if skip_enrich {
            info!("Enrichment disabled");
            None
        } else {
            let model = create_model(&config.inference)?;
            info!("🧠 Inference model ready (using {})", model.name());
            Some(Enricher::new(model, &config.inference))
        };

        Ok(Self {
            collectors,
            pipeline,
            enricher,
            storage,
        })
    }

    async fn run_once(&mut self) -> anyhow::Result<()> {
        let started = Utc::now();
        let collected = self.collectors.collect_all().await;
        for (source, reason) in &collected.failed {
            warn!("Source {} skipped: {}", source, reason);
        }

        let run = self.pipeline.run(collected.articles, started);
        if run.report.status == RunStatus::NoArticles {
            warn!("Nothing collected; keeping previously saved articles");
            return Ok(());
        }
        if run.is_empty() {
            warn!("No article passed the filters");
            return Ok(());
        }

        let articles = match self.enricher.as_mut() {
            Some(enricher) => {
                enricher.reset_killswitch();
                enricher.enrich(run.articles).await
            }
            None => run.articles,
        };

        let saved = self
            .storage
            .save_daily(started.date_naive(), &articles)
            .await
            .context("Failed to save articles")?;

        info!(
            "✨ Saved {} articles for {} ({} new this run)",
            saved.articles.len(),
            saved.date,
            articles.len()
        );
        for (category, count) in &run.report.per_category {
            info!("  {}: {}", category, count);
        }
        if let Some(enricher) = &self.enricher {
            let stats = enricher.stats();
            info!(
                "Enrichment: {} translated, {} summarized, {} cache hits",
                stats.translated, stats.summarized, stats.cache_hits
            );
        }
        Ok(())
    }
}

async fn run(
    config: AppConfig,
    storage: StorageKind,
    skip_enrich: bool,
    interval: Option<HumanDuration>,
) -> anyhow::Result<()> {
    let storage = open_storage(storage, &config.data_dir).await?;
    let mut runner = Runner::new(&config, storage, skip_enrich)?;

    let Some(interval) = interval else {
        return runner.run_once().await;
    };

    info!("Running in periodic mode every {}s", interval.0.as_secs());
    loop {
        if let Err(e) = runner.run_once().await {
            error!("Run failed: {:#}", e);
        }
        info!("Waiting {}s before next run", interval.0.as_secs());
        tokio::time::sleep(interval.0).await;
    }
}

fn filter(
    config: &AppConfig,
    input: &Path,
    output: Option<&Path>,
    now: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let articles: Vec<Article> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of articles", input.display()))?;

    let run = Pipeline::new(config.filter_config()).run(articles, now.unwrap_or_else(Utc::now));
    for (stage, count) in &run.report.stages {
        info!("{:>18}: {}", stage, count);
    }
    if run.report.uncategorized > 0 {
        warn!("{} articles came from unmapped sources", run.report.uncategorized);
    }

    let json = serde_json::to_string_pretty(&run.articles)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} articles to {}", run.articles.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn list_sources(config: &AppConfig) {
    let filter = config.filter_config();
    println!("Configured sources:");
    for source in &config.sources {
        let category = filter
            .category_of(&source.id)
            .unwrap_or(source.category);
        println!(
            "  {:<16} {:<8} {:<3} max {:<2} {}",
            source.id, category.as_str(), source.language, source.max_articles, source.feed_url
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Run {
            skip_enrich,
            interval,
        } => run(config, cli.storage, skip_enrich, interval).await?,
        Commands::Filter { input, output, now } => {
            filter(&config, &input, output.as_deref(), now)?
        }
        Commands::Serve { port } => {
            let storage = open_storage(cli.storage, &config.data_dir).await?;
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            dsn_web::serve(AppState::new(storage), addr).await?;
        }
        Commands::Sources => list_sources(&config),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_human_duration() {
        let parse = |s: &str| s.parse::<HumanDuration>().map(|d| d.0.as_secs());
        assert_eq!(parse("1h30m"), Ok(5400));
        assert_eq!(parse("6h"), Ok(21600));
        assert_eq!(parse("1d 2h"), Ok(93600));
        assert_eq!(parse("90"), Ok(90));
        assert!(parse("").is_err());
        assert!(parse("0s").is_err());
        assert!(parse("5w").is_err());
        assert!(parse("h").is_err());
    }

    #[test]
    fn test_human_duration_overflow_is_an_error() {
        let parse = |s: &str| s.parse::<HumanDuration>().map(|d| d.0.as_secs());
        assert!(parse("99999999999999999d").is_err());
        assert!(parse("18446744073709551616").is_err());
        assert!(parse("18446744073709551615s1s").is_err());
        assert_eq!(parse("18446744073709551615"), Ok(u64::MAX));
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_interval() {
        let cli = Cli::try_parse_from(["dsn", "--storage", "memory", "run", "--skip-enrich", "--interval", "6h"]).unwrap();
        assert_eq!(cli.storage, StorageKind::Memory);
        match cli.command {
            Commands::Run { skip_enrich, interval } => {
                assert!(skip_enrich);
                assert_eq!(interval, Some(HumanDuration(Duration::from_secs(21600))));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_filter_command_offline() {
        let dir = std::env::temp_dir().join(format!("dsn_cli_filter_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("raw.json");
        let output = dir.join("out.json");

        let raw = vec![
            Article::new(
                "openai_blog",
                "Machine learning tutorial for LLM practitioners",
                "A practical guide to python implementation.",
                "https://openai.com/1",
                "2025-10-05T09:00:00Z",
            ),
            Article::new("openai_blog", "Quarterly earnings", "", "https://openai.com/2", "2025-10-05T09:00:00Z"),
        ];
        std::fs::write(&input, serde_json::to_string(&raw).unwrap()).unwrap();

        let now = "2025-10-06T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        filter(&AppConfig::default(), &input, Some(&output), Some(now)).unwrap();

        let kept: Vec<Article> = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert!(kept.iter().all(|a| a.url != "https://openai.com/2"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
