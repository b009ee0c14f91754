use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use magpie_ai::OpenAiComposer;
use magpie_browser::{ChromeSessionProvider, SessionConfig, SessionProvider};
use magpie_core::{load_app_config, AppConfig, LogNotifier, MemoryStore, Store, TrackedProfile};
use magpie_curator::{
    platform, start_scheduler, Curator, CuratorOptions, ProgressStatus, SETTING_SCHEDULE_ENABLED,
    SETTING_SCHEDULE_INTERVAL_HOURS,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "magpie")]
#[command(about = "Curates and engages with posts from tracked profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one curation pass over the given profiles.
    Run {
        /// Profile handle to track; repeat for several.
        #[arg(long = "profile", required = true)]
        profiles: Vec<String>,
    },
    /// Open a headful browser to log in. The session persists in the
    /// browser profile directory and is reused by every other command.
    Login,
    /// Arm the recurring scheduler and stay in the foreground.
    Schedule {
        /// Profile handle to track; repeat for several.
        #[arg(long = "profile", required = true)]
        profiles: Vec<String>,
        /// Hours between runs; fires at hour-of-day multiples.
        #[arg(long, default_value_t = 12)]
        interval_hours: u32,
    },
    /// Like a post and publish a comment on it.
    Publish {
        #[arg(long)]
        shortcode: String,
        #[arg(long)]
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config()?;
    init_tracing(&config);

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { profiles } => run_once(&config, &profiles).await,
        Commands::Login => login(&config).await,
        Commands::Schedule {
            profiles,
            interval_hours,
        } => schedule(&config, &profiles, interval_hours).await,
        Commands::Publish { shortcode, text } => publish(&config, &shortcode, &text).await,
    }
}

fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_curator(config: &AppConfig, profiles: &[String]) -> Arc<Curator> {
    let store = Arc::new(MemoryStore::new());
    store.set_profiles(
        profiles
            .iter()
            .map(|handle| TrackedProfile {
                handle: handle.clone(),
                enabled: true,
            })
            .collect(),
    );

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; comment suggestions disabled");
    }
    let composer = OpenAiComposer::new(
        config.openai_api_key.as_deref().unwrap_or_default(),
        &config.openai_model,
    )
    .with_base_url(&config.openai_base_url)
    .with_max_images(config.ai_max_images);

    let sessions = ChromeSessionProvider::new(SessionConfig {
        profile_dir: config.browser_profile_dir.clone(),
        headless: config.browser_headless,
        user_agent: config.browser_user_agent.clone(),
    });

    let options = CuratorOptions {
        feed_timeout: Duration::from_secs(config.feed_timeout_secs),
        comment_verify_timeout: Duration::from_secs(config.comment_verify_timeout_secs),
        like_settle: Duration::from_millis(config.like_settle_ms),
        screenshot_dir: config.screenshot_dir.clone(),
        max_images_per_request: config.ai_max_images,
    };

    Arc::new(Curator::new(
        store,
        Arc::new(LogNotifier),
        Arc::new(composer),
        Arc::new(sessions),
        options,
    ))
}

async fn run_once(config: &AppConfig, profiles: &[String]) -> anyhow::Result<()> {
    let curator = build_curator(config, profiles);
    let started = curator.run_if_idle().await?;
    if !started {
        anyhow::bail!("a curation run is already in progress");
    }

    let snapshot = curator.progress().snapshot();
    match snapshot.status {
        ProgressStatus::Failed => {
            anyhow::bail!("run failed: {}", snapshot.error.unwrap_or_default())
        }
        _ => {
            println!("curated {} posts", snapshot.curated_count);
            Ok(())
        }
    }
}

async fn login(config: &AppConfig) -> anyhow::Result<()> {
    let sessions = ChromeSessionProvider::new(SessionConfig {
        profile_dir: config.browser_profile_dir.clone(),
        headless: false,
        user_agent: config.browser_user_agent.clone(),
    });
    let mut session = sessions.open().await?;
    session.page().goto(platform::BASE_URL).await?;

    println!("Log in in the browser window, then press Enter here to save the session.");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    session.close().await?;
    println!(
        "Session saved to {}",
        config.browser_profile_dir.display()
    );
    Ok(())
}

async fn schedule(
    config: &AppConfig,
    profiles: &[String],
    interval_hours: u32,
) -> anyhow::Result<()> {
    let curator = build_curator(config, profiles);
    let store = curator.store();
    store.set_setting(SETTING_SCHEDULE_ENABLED, "true").await?;
    store
        .set_setting(SETTING_SCHEDULE_INTERVAL_HOURS, &interval_hours.to_string())
        .await?;

    // Keep the scheduler handle alive; dropping it stops the jobs.
    let _scheduler = start_scheduler(Arc::clone(&curator)).await?;

    if let Some(next) = curator.next_scheduled_run().await? {
        println!("next run at {next}");
    }
    println!("scheduler running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    Ok(())
}

async fn publish(config: &AppConfig, shortcode: &str, text: &str) -> anyhow::Result<()> {
    let curator = build_curator(config, &[]);
    curator.publish_comment(shortcode, text).await?;
    println!("comment published on {shortcode}");
    Ok(())
}
