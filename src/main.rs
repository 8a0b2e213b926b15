use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use followscan::config::platform_spec;
use followscan::{Credentials, ScrapeOptions, ScrapeResult, ScrapeStatus, route, scrape};

/// Reads the channel name and follower count off a social-media profile
/// page and prints one line of JSON to stdout.
#[derive(Parser, Debug)]
#[command(name = "followscan", version, about)]
struct Cli {
    /// Profile page URL (t.me, vk.com, instagram.com, rutube.ru, tiktok.com)
    url: String,

    /// Account username for platforms that require a login (Instagram)
    #[arg(long, env = "FOLLOWSCAN_USERNAME")]
    username: Option<String>,

    /// Account password for platforms that require a login
    #[arg(long, env = "FOLLOWSCAN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Run the browser with a visible window instead of headless
    #[arg(long)]
    headed: bool,

    /// Hard cap on each page navigation, in seconds
    #[arg(long, default_value_t = 30)]
    nav_timeout_secs: u64,
}

fn emit(result: &ScrapeResult) -> anyhow::Result<()> {
    // stdout carries exactly one JSON line; all diagnostics go to stderr.
    println!("{}", serde_json::to_string(result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("followscan=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let credentials = match (cli.username, cli.password) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        _ => None,
    };

    // Missing credentials for a login platform is a usage error: report the
    // sentinel result but exit non-zero so callers notice.
    if let Ok(platform) = route(&cli.url) {
        if platform_spec(platform).requires_login && credentials.is_none() {
            error!(%platform, "this platform requires --username and --password");
            emit(&ScrapeResult::failed(ScrapeStatus::LoginFailed))?;
            std::process::exit(2);
        }
    }

    let options = ScrapeOptions {
        headless: !cli.headed,
        nav_timeout: Duration::from_secs(cli.nav_timeout_secs),
    };

    let result = scrape(&cli.url, credentials, &options).await;
    emit(&result)?;
    Ok(())
}
