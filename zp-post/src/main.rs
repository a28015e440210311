//! zp-post - Post one random ZpDIC entry to Bluesky and exit

use clap::Parser;
use libzpcast::config::{load_dotenv, log_dotenv, Config, Credentials};
use libzpcast::runner::{dictionary_from_config, preview_entry};
use libzpcast::types::FormattedPost;
use libzpcast::{Result, RunReport, Runner, ZpcastError};

#[derive(Parser, Debug)]
#[command(name = "zp-post")]
#[command(version)]
#[command(about = "Post one random ZpDIC entry to Bluesky and exit")]
#[command(long_about = "\
zp-post - Post one random ZpDIC entry to Bluesky and exit

DESCRIPTION:
    Counts the words in the configured ZpDIC dictionary, picks one at
    random, formats it with a link back to the entry and posts it to
    Bluesky. The post text is printed to stdout; logs go to stderr.

USAGE:
    # Post a random entry
    zp-post

    # Show what would be posted without logging in to Bluesky
    zp-post --dry-run

    # Post the entry at a fixed offset, as JSON
    zp-post --index 42 --format json

ENVIRONMENT:
    ZPDIC_API_KEY        ZpDIC API key (required)
    BSKY_PASSWORD        Bluesky app password (required unless --dry-run)
    BSKY_IDENTIFIER      Bluesky handle (overrides config)
    ZPDIC_DICTIONARY_ID  Dictionary to draw from (overrides config)
    ZPCAST_CONFIG        Config file path
    ZPCAST_LOG_FORMAT    text, json or pretty
    ZPCAST_LOG_LEVEL     error, warn, info, debug or trace

    A .env file in the working directory is loaded first.

EXIT CODES:
    0 - Success
    1 - Dictionary, posting or cache error
    2 - Configuration error
    3 - Bluesky authentication error
    4 - Invalid input
")]
struct Cli {
    /// Fetch and format an entry without posting it
    #[arg(long)]
    dry_run: bool,

    /// Use the entry at this offset instead of a random one
    #[arg(short, long, value_name = "OFFSET")]
    index: Option<u64>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ZpcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ZpcastError::InvalidInput(format!(
                "Invalid format '{}'. Valid options: text, json",
                other
            ))),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let dotenv = load_dotenv();
    libzpcast::logging::init_default(cli.verbose);
    log_dotenv(&dotenv);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse()?;
    let config = Config::load()?;

    if cli.dry_run {
        let post = preview(&config, cli.index).await?;
        print_post(&post, None, format);
        return Ok(());
    }

    let credentials = Credentials::from_env()?;
    let mut runner = Runner::from_config(&config, credentials).await?;
    let report = runner.run(cli.index).await?;

    print_post(&report.post, Some(&report), format);
    Ok(())
}

/// Fetch and format without touching Bluesky, so only the API key is needed
async fn preview(config: &Config, index: Option<u64>) -> Result<FormattedPost> {
    let dictionary = dictionary_from_config(config, Credentials::api_key_from_env()?)?;
    let post = preview_entry(&dictionary, index, &config.zpdic.link_target()).await?;

    tracing::debug!("Dry run, not posting");
    Ok(post)
}

fn print_post(post: &FormattedPost, report: Option<&RunReport>, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("{}\n\n{}", post.formatted_str, post.link);
            if let Some(report) = report {
                println!("\n{}", report.post_uri);
            }
        }
        OutputFormat::Json => {
            let mut output = serde_json::json!({
                "entry": post.entry,
                "link": post.link,
                "formattedStr": post.formatted_str,
                "posted": report.is_some(),
            });
            if let Some(report) = report {
                output["uri"] = serde_json::json!(report.post_uri);
                output["cached"] = serde_json::json!(report.cached);
            }
            println!("{}", output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);

        let err = "yaml".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from(["zp-post", "--dry-run", "--index", "7", "-f", "json", "-v"]);
        assert!(cli.dry_run);
        assert_eq!(cli.index, Some(7));
        assert_eq!(cli.format, "json");
        assert!(cli.verbose);
    }
}
