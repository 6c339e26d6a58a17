//! 🚀 saw-cli: the front door. Parses flags, sets up logging, loads config,
//! then hands the actual sawing to the `saw` library.
//!
//! 🎬 *[narrator voice]* "It all started with a bucket nobody had listed in years..."
//! 🦆

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use saw::{ListObjectsOptions, OutputFormat, SendMessageOptions};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "saw")]
#[command(about = "Concurrent bulk helpers for S3 listings and SQS batch sends")]
#[command(version)]
struct Cli {
    /// Number of workers (overrides runtime.concurrency, default 2)
    #[arg(short, long, global = true)]
    concurrency: Option<usize>,

    /// Optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// S3 helpers
    #[command(subcommand)]
    S3(S3Commands),
    /// SQS helpers
    #[command(subcommand)]
    Sqs(SqsCommands),
}

#[derive(Debug, Subcommand)]
enum S3Commands {
    /// List objects under one or more prefixes, one line per object
    ListObjects(ListObjectsArgs),
}

#[derive(Debug, Subcommand)]
enum SqsCommands {
    /// Send lines from a file (or stdin) as SQS message batches
    SendMessage(SendMessageArgs),
}

/// 🏷️ The flag-facing twin of `OutputFormat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    #[default]
    Plain,
    CwlS3Event,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Plain => OutputFormat::Plain,
            FormatArg::CwlS3Event => OutputFormat::CwlS3Event,
        }
    }
}

#[derive(Debug, Args)]
struct ListObjectsArgs {
    /// Bucket to list
    #[arg(short, long)]
    bucket: Option<String>,

    /// Prefix to list; repeat the flag or pass a comma-separated list
    #[arg(short, long = "prefix", value_delimiter = ',')]
    prefixes: Vec<String>,

    /// Delimiter for grouping keys
    #[arg(short, long, default_value = "")]
    delimiter: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Plain)]
    format: FormatArg,

    /// detail-type for cwl-s3-event output
    #[arg(long, default_value = "Object Created")]
    detail_type: String,

    /// detail.reason for cwl-s3-event output
    #[arg(long, default_value = "PutObject")]
    reason: String,
}

#[derive(Debug, Args)]
struct SendMessageArgs {
    /// Queue URL to send to
    #[arg(short, long)]
    queue_url: Option<String>,

    /// Input file with one message per line (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Messages per batch (SQS accepts at most 10)
    #[arg(short = 'm', long = "message-size", visible_alias = "batch-size", default_value_t = 10)]
    message_size: usize,
}

/// 📜 Prints the help of `s3 list-objects`-style nested subcommands.
fn print_subcommand_help(path: &[&str]) -> Result<()> {
    let mut command = Cli::command();
    let mut current = &mut command;
    for name in path {
        current = match current.find_subcommand_mut(name) {
            Some(sub) => sub,
            None => bail!("💀 no such subcommand '{}'", name),
        };
    }
    current
        .print_help()
        .context("💀 Could not even print the help. stdout has given up on us.")
}

impl ListObjectsArgs {
    /// 🔧 `None` when the bucket is missing, so the caller can show help.
    fn into_options(self) -> Option<ListObjectsOptions> {
        let bucket = self.bucket.filter(|bucket| !bucket.is_empty())?;
        Some(ListObjectsOptions {
            bucket,
            prefixes: self.prefixes,
            delimiter: self.delimiter,
            format: self.format.into(),
            detail_type: self.detail_type,
            reason: self.reason,
        })
    }
}

impl SendMessageArgs {
    fn into_options(self) -> Option<SendMessageOptions> {
        let queue_url = self.queue_url.filter(|url| !url.is_empty())?;
        Some(SendMessageOptions {
            queue_url,
            input: self.input,
            message_batch_size: self.message_size,
        })
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut app_config = saw::load_config(cli.config.as_deref())
        .context("💀 Couldn't load the configuration. Check the file and the SAW_* env vars.")?;
    if let Some(concurrency) = cli.concurrency {
        app_config.runtime.concurrency = concurrency;
    }

    match cli.command {
        Commands::S3(S3Commands::ListObjects(args)) => {
            let Some(options) = args.into_options() else {
                print_subcommand_help(&["s3", "list-objects"])?;
                bail!("💀 --bucket is required");
            };
            saw::list_objects(app_config, options).await?;
        }
        Commands::Sqs(SqsCommands::SendMessage(args)) => {
            let Some(options) = args.into_options() else {
                print_subcommand_help(&["sqs", "send-message"])?;
                bail!("💀 --queue-url is required");
            };
            saw::send_messages(app_config, options).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 📡 stderr only. stdout belongs to whoever is piping us.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion, one layer at a time
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_clap_agrees_with_itself() {
        Cli::command().debug_assert();
    }

    #[test]
    fn the_one_where_prefixes_repeat_and_split_on_commas() {
        let cli = Cli::try_parse_from([
            "saw", "-c", "8", "s3", "list-objects", "-b", "bkt", "-p", "a/,b/", "--prefix", "c/",
            "-f", "cwl-s3-event",
        ])
        .expect("💀 should parse");

        assert_eq!(cli.concurrency, Some(8));
        let Commands::S3(S3Commands::ListObjects(args)) = cli.command else {
            panic!("💀 wrong subcommand");
        };
        let the_options = args.into_options().expect("💀 bucket was given");
        assert_eq!(the_options.bucket, "bkt");
        assert_eq!(the_options.prefixes, vec!["a/", "b/", "c/"]);
        assert_eq!(the_options.format, OutputFormat::CwlS3Event);
        assert_eq!(the_options.detail_type, "Object Created");
        assert_eq!(the_options.reason, "PutObject");
    }

    #[test]
    fn the_one_where_a_missing_bucket_means_no_options() {
        let cli = Cli::try_parse_from(["saw", "s3", "list-objects"]).expect("💀 should parse");
        let Commands::S3(S3Commands::ListObjects(args)) = cli.command else {
            panic!("💀 wrong subcommand");
        };
        assert!(args.into_options().is_none());
    }

    #[test]
    fn the_one_where_batch_size_is_an_alias_for_message_size() {
        let cli = Cli::try_parse_from([
            "saw", "sqs", "send-message", "-q", "https://q", "--batch-size", "5", "-i", "msgs.txt",
            "--concurrency", "3",
        ])
        .expect("💀 should parse");

        assert_eq!(cli.concurrency, Some(3));
        let Commands::Sqs(SqsCommands::SendMessage(args)) = cli.command else {
            panic!("💀 wrong subcommand");
        };
        let the_options = args.into_options().expect("💀 queue url was given");
        assert_eq!(the_options.message_batch_size, 5);
        assert_eq!(the_options.input, Some(PathBuf::from("msgs.txt")));
    }

    #[test]
    fn the_one_where_message_size_defaults_to_ten() {
        let cli = Cli::try_parse_from(["saw", "sqs", "send-message", "-q", "https://q"])
            .expect("💀 should parse");
        let Commands::Sqs(SqsCommands::SendMessage(args)) = cli.command else {
            panic!("💀 wrong subcommand");
        };
        assert_eq!(args.message_size, 10);
        assert_eq!(args.input, None);
    }
}
