use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use apiport2json::config::{DEFAULT_OUTPUT_PATH, DEFAULT_REPO_URL};
use apiport2json::{Config, Converter, GitSource, MalformedPolicy};

#[derive(Parser)]
#[command(name = "apiport2json")]
#[command(about = "Convert ApiPort breaking-change documents to a JSON document")]
#[command(version)]
struct Args {
    #[arg(help = "URL of the ApiPort repository", default_value = DEFAULT_REPO_URL)]
    url: String,
    #[arg(help = "Path of the JSON output file", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,
    #[arg(
        long,
        value_enum,
        help = "What to do with documents that do not follow the template [default: abort]"
    )]
    on_malformed: Option<MalformedPolicy>,
    #[arg(long, help = "Branch or tag to check out")]
    branch: Option<String>,
    #[arg(long, help = "Create a shallow clone with this many commits")]
    depth: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout only carries clap's help and version output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut config = Config {
        repo_url: args.url,
        output_path: args.output,
        branch: args.branch,
        depth: args.depth,
        ..Config::default()
    }
    .with_env()?;
    if let Some(policy) = args.on_malformed {
        config.on_malformed = policy;
    }
    info!(
        url = %config.repo_url,
        output = %config.output_path.display(),
        on_malformed = ?config.on_malformed,
        "configuration loaded"
    );

    let source = GitSource::new(config.git_bin.clone())
        .with_branch(config.branch.clone())
        .with_depth(config.depth);

    let converter = Converter::new(config);
    converter
        .run(&source)
        .with_context(|| format!("failed to convert {}", converter.config().repo_url))?;
    Ok(())
}
