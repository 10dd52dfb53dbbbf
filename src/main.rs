//! Print a single line of a (large) file. The file gets indexed on first use, following reads only
//! seek to the requested line.

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use async_std::path::PathBuf as AsyncPathBuf;
use clap::Parser;
use line_index::{
    config::DEFAULT_INDEX_SUFFIX, ensure_index, Config, Freshness, Locator, ReadByLine, Result,
};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Print a line of a file using a pregenerated index", long_about = None)]
struct Cli {
    /// File to read from
    file: PathBuf,

    /// Line to print, starting at 0
    line: u64,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Rebuild the index even if it already exists
    #[arg(long)]
    rebuild: bool,

    /// Rebuild the index if the file was modified after the index was built
    #[arg(long)]
    check_stale: bool,

    /// Suffix appended to the files path to get the path of its index
    #[arg(long, default_value = DEFAULT_INDEX_SUFFIX)]
    suffix: String,
}

impl Cli {
    fn config(&self) -> Config {
        let freshness = if self.check_stale {
            Freshness::Modified
        } else {
            Freshness::Trust
        };

        let config = Config::from_env();
        let debug = config.debug || self.verbose > 0;
        config
            .with_debug(debug)
            .with_rebuild(self.rebuild)
            .with_freshness(freshness)
            .with_index_suffix(self.suffix.as_str())
    }
}

fn init_logging(config: &Config, verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let source = AsyncPathBuf::from(cli.file.clone());
    let index = ensure_index(&source, config).await?;

    let mut buf = Vec::new();
    Locator::open(&source, &index)
        .await?
        .read_line_raw(cli.line, &mut buf)
        .await?;

    let mut out = io::stdout().lock();
    out.write_all(&buf)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

#[async_std::main]
async fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();
    let config = cli.config();
    init_logging(&config, cli.verbose);

    let code = match run(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(file = %cli.file.display(), line = cli.line, error = ?err, "lookup failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    };

    debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "execution time"
    );
    code
}
