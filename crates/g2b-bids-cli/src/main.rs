use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use g2b_bids::config::{
    DEFAULT_KEYWORD_COLUMN, DEFAULT_KEYWORDS_FILE, DEFAULT_MAX_ROWS, DEFAULT_TIMEOUT_SECS,
};
use g2b_bids::{BASE_URL, BidDate, Config};
use log::LevelFilter;

const DEFAULT_LOG_FILE: &str = "g2b_search.log";

#[derive(Parser)]
#[command(name = "g2b-bids")]
#[command(about = "Daily keyword search of G2B public procurement bid announcements", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        env = "G2B_LOG_FILE",
        default_value = DEFAULT_LOG_FILE,
        global = true,
        help = "Append log lines to this file as well as stderr"
    )]
    log_file: PathBuf,

    #[arg(long, global = true, help = "Log to stderr only")]
    no_log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(
        long,
        env = "G2B_SERVICE_KEY",
        hide_env_values = true,
        help = "data.go.kr service key (decoded form)"
    )]
    service_key: Option<String>,

    #[arg(long, env = "G2B_BASE_URL", default_value = BASE_URL, help = "Bid listing API endpoint")]
    base_url: String,

    #[arg(
        long,
        env = "G2B_KEYWORDS_FILE",
        default_value = DEFAULT_KEYWORDS_FILE,
        help = "CSV file holding the search keywords"
    )]
    keywords_file: PathBuf,

    #[arg(
        long,
        env = "G2B_KEYWORD_COLUMN",
        default_value = DEFAULT_KEYWORD_COLUMN,
        help = "Header of the keyword column"
    )]
    keyword_column: String,

    #[arg(
        long,
        env = "G2B_OUTPUT_DIR",
        default_value = ".",
        help = "Directory for the daily result files"
    )]
    output_dir: PathBuf,

    #[arg(
        long,
        env = "G2B_MAX_ROWS",
        default_value_t = DEFAULT_MAX_ROWS,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Maximum rows requested per keyword"
    )]
    max_rows: u32,

    #[arg(
        long,
        env = "G2B_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "HTTP timeout per request, in seconds"
    )]
    timeout_secs: u64,
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        Config {
            service_key: args.service_key,
            base_url: args.base_url,
            keywords_file: args.keywords_file,
            keyword_column: args.keyword_column,
            output_dir: args.output_dir,
            max_rows: args.max_rows,
            timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search every keyword for one day, save the results and merge them with the previous day's file
    Collect {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(
            long,
            value_name = "YYYYMMDD",
            value_parser = parse_date,
            help = "Day to collect [default: today]"
        )]
        date: Option<BidDate>,
    },
    /// Merge two existing result files, keeping the first file's records and adding unseen ones from the second
    Merge {
        #[arg(long, help = "Result file whose records come first")]
        today: PathBuf,

        #[arg(long, help = "Result file to take unseen bid numbers from")]
        yesterday: PathBuf,

        #[arg(short = 'o', long, help = "Where to write the combined file")]
        output: PathBuf,
    },
}

fn parse_date(s: &str) -> Result<BidDate, String> {
    s.parse::<BidDate>().map_err(|e| e.to_string())
}

/// Copies every log line to stderr and the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self.file.write_all(buf);
        let stderr = io::stderr().write_all(buf);
        file.and(stderr).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let file = self.file.flush();
        let stderr = io::stderr().flush();
        file.and(stderr)
    }
}

fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> Option<io::Error> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);

    let mut open_error = None;
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder
                    .target(env_logger::Target::Pipe(Box::new(Tee { file })))
                    .write_style(env_logger::WriteStyle::Never);
            }
            Err(e) => open_error = Some(e),
        }
    }

    builder.init();
    open_error
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Loaded before parsing so env-backed arguments see .env values.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_file = (!cli.no_log_file).then_some(cli.log_file.as_path());
    if let Some(e) = init_logger(cli.log_level.clone().into(), log_file) {
        log::warn!("Could not open log file {:?}: {}", cli.log_file, e);
    }

    match dotenv {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file found"),
        Err(e) => log::warn!("Failed to load .env file: {}", e),
    }

    match cli.command {
        Commands::Collect { config, date } => {
            let config = Config::from(config);
            let date = date.unwrap_or_else(BidDate::today);

            let summary = g2b_bids::run(&config, date).await.unwrap_or_else(|e| {
                log::error!("Run halted: {}", e);
                process::exit(1);
            });

            if summary.failed_keywords() > 0 {
                log::warn!(
                    "{} of {} keyword(s) failed and contributed no records",
                    summary.failed_keywords(),
                    summary.keywords.len()
                );
            }
            print!("{}", summary);
        }

        Commands::Merge {
            today,
            yesterday,
            output,
        } => {
            let total = g2b_bids::merge_files(&today, &yesterday, &output).unwrap_or_else(|e| {
                log::error!("Merge failed: {}", e);
                process::exit(1);
            });
            println!("Wrote {} record(s) to {}", total, output.display());
        }
    }
}
