use clap::{ArgAction, Parser};
use console::{Term, set_colors_enabled};
use std::io::{self, IsTerminal};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ntptime::fmt::{self, text::TermProgress};
use ntptime::{NtpTimeError, Progress, ServerAddress, Silent, Strategy, TimeFormat, query_time};

mod config_store;

use config_store::ConfigStore;

#[derive(Parser, Debug)]
#[command(name = "ntptime")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Get the current time from an NTP server")]
#[command(long_about = Some(
    "Get the current time from one or more NTP servers.\n\
     \n\
     Examples:\n\
       ntptime\n\
       ntptime -a time.google.com:123 -f RFC3339\n\
       ntptime -H time.cloudflare.com -P time.google.com pool.ntp.org\n\
       ntptime -a 192.168.1.23 -F 0.pool.ntp.org 1.pool.ntp.org -q -f Seconds1970"
))]
struct Args {
    /// Address of the NTP server (host:port, port defaults to 123)
    #[arg(short, long)]
    address: Option<String>,

    /// Hostname of the NTP server (combine with --port)
    #[arg(short = 'H', long)]
    hostname: Option<String>,

    /// Port of the NTP server
    #[arg(short, long)]
    port: Option<u16>,

    /// Query these servers together with the primary one, first answer wins
    #[arg(short = 'P', long, num_args = 1.., value_name = "ADDRESS")]
    parallel: Vec<String>,

    /// Try these servers in order when the primary one fails
    #[arg(short = 'F', long, num_args = 1.., value_name = "ADDRESS")]
    fallback: Vec<String>,

    /// Suppress any output other than the current time or error messages
    #[arg(short, long, overrides_with = "no_quiet")]
    quiet: bool,

    /// Show progress output even when the config file sets `quiet = true`
    #[arg(long, overrides_with = "quiet")]
    no_quiet: bool,

    /// Output format: UnixDate, RFC3339, Kitchen, Seconds1970, Seconds1900, ...
    #[arg(short, long)]
    format: Option<String>,

    /// Print the result as JSON
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty-print JSON
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Disable colored output
    #[arg(long = "no-color", alias = "nocolor")]
    no_color: bool,

    /// Log verbosity (-v, -vv, -vvv); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let want_color = !args.json
        && io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none()
        && !args.no_color;
    set_colors_enabled(want_color);

    let code = match execute(&args).await {
        Ok(()) => 0,
        Err(err) => {
            Term::stderr().write_line(&fmt::text::render_error(&err)).ok();
            err.exit_code()
        }
    };
    process::exit(code);
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Everything that can be rejected is checked before the first packet leaves.
async fn execute(args: &Args) -> Result<(), NtpTimeError> {
    let store = ConfigStore::load().map_err(|e| NtpTimeError::Config(e.to_string()))?;
    debug!(path = %store.path().display(), "config loaded");
    let defaults = store.defaults();

    let quiet = match (args.quiet, args.no_quiet) {
        (true, _) => true,
        (_, true) => false,
        _ => defaults.quiet.unwrap_or(false),
    };
    let format: TimeFormat = match args.format.as_deref().or(defaults.format.as_deref()) {
        Some(name) => name.parse()?,
        None => TimeFormat::default(),
    };

    // A configured address only stands in when no hostname/port was given.
    let address = match (&args.address, &args.hostname, args.port) {
        (None, None, None) => defaults.address.as_deref(),
        _ => args.address.as_deref(),
    };
    let primary = ServerAddress::from_options(address, args.hostname.as_deref(), args.port)?;
    let strategy = Strategy::new(
        primary,
        parse_addresses(&args.parallel)?,
        parse_addresses(&args.fallback)?,
    )?;
    info!(?strategy, %format, "querying");

    // Stdout carries nothing but the JSON document in json mode.
    let progress: Box<dyn Progress> = match (quiet, args.json) {
        (true, _) => Box::new(Silent),
        (false, true) => Box::new(TermProgress::new(Term::stderr())),
        (false, false) => Box::new(TermProgress::new(Term::stdout())),
    };
    let outcome = query_time(&strategy, progress.as_ref()).await?;

    if args.json {
        println!("{}", fmt::json::to_json(&outcome, format, args.pretty)?);
    } else {
        let rendered = format.render(&outcome.local());
        Term::stdout()
            .write_line(&fmt::text::render_time(&rendered, quiet))
            .ok();
    }
    Ok(())
}

fn parse_addresses(raw: &[String]) -> Result<Vec<ServerAddress>, NtpTimeError> {
    raw.iter().map(|s| s.parse()).collect()
}
