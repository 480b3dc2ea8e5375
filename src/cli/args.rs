//! Command-line argument parsing.

use crate::facets::Facet;

/// What `curator load` should fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadArgs {
    /// Collection endpoint (absolute, or relative to the base URL)
    pub endpoint: String,
    /// Number of pages to load (default: 1)
    pub pages: Option<usize>,
    /// Load until the collection is exhausted
    pub all: bool,
    /// Base URL overriding `CURATOR_BASE_URL`
    pub base_url: Option<String>,
    /// Facet filters applied to the endpoint
    pub facets: Vec<Facet>,
    /// How many times a failed page is retried before giving up
    pub retries: u32,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Stream a collection to stdout
    Load(LoadArgs),
    /// Arguments could not be understood
    Invalid(String),
}

pub const USAGE: &str = "\
Usage: curator <endpoint-url> [options]

Streams a paginated collection as JSON lines.

Options:
  --pages <N>          Load N pages (default: 1)
  --all                Load every page
  --base-url <URL>     Base URL for relative endpoints
  --facet <NAME:VALUE> Filter by facet (repeatable)
  --retries <N>        Retry a failed page up to N times (default: 0)
  -V, --version        Print version
  -h, --help           Print this help";

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use curator::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["curator".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut load = LoadArgs::default();
    let mut endpoint = None;
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--all" => load.all = true,
            "--pages" => match args.next().map(|v| v.parse::<usize>()) {
                Some(Ok(n)) if n > 0 => load.pages = Some(n),
                _ => return CliCommand::Invalid("--pages expects a positive number".to_string()),
            },
            "--retries" => match args.next().map(|v| v.parse::<u32>()) {
                Some(Ok(n)) => load.retries = n,
                _ => return CliCommand::Invalid("--retries expects a number".to_string()),
            },
            "--base-url" => match args.next() {
                Some(url) => load.base_url = Some(url),
                None => return CliCommand::Invalid("--base-url expects a URL".to_string()),
            },
            "--facet" => match args.next().as_deref().and_then(Facet::parse) {
                Some(facet) => load.facets.push(facet),
                None => return CliCommand::Invalid("--facet expects NAME:VALUE".to_string()),
            },
            flag if flag.starts_with('-') => {
                return CliCommand::Invalid(format!("unknown option '{}'", flag));
            }
            _ if endpoint.is_some() => {
                return CliCommand::Invalid(format!("unexpected argument '{}'", arg));
            }
            _ => endpoint = Some(arg),
        }
    }

    match endpoint {
        Some(endpoint) => {
            load.endpoint = endpoint;
            CliCommand::Load(load)
        }
        None => CliCommand::Help,
    }
}
