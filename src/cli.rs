use clap::Parser;

/// Concurrent HTTP fuzzing engine: path, subdomain, method and data discovery.
#[derive(Debug, Parser)]
#[command(name = "fuzzwright", author, version, about)]
pub struct Cli {
    /// Target URL containing an injection marker, e.g. http://host/FUZZ
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Raw HTTP request file (request-line + headers + optional body) in place of -u
    #[arg(short = 'r', long)]
    pub rawfile: Option<String>,

    /// Scheme to assume when building the target from a raw request file (default https)
    #[arg(long)]
    pub scheme: Option<String>,

    /// Wordlist: repeatable -w NAME=PARAM, -w [a,b,c], or a file path
    #[arg(short = 'w', long = "wordlist")]
    pub wordlist: Vec<String>,

    /// Keep only unique raw wordlist entries before transform
    #[arg(long)]
    pub unique: bool,

    /// Custom injection marker literal (default "$")
    #[arg(long)]
    pub marker: Option<String>,

    /// HTTP method template; contains the marker for method fuzzing (default GET)
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Extra header in "Name: Value" form; repeatable
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body template; contains the marker for data fuzzing
    #[arg(short = 'd', long)]
    pub data: Option<String>,

    /// Allowed status codes: comma list and/or one LO-HI range
    #[arg(short = 'M', long = "match-codes")]
    pub match_codes: Option<String>,

    /// Reject results whose body length exceeds this many bytes
    #[arg(long = "Ms")]
    pub match_length: Option<usize>,

    /// Reject results whose RTT exceeds this many seconds
    #[arg(long = "Mt")]
    pub match_time: Option<f64>,

    /// CODES:ACTION=PARAM, e.g. "429,503:wait=5" or "403:stop"
    #[arg(long = "blacklist-status")]
    pub blacklist_status: Option<String>,

    /// Number of concurrent workers (default 10)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Per-request pacing delay in seconds (default 0)
    #[arg(long)]
    pub delay: Option<f64>,

    /// Per-request HTTP timeout in seconds (default 10)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Follow HTTP redirects (up to 10 hops)
    #[arg(long)]
    pub follow_redirects: bool,

    /// Comma-separated prefixes applied before each payload
    #[arg(long)]
    pub prefix: Option<String>,

    /// Comma-separated suffixes applied after each payload
    #[arg(long)]
    pub suffix: Option<String>,

    #[arg(long, conflicts_with_all = ["upper", "capitalize"])]
    pub lower: bool,

    #[arg(long, conflicts_with_all = ["lower", "capitalize"])]
    pub upper: bool,

    #[arg(long, conflicts_with_all = ["lower", "upper"])]
    pub capitalize: bool,

    /// NAME[=PARAM][@REGEX], repeatable; comma-separated names within one -e form a chain
    #[arg(short = 'e', long = "encoder")]
    pub encoders: Vec<String>,

    /// Scanner plugin name; defaults to the one matching the detected fuzzing mode
    #[arg(long)]
    pub scanner: Option<String>,

    /// Report file; extension (.txt/.csv/.json) selects the writer
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Verbose: print every result, matched or not
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Extra-verbose: verbose plus request/response diagnostics
    #[arg(long = "V2")]
    pub very_verbose: bool,

    /// Suppress the banner and per-request progress bar
    #[arg(long)]
    pub simple_output: bool,

    /// Cookie header value sent with every request
    #[arg(long)]
    pub cookie: Option<String>,

    /// Single proxy URL
    #[arg(long)]
    pub proxy: Option<String>,

    /// File of proxy URLs, one per line, rotated round-robin
    #[arg(long)]
    pub proxies: Option<String>,

    /// TOML config file overlay; CLI flags take precedence over its values
    #[arg(long)]
    pub config: Option<String>,
}
