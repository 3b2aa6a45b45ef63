use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use fuzzwright::banner;
use fuzzwright::cli::Cli;
use fuzzwright::config::{self, FileConfig};
use fuzzwright::dictionary::Dictionary;
use fuzzwright::encoders::{parse_encoder_spec, EncoderSpec};
use fuzzwright::error::FuzzError;
use fuzzwright::fuzzer::{ErrorSink, Fuzzer, ResultSink};
use fuzzwright::matcher::{Matcher, StatusSet};
use fuzzwright::payload::{CaseFold, PayloadTransform};
use fuzzwright::report;
use fuzzwright::requester::{BaseRequester, Requester, SubdomainRequester, TokioResolver};
use fuzzwright::result::{ErrorRecord, FuzzResult};
use fuzzwright::scanner::{self, Scanner};
use fuzzwright::target::{FuzzingMode, Injector, Target};
use fuzzwright::wordlist::{self, WordlistSource};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let file_config = match &cli.config {
        Some(path) => FileConfig::load(Path::new(path)).context("loading --config file")?,
        None => FileConfig::default(),
    };

    match run(cli, file_config).await {
        Ok(()) => Ok(()),
        Err(FuzzError::StopAction { status }) => {
            eprintln!("stopped by blacklist action on status {status}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run(cli: Cli, file_config: FileConfig) -> Result<(), FuzzError> {
    let threads = config::overlay(cli.threads, file_config.threads).unwrap_or(10);
    let delay_secs = config::overlay(cli.delay, file_config.delay).unwrap_or(0.0);
    let timeout_secs = config::overlay(cli.timeout, file_config.timeout).unwrap_or(10);
    let scheme = config::overlay(cli.scheme.clone(), file_config.scheme.clone())
        .unwrap_or_else(|| "https".to_string());
    let follow_redirects = cli.follow_redirects || file_config.follow_redirects.unwrap_or(false);
    let unique = cli.unique || file_config.unique.unwrap_or(false);
    let cookie = config::overlay(cli.cookie.clone(), file_config.cookie.clone());
    let output = config::overlay(cli.output.clone(), file_config.output.clone());

    let target = build_target(&cli, &file_config, &scheme)?;
    let injector = Injector::new(target);
    let mode = injector.mode();

    let raw_words = load_wordlist(&cli, &file_config, injector.target()).await?;
    if raw_words.is_empty() {
        return Err(FuzzError::Config("wordlist is empty".to_string()));
    }

    let transform = build_transform(&cli, &file_config)?;
    let dictionary = Dictionary::build(raw_words, transform, unique)?;
    let total = dictionary.len() as u64;

    let matcher = build_matcher(&cli, &file_config, mode)?;
    let blacklist = match config::overlay(cli.blacklist_status.clone(), file_config.blacklist_status.clone()) {
        Some(spec) => Some(config::parse_blacklist(&spec)?),
        None => None,
    };

    let proxies = load_proxies(&cli)?;
    let base = BaseRequester::build(Duration::from_secs(timeout_secs), &proxies, follow_redirects, cookie)?;
    let requester: Arc<dyn Requester> = if mode == FuzzingMode::Subdomain {
        Arc::new(SubdomainRequester::new(base, Box::new(TokioResolver)))
    } else {
        Arc::new(base)
    };

    let scanner_name = config::overlay(cli.scanner.clone(), file_config.scanner.clone());
    let scanner: Arc<dyn Scanner> = match scanner_name {
        Some(name) => scanner::by_name(&name)?,
        None => default_scanner(mode),
    };

    let simple_output = cli.simple_output;
    if !simple_output {
        banner::print_banner(&injector.target().pure_url(), threads);
    }

    let bar = if simple_output {
        None
    } else {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    };

    let sink = Arc::new(CliSink {
        scanner: scanner.clone(),
        matched: Mutex::new(Vec::new()),
        verbose: cli.verbose || cli.very_verbose,
        sent: AtomicU64::new(0),
        errors: AtomicUsize::new(0),
        invalid_hosts: AtomicUsize::new(0),
        bar: bar.clone(),
    });

    let fuzzer = Arc::new(Fuzzer::new(
        dictionary,
        injector,
        requester,
        scanner.clone(),
        matcher,
        blacklist,
        sink.clone(),
        sink.clone(),
        threads,
        Duration::from_secs_f64(delay_secs.max(0.0)),
    ));

    let mut run_handle = {
        let fuzzer = fuzzer.clone();
        tokio::spawn(async move { fuzzer.run().await })
    };

    let outcome = tokio::select! {
        res = &mut run_handle => res.expect("fuzzer worker pool task panicked"),
        _ = tokio::signal::ctrl_c() => {
            fuzzer.stop();
            run_handle.await.expect("fuzzer worker pool task panicked")
        }
    };

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let matched = sink.matched.lock().unwrap();
    if let Some(path) = &output {
        report::write_report(path, &matched, scanner.as_ref())?;
    }
    if !simple_output {
        banner::print_summary(
            sink.sent.load(Ordering::SeqCst),
            matched.len(),
            sink.errors.load(Ordering::SeqCst) + sink.invalid_hosts.load(Ordering::SeqCst),
        );
    }

    outcome
}

fn build_target(cli: &Cli, file_config: &FileConfig, scheme: &str) -> Result<Target, FuzzError> {
    let marker = cli.marker.clone();
    let url = config::overlay(cli.url.clone(), file_config.url.clone());
    let rawfile = config::overlay(cli.rawfile.clone(), file_config.rawfile.clone());

    let mut target = match (url, rawfile) {
        (Some(url), _) => {
            let method = config::overlay(cli.method.clone(), file_config.method.clone())
                .unwrap_or_else(|| "GET".to_string());
            let headers = parse_headers(&cli.headers)?;
            Target::new(url).with_method(method).with_headers(headers).with_body(cli.data.clone())
        }
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(&path).map_err(FuzzError::Io)?;
            Target::from_raw_request(&raw, scheme)?
        }
        (None, None) => return Err(FuzzError::Config("one of -u/--url or -r/--rawfile is required".to_string())),
    };

    if let Some(marker) = marker {
        target = target.with_marker(marker);
    }
    Ok(target)
}

fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>, FuzzError> {
    raw.iter()
        .map(|h| {
            h.split_once(':')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| FuzzError::Config(format!("invalid header '{h}', expected 'Name: Value'")))
        })
        .collect()
}

async fn load_wordlist(cli: &Cli, file_config: &FileConfig, target: &Target) -> Result<Vec<String>, FuzzError> {
    let specs = config::overlay_vec(cli.wordlist.clone(), file_config.wordlist.clone());
    if specs.is_empty() {
        return Err(FuzzError::Config("at least one -w/--wordlist is required".to_string()));
    }
    let mut words = Vec::new();
    for spec in &specs {
        let source = WordlistSource::parse(spec);
        words.extend(wordlist::load(&source, target).await?);
    }
    Ok(words)
}

fn build_transform(cli: &Cli, file_config: &FileConfig) -> Result<PayloadTransform, FuzzError> {
    let mut transform = PayloadTransform::new();

    let prefix = config::overlay(cli.prefix.clone(), file_config.prefix.clone());
    if let Some(csv) = prefix {
        transform.prefixes = csv.split(',').map(str::to_string).collect();
    }
    let suffix = config::overlay(cli.suffix.clone(), file_config.suffix.clone());
    if let Some(csv) = suffix {
        transform.suffixes = csv.split(',').map(str::to_string).collect();
    }

    let case_fold_name = config::overlay(case_fold_flag_name(cli), file_config.case_fold.clone());
    transform.case_fold = match case_fold_name.as_deref() {
        Some("lower") => CaseFold::Lower,
        Some("upper") => CaseFold::Upper,
        Some("capitalize") => CaseFold::Capitalize,
        _ => CaseFold::None,
    };

    let encoder_specs = config::overlay_vec(cli.encoders.clone(), file_config.encoders.clone());
    for spec in &encoder_specs {
        match parse_encoder_spec(spec)? {
            EncoderSpec::Single(enc) => transform.default_encoders.push(enc),
            EncoderSpec::Chain(chain) => transform.chains.push(chain),
        }
    }

    Ok(transform)
}

fn case_fold_flag_name(cli: &Cli) -> Option<String> {
    if cli.lower {
        Some("lower".to_string())
    } else if cli.upper {
        Some("upper".to_string())
    } else if cli.capitalize {
        Some("capitalize".to_string())
    } else {
        None
    }
}

fn build_matcher(cli: &Cli, file_config: &FileConfig, mode: FuzzingMode) -> Result<Matcher, FuzzError> {
    let status_spec = config::overlay(cli.match_codes.clone(), file_config.match_codes.clone());
    let status_set = match status_spec {
        Some(spec) => config::parse_status_set(&spec)?,
        None => match mode {
            FuzzingMode::Path | FuzzingMode::Subdomain => StatusSet::default_url_discovery(),
            FuzzingMode::Method | FuzzingMode::Data => StatusSet::default_other(),
        },
    };

    let mut matcher = Matcher::new(status_set);
    if let Some(len) = config::overlay(cli.match_length, file_config.match_length) {
        matcher = matcher.with_length_threshold(len);
    }
    if let Some(time) = config::overlay(cli.match_time, file_config.match_time) {
        matcher = matcher.with_time_threshold(time);
    }
    Ok(matcher)
}

fn load_proxies(cli: &Cli) -> Result<Vec<String>, FuzzError> {
    if let Some(proxy) = &cli.proxy {
        return Ok(vec![proxy.clone()]);
    }
    if let Some(path) = &cli.proxies {
        let text = std::fs::read_to_string(path).map_err(FuzzError::Io)?;
        return Ok(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect());
    }
    Ok(Vec::new())
}

fn default_scanner(mode: FuzzingMode) -> Arc<dyn Scanner> {
    match mode {
        FuzzingMode::Path => Arc::new(scanner::PathScanner),
        FuzzingMode::Subdomain => Arc::new(scanner::SubdomainScanner),
        FuzzingMode::Method => Arc::new(scanner::MethodScanner),
        FuzzingMode::Data => Arc::new(scanner::DataScanner),
    }
}

/// Wires the Fuzzer's observer traits to the CLI's progress bar, per-match
/// output lines, and the in-memory buffer the report writer reads from.
struct CliSink {
    scanner: Arc<dyn Scanner>,
    matched: Mutex<Vec<FuzzResult>>,
    verbose: bool,
    sent: AtomicU64,
    errors: AtomicUsize,
    invalid_hosts: AtomicUsize,
    bar: Option<ProgressBar>,
}

impl ResultSink for CliSink {
    fn on_result(&self, result: FuzzResult, matched: bool) {
        self.sent.fetch_add(1, Ordering::SeqCst);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }

        if matched || self.verbose {
            let line = self.scanner.cli_callback(&result);
            match &self.bar {
                Some(bar) => bar.println(line),
                None => println!("{line}"),
            }
        }
        if matched {
            self.matched.lock().unwrap().push(result);
        }
    }
}

impl ErrorSink for CliSink {
    fn on_request_exception(&self, err: ErrorRecord) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        tracing::warn!(index = err.index, payload = %err.payload, message = %err.message, "request failed");
    }

    fn on_invalid_hostname(&self, err: ErrorRecord) {
        self.invalid_hosts.fetch_add(1, Ordering::SeqCst);
        tracing::warn!(index = err.index, payload = %err.payload, message = %err.message, "hostname resolution failed");
    }
}
