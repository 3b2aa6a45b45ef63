use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

use crate::blacklist::{BlacklistAction, BlacklistStatus};
use crate::dictionary::Dictionary;
use crate::error::FuzzError;
use crate::matcher::Matcher;
use crate::requester::Requester;
use crate::result::{ErrorRecord, FuzzResult};
use crate::scanner::Scanner;
use crate::target::Injector;

/// Receives every observed result, along with the combined
/// `scanner.scan() && matcher.is_match()` verdict.
pub trait ResultSink: Send + Sync {
    fn on_result(&self, result: FuzzResult, matched: bool);
}

/// Receives recoverable failures, split by taxonomy: hostname-resolution
/// failures never stop the run, other request failures may (depending on
/// the caller's own policy — the core only routes them, it does not decide).
pub trait ErrorSink: Send + Sync {
    fn on_request_exception(&self, err: ErrorRecord);
    fn on_invalid_hostname(&self, err: ErrorRecord);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzerState {
    Idle,
    Running,
    Paused,
    Stopping,
    Stopped,
}

struct SharedState {
    dictionary: Mutex<Dictionary>,
    in_flight: AtomicUsize,
    paused: AtomicBool,
    stopped: AtomicBool,
    started: AtomicBool,
    finished: AtomicBool,
    pause_notify: Notify,
}

impl SharedState {
    /// Blocks until the in-flight counter drops to zero: used by the
    /// blacklist wait action and by callers draining the pool before pause.
    async fn wait_until_drained(&self) {
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// The worker-pool driver binding dictionary, injector, requester, scanner,
/// matcher, and blacklist together. Owns the worker pool, the dictionary
/// cursor, and the in-flight counter exclusively; the matcher and scanner
/// are shared read-only across workers.
pub struct Fuzzer {
    shared: Arc<SharedState>,
    injector: Arc<Injector>,
    requester: Arc<dyn Requester>,
    scanner: Arc<dyn Scanner>,
    matcher: Arc<Matcher>,
    blacklist: Option<Arc<BlacklistStatus>>,
    result_sink: Arc<dyn ResultSink>,
    error_sink: Arc<dyn ErrorSink>,
    threads: usize,
    delay: Duration,
}

impl Fuzzer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dictionary: Dictionary,
        injector: Injector,
        requester: Arc<dyn Requester>,
        scanner: Arc<dyn Scanner>,
        matcher: Matcher,
        blacklist: Option<BlacklistStatus>,
        result_sink: Arc<dyn ResultSink>,
        error_sink: Arc<dyn ErrorSink>,
        threads: usize,
        delay: Duration,
    ) -> Self {
        Fuzzer {
            shared: Arc::new(SharedState {
                dictionary: Mutex::new(dictionary),
                in_flight: AtomicUsize::new(0),
                paused: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                started: AtomicBool::new(false),
                finished: AtomicBool::new(false),
                pause_notify: Notify::new(),
            }),
            injector: Arc::new(injector),
            requester,
            scanner,
            matcher: Arc::new(matcher),
            blacklist: blacklist.map(Arc::new),
            result_sink,
            error_sink,
            threads: threads.max(1),
            delay,
        }
    }

    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.pause_notify.notify_waiters();
    }

    pub fn stop(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shared.pause_notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Blocks until all in-flight requests complete.
    pub async fn wait_until_pause(&self) {
        self.shared.wait_until_drained().await;
    }

    /// Idle -> Running -> (Paused <-> Running)* -> Stopping -> Stopped.
    pub fn state(&self) -> FuzzerState {
        if !self.shared.started.load(Ordering::SeqCst) {
            return FuzzerState::Idle;
        }
        if self.shared.finished.load(Ordering::SeqCst) {
            return FuzzerState::Stopped;
        }
        if self.shared.stopped.load(Ordering::SeqCst) {
            return FuzzerState::Stopping;
        }
        if self.shared.paused.load(Ordering::SeqCst) {
            return FuzzerState::Paused;
        }
        FuzzerState::Running
    }

    /// Runs the worker pool to completion (dictionary exhausted) or until
    /// `stop()` is observed. Returns `Err(FuzzError::StopAction { .. })` if
    /// a blacklist stop action fired during the run, mirroring the
    /// cooperative StopActionInterrupt the spec describes.
    pub async fn run(&self) -> Result<(), FuzzError> {
        info!(threads = self.threads, "starting fuzzer");
        self.shared.started.store(true, Ordering::SeqCst);
        let mut handles = Vec::with_capacity(self.threads);
        let stop_status: Arc<Mutex<Option<u16>>> = Arc::new(Mutex::new(None));

        for worker_id in 0..self.threads {
            let shared = self.shared.clone();
            let injector = self.injector.clone();
            let requester = self.requester.clone();
            let scanner = self.scanner.clone();
            let matcher = self.matcher.clone();
            let blacklist = self.blacklist.clone();
            let result_sink = self.result_sink.clone();
            let error_sink = self.error_sink.clone();
            let delay = self.delay;
            let stop_status = stop_status.clone();

            handles.push(tokio::spawn(async move {
                worker_loop(
                    worker_id,
                    shared,
                    injector,
                    requester,
                    scanner,
                    matcher,
                    blacklist,
                    result_sink,
                    error_sink,
                    delay,
                    stop_status,
                )
                .await;
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        info!("fuzzer finished");
        self.shared.finished.store(true, Ordering::SeqCst);
        if let Some(status) = *stop_status.lock().await {
            return Err(FuzzError::StopAction { status });
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_id: usize,
    shared: Arc<SharedState>,
    injector: Arc<Injector>,
    requester: Arc<dyn Requester>,
    scanner: Arc<dyn Scanner>,
    matcher: Arc<Matcher>,
    blacklist: Option<Arc<BlacklistStatus>>,
    result_sink: Arc<dyn ResultSink>,
    error_sink: Arc<dyn ErrorSink>,
    delay: Duration,
    stop_status: Arc<Mutex<Option<u16>>>,
) {
    loop {
        if shared.stopped.load(Ordering::SeqCst) {
            debug!(worker_id, "stop observed, exiting");
            return;
        }

        if shared.paused.load(Ordering::SeqCst) {
            shared.pause_notify.notified().await;
            continue;
        }

        let reserved = {
            let mut dict = shared.dictionary.lock().await;
            dict.next()
        };
        let (index, payload) = match reserved {
            Some(pair) => pair,
            None => {
                debug!(worker_id, "dictionary exhausted, exiting");
                return;
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        let outcome = requester.request(&injector, &payload).await;
        shared.in_flight.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            Ok(outcome) => {
                let concrete = injector.inject(&payload);
                let mut result = FuzzResult::new(
                    index,
                    concrete.url,
                    concrete.method,
                    outcome.status,
                    &outcome.body,
                    outcome.rtt,
                    payload.clone(),
                );
                result = result.with_custom(outcome.custom);
                scanner.inspect_result(&mut result);

                if let Some(bl) = &blacklist {
                    if bl.is_blacklisted(result.status) {
                        match bl.action() {
                            BlacklistAction::Stop => {
                                warn!(status = result.status, "blacklist stop action triggered");
                                shared.stopped.store(true, Ordering::SeqCst);
                                shared.pause_notify.notify_waiters();
                                *stop_status.lock().await = Some(result.status);
                            }
                            BlacklistAction::Wait { seconds } => {
                                if !shared.paused.swap(true, Ordering::SeqCst) {
                                    warn!(status = result.status, seconds, "blacklist wait action triggered");
                                    shared.wait_until_drained().await;
                                    tokio::time::sleep(Duration::from_secs(seconds)).await;
                                    shared.paused.store(false, Ordering::SeqCst);
                                    shared.pause_notify.notify_waiters();
                                }
                            }
                        }
                    }
                }

                let matched = scanner.scan(&result) && matcher.is_match(&result);
                result_sink.on_result(result, matched);
            }
            Err(FuzzError::InvalidHostname { host }) => {
                error_sink.on_invalid_hostname(ErrorRecord::new(
                    index,
                    payload,
                    format!("could not resolve hostname: {host}"),
                ));
            }
            Err(e) => {
                error_sink.on_request_exception(ErrorRecord::new(index, payload, e.to_string()));
            }
        }
    }
}
