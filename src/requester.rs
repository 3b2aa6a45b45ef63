use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use tracing::{debug, warn};

use crate::error::FuzzError;
use crate::result::CustomValue;
use crate::target::{ConcreteRequest, Injector};

/// What a successful request produced: the response split into status and
/// body (so the caller owns both without re-reading the response), the
/// measured round-trip time, and any custom fields the requester variant
/// attaches (e.g. the resolved IP).
pub struct RequestOutcome {
    pub status: u16,
    pub body: String,
    pub rtt: Duration,
    pub custom: HashMap<String, CustomValue>,
}

/// Executes a concrete request and measures round-trip time. The base
/// Requester applies configured timeout, proxy rotation, redirect policy,
/// and cookie; SubdomainRequester layers hostname resolution on top.
#[async_trait]
pub trait Requester: Send + Sync {
    async fn request(&self, injector: &Injector, payload: &str) -> Result<RequestOutcome, FuzzError>;

    /// Sends a single baseline request to verify reachability.
    async fn test_connection(&self, injector: &Injector) -> Result<RequestOutcome, FuzzError> {
        self.request(injector, "").await
    }
}

/// Round-robin proxy pool, mutex-protected via an atomic cursor (no
/// contention beyond the fetch-add itself).
struct ProxyRotator {
    clients: Vec<Client>,
    cursor: AtomicUsize,
}

impl ProxyRotator {
    fn next(&self) -> &Client {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[idx]
    }
}

pub struct BaseRequester {
    rotator: ProxyRotator,
    cookie: Option<String>,
}

impl BaseRequester {
    pub fn build(
        timeout: Duration,
        proxies: &[String],
        follow_redirects: bool,
        cookie: Option<String>,
    ) -> Result<Self, FuzzError> {
        let redirect_policy = if follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let proxy_list: Vec<Option<String>> = if proxies.is_empty() {
            vec![None]
        } else {
            proxies.iter().cloned().map(Some).collect()
        };

        let mut clients = Vec::with_capacity(proxy_list.len());
        for proxy in proxy_list {
            let mut builder = Client::builder()
                .timeout(timeout)
                .redirect(redirect_policy.clone());
            if let Some(p) = proxy {
                builder = builder.proxy(Proxy::all(&p).map_err(|e| {
                    FuzzError::Config(format!("invalid proxy '{p}': {e}"))
                })?);
            }
            clients.push(builder.build().map_err(FuzzError::Request)?);
        }

        Ok(BaseRequester {
            rotator: ProxyRotator { clients, cursor: AtomicUsize::new(0) },
            cookie,
        })
    }

    fn build_request(&self, client: &Client, req: &ConcreteRequest) -> reqwest::RequestBuilder {
        let method = reqwest::Method::from_bytes(req.method.as_bytes())
            .unwrap_or(reqwest::Method::GET);
        let mut builder = client.request(method, &req.url);
        for (k, v) in &req.headers {
            builder = builder.header(k, v);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header("Cookie", cookie);
        }
        if let Some(body) = &req.body {
            builder = builder.body(body.clone());
        }
        builder
    }
}

#[async_trait]
impl Requester for BaseRequester {
    async fn request(&self, injector: &Injector, payload: &str) -> Result<RequestOutcome, FuzzError> {
        let concrete = injector.inject(payload);
        let client = self.rotator.next();
        let builder = self.build_request(client, &concrete);

        let start = Instant::now();
        let response = builder.send().await.map_err(FuzzError::Request)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(FuzzError::Request)?;
        let rtt = start.elapsed();

        Ok(RequestOutcome { status, body, rtt, custom: HashMap::new() })
    }
}

/// Resolves a hostname to an IP address. Split out as a trait so the DNS
/// lookup can be replaced with a mock in tests.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<String, FuzzError>;
}

pub struct TokioResolver;

#[async_trait]
impl HostResolver for TokioResolver {
    async fn resolve(&self, host: &str) -> Result<String, FuzzError> {
        let lookup_target = format!("{host}:0");
        let mut addrs = tokio::net::lookup_host(&lookup_target)
            .await
            .map_err(|_| FuzzError::InvalidHostname { host: host.to_string() })?;
        addrs
            .next()
            .map(|addr| addr.ip().to_string())
            .ok_or_else(|| FuzzError::InvalidHostname { host: host.to_string() })
    }
}

/// Specializes `request` by first resolving the injected host to an IP,
/// then delegating to the inner BaseRequester. Resolution failure maps to
/// `InvalidHostname`, which the Fuzzer routes to the invalid-hostname
/// callback without stopping the run.
pub struct SubdomainRequester {
    inner: BaseRequester,
    resolver: Box<dyn HostResolver>,
}

impl SubdomainRequester {
    pub fn new(inner: BaseRequester, resolver: Box<dyn HostResolver>) -> Self {
        SubdomainRequester { inner, resolver }
    }
}

#[async_trait]
impl Requester for SubdomainRequester {
    async fn request(&self, injector: &Injector, payload: &str) -> Result<RequestOutcome, FuzzError> {
        let concrete = injector.inject(payload);
        let url = url::Url::parse(&concrete.url).map_err(FuzzError::UrlParse)?;
        let host = url.host_str().unwrap_or_default().to_string();

        debug!(host = %host, "resolving injected host");
        let ip = match self.resolver.resolve(&host).await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(host = %host, "hostname resolution failed");
                return Err(e);
            }
        };

        let mut outcome = self.inner.request(injector, payload).await?;
        outcome.custom.insert("ip".to_string(), CustomValue::Text(ip));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;
    use httptest::{matchers::*, responders, Expectation, Server};

    struct MockResolver {
        answers: HashMap<String, Result<String, ()>>,
    }

    #[async_trait]
    impl HostResolver for MockResolver {
        async fn resolve(&self, host: &str) -> Result<String, FuzzError> {
            match self.answers.get(host) {
                Some(Ok(ip)) => Ok(ip.clone()),
                _ => Err(FuzzError::InvalidHostname { host: host.to_string() }),
            }
        }
    }

    #[tokio::test]
    async fn base_requester_measures_rtt_and_reads_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/admin"))
                .respond_with(responders::status_code(200).body("hi")),
        );

        let requester = BaseRequester::build(Duration::from_secs(1), &[], false, None).unwrap();
        let target = Target::new(format!("{}$", server.url("/")));
        let injector = Injector::new(target);

        let outcome = requester.request(&injector, "admin").await.unwrap();
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.body, "hi");
    }

    #[tokio::test]
    async fn subdomain_requester_attaches_resolved_ip() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method("GET")).respond_with(responders::status_code(200)),
        );
        let addr = server.addr();

        let mut answers = HashMap::new();
        answers.insert(addr.ip().to_string(), Ok("9.9.9.9".to_string()));
        let resolver = Box::new(MockResolver { answers });

        let inner = BaseRequester::build(Duration::from_secs(1), &[], false, None).unwrap();
        let subdomain_requester = SubdomainRequester::new(inner, resolver);

        // The marker stands in for the whole host; resolution is mocked to
        // a distinct IP so we can assert the custom field independently of
        // what address the HTTP call actually connects to.
        let target = Target::new(format!("http://$:{}/", addr.port()));
        let injector = Injector::new(target);

        let outcome = subdomain_requester.request(&injector, &addr.ip().to_string()).await.unwrap();
        assert_eq!(outcome.status, 200);
        assert_eq!(
            outcome.custom.get("ip"),
            Some(&CustomValue::Text("9.9.9.9".to_string()))
        );
    }

    #[tokio::test]
    async fn subdomain_requester_surfaces_invalid_hostname() {
        let inner = BaseRequester::build(Duration::from_secs(1), &[], false, None).unwrap();
        let resolver = Box::new(MockResolver { answers: HashMap::new() });
        let subdomain_requester = SubdomainRequester::new(inner, resolver);

        let target = Target::new("http://$.bad.com/");
        let injector = Injector::new(target);

        let err = subdomain_requester.request(&injector, "bad").await.unwrap_err();
        assert!(matches!(err, FuzzError::InvalidHostname { .. }));
    }
}
