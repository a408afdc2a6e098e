//! Precondition checks: public DNS resolution and local port availability

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use std::net::TcpListener;
use std::time::Duration;

/// Side-effect free checks re-run before every transition that depends on them
pub trait PreconditionChecker {
    /// Whether `domain` resolves on public DNS, independent of local resolver setup
    fn domain_resolvable(&self, domain: &str) -> bool;

    /// Whether the TCP port can be bound locally; "in use" and "permission
    /// denied" both count as unavailable
    fn port_available(&self, port: u16) -> bool;
}

/// Real network probe using Quad9 as a fixed external resolver
pub struct NetworkProbe {
    timeout: Duration,
}

impl Default for NetworkProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
        }
    }
}

impl NetworkProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn lookup(&self, domain: &str) -> bool {
        let mut opts = ResolverOpts::default();
        opts.timeout = self.timeout;
        opts.attempts = 1;
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::quad9(), opts);

        // Absolute name so no search domain is appended
        let fqdn = format!("{}.", domain.trim_end_matches('.'));
        match resolver.lookup_ip(fqdn.as_str()).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                tracing::info!(domain, error = %e, "domain not resolvable on public DNS");
                false
            }
        }
    }
}

impl PreconditionChecker for NetworkProbe {
    fn domain_resolvable(&self, domain: &str) -> bool {
        let domain = domain.trim();
        if domain.is_empty() {
            return false;
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(error = %e, "failed to create resolver runtime");
                return false;
            }
        };

        let resolvable = runtime.block_on(async {
            tokio::time::timeout(self.timeout * 2, self.lookup(domain))
                .await
                .unwrap_or(false)
        });
        tracing::debug!(domain, resolvable, "public DNS check");
        resolvable
    }

    fn port_available(&self, port: u16) -> bool {
        let available = TcpListener::bind(("127.0.0.1", port)).is_ok();
        tracing::debug!(port, available, "port availability check");
        available
    }
}
