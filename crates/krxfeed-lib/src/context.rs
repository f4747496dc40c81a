//! Shared scraping context.

use std::sync::{Arc, OnceLock};

use krxfeed_calendar::{BusinessDayResolver, ResolverConfig};
use krxfeed_fetch::{ClientConfig, RequestClient, Transport, TransportError};
use krxfeed_registry::TickerRegistry;
use tracing::debug;

/// Process-wide context instance.
static GLOBAL: OnceLock<Krx> = OnceLock::new();

/// The request client, ticker registry and business day resolver of one session.
///
/// The registry and resolver issue their requests through the context's
/// client. Build one per process, or use [`Krx::global`].
#[derive(Debug)]
pub struct Krx {
    client: Arc<RequestClient>,
    registry: TickerRegistry,
    resolver: BusinessDayResolver,
}

impl Krx {
    /// Creates a context over a real HTTP session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig, resolver: ResolverConfig) -> Result<Self, TransportError> {
        Ok(Self::with_client(Arc::new(RequestClient::new(config)?), resolver))
    }

    /// Creates a context with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, TransportError> {
        Self::new(ClientConfig::default(), ResolverConfig::default())
    }

    /// Creates a context over the given transport.
    #[must_use]
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
        resolver: ResolverConfig,
    ) -> Self {
        Self::with_client(
            Arc::new(RequestClient::with_transport(transport, config)),
            resolver,
        )
    }

    /// Creates a context sharing an existing client.
    #[must_use]
    pub fn with_client(client: Arc<RequestClient>, resolver: ResolverConfig) -> Self {
        Self {
            registry: TickerRegistry::new(Arc::clone(&client)),
            resolver: BusinessDayResolver::with_config(Arc::clone(&client), resolver),
            client,
        }
    }

    /// Returns the process-wide context, creating it with defaults on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn global() -> Result<&'static Self, TransportError> {
        if let Some(krx) = GLOBAL.get() {
            return Ok(krx);
        }
        let krx = Self::with_defaults()?;
        debug!("created process-wide context");
        Ok(GLOBAL.get_or_init(|| krx))
    }

    /// Returns the request client.
    #[must_use]
    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    /// Returns the ticker registry.
    #[must_use]
    pub const fn registry(&self) -> &TickerRegistry {
        &self.registry
    }

    /// Returns the business day resolver.
    #[must_use]
    pub const fn resolver(&self) -> &BusinessDayResolver {
        &self.resolver
    }
}
