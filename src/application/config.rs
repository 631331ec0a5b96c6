use crate::domain::money::Currency;
use std::time::Duration;

/// Tunables for the transfer engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferConfig {
    /// Redirect responses tolerated before giving up.
    pub max_redirects: u32,
    /// Wall-clock budget for the whole send loop.
    pub redirect_timeout: Duration,
    /// Pause between a redirect response and the next send.
    pub poll_interval: Duration,
    /// Currency for baskets created without an explicit one.
    pub default_currency: Currency,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            redirect_timeout: Duration::from_secs(30),
            poll_interval: Duration::ZERO,
            default_currency: Currency::default(),
        }
    }
}

impl TransferConfig {
    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_redirect_timeout(mut self, timeout: Duration) -> Self {
        self.redirect_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_default_currency(mut self, currency: Currency) -> Self {
        self.default_currency = currency;
        self
    }
}
