//! Rate limiting for the authentication endpoints.

use actix_governor::governor::clock::QuantaInstant;
use actix_governor::governor::middleware::NoOpMiddleware;
use actix_governor::{GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};
use std::time::Duration;

pub type AuthRateLimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>>;

/// Burst of 5 requests per peer IP, one more every 6 seconds.
///
/// Usage:
/// ```ignore
/// let config = create_auth_rate_limiter_config();
/// web::scope("/auth").wrap(Governor::new(&config))
/// ```
pub fn create_auth_rate_limiter_config() -> Option<AuthRateLimiterConfig> {
    GovernorConfigBuilder::default()
        .period(Duration::from_secs(6))
        .burst_size(5)
        .finish()
}
