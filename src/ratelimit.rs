use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use nonzero_ext::nonzero;
use std::{num::NonZeroU32, time::Duration};

use crate::config::ScrapingConfig;

// Gratka is a single live site, so keep the burst small.
const BURST: NonZeroU32 = nonzero!(1u32);

type SpecificGovernorRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

pub struct RateLimiter {
    req_per_sec: SpecificGovernorRateLimiter,
    // None when the configured gap is zero.
    ms_between_req: Option<SpecificGovernorRateLimiter>,
}

impl RateLimiter {
    pub fn new(req_per_sec: NonZeroU32, ms_between_req: Duration) -> Self {
        // Limit to X total req/sec on average.
        let req_per_sec =
            GovernorRateLimiter::direct(Quota::per_second(req_per_sec).allow_burst(BURST));

        // No two requests closer than Y ms.
        let ms_between_req = Quota::with_period(ms_between_req).map(GovernorRateLimiter::direct);

        RateLimiter {
            req_per_sec,
            ms_between_req,
        }
    }

    pub fn from_config(config: &ScrapingConfig) -> Self {
        Self::new(config.req_per_sec, config.ms_between_req)
    }

    pub async fn wait_until_ready(&self) {
        // Requests per second first, then the gap. The gap limiter only lets
        // one caller through every Y ms, so checking it last keeps callers
        // released by the first limiter from crossing it all at once.
        self.req_per_sec.until_ready().await;
        if let Some(ms_between_req) = &self.ms_between_req {
            ms_between_req.until_ready().await;
        }
    }
}
