//! Rate-limit accounting: time/sleep abstraction, cost history, and the
//! proactive cost limiter that gates outgoing GraphQL calls.

mod deferrer;
mod limiter;
mod store;

pub use deferrer::{Deferrer, SleepDeferrer, SleepFuture};
pub use limiter::{CostLimiter, COST_WINDOW_MS};
pub use store::{CostSample, CostStore};
