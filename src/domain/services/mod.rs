// Pure analysis services: no I/O, no clock, no shared state.

pub mod aggregator;
pub mod business_day;
pub mod change;
pub mod duration;

pub use aggregator::aggregate;
pub use business_day::{align_to_dates, match_rate};
pub use change::{qoq_change, rate_change};
pub use duration::duration;
