//! Answering parsed schedule queries: descriptor types, result filters and
//! the dispatching proxy.

pub mod descriptor;
pub mod filter;
pub mod proxy;
pub mod time_limit;

pub use descriptor::{PropertyStatus, QueryDescriptor, RepeatStatus, SuggestDatetime};
pub use proxy::QueryScheduleProxy;
