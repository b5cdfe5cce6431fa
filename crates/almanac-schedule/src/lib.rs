pub mod error;
pub mod expand;
pub mod model;
pub mod query;
pub mod store;

pub use error::{ScheduleError, ScheduleResult};
pub use model::{
    Occurrence, OccurrenceMap, Privilege, RRuleType, RecurrenceKind, RecurrenceRule, Schedule,
    ScheduleDocument, ScheduleType,
};
pub use query::{
    PropertyStatus, QueryDescriptor, QueryScheduleProxy, RepeatStatus, SuggestDatetime,
};
pub use store::{InMemoryScheduleStore, ScheduleStore};
