pub mod entry_flow;

pub use entry_flow::{build_feedback, EntryFlow, ProcessOutcome, MAX_ATTEMPTS, RETRY_LIMIT_ANNOTATION};
