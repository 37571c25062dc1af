//! # Dispatcher
//!
//! Bounded-time fan-out module.
//!
//! Responsibilities:
//! - Spawn one worker per `WorkItem`
//! - Collect outcomes until all arrive or the deadline fires
//! - Cancel or abandon stragglers without leaking workers

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod mock;
pub mod operations;
mod worker;

pub use contracts::{Operation, Outcome, OutcomeStatus, ResultSet, WorkItem};
pub use dispatcher::{create_dispatcher, dispatch, Dispatcher, DispatcherBuilder};
pub use error::DispatchError;
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
pub use mock::{MockBehavior, MockOperation, MockStats};
pub use operations::{from_fn, FnOperation, HttpOperation, HttpResponse};
