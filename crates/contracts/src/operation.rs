//! Operation trait - the unit of work a dispatcher fans out
//!
//! Defines the abstract "perform one work item" capability. The dispatcher is
//! polymorphic over it and never assumes a specific transport.

use crate::{OperationError, WorkItem};

/// Work execution trait
///
/// All operation implementations must implement this trait.
#[trait_variant::make(Operation: Send)]
pub trait LocalOperation {
    /// Value produced by a successful execution
    type Output;

    /// Operation name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Check an item before execution
    ///
    /// Blank descriptors are rejected by the worker before this is called.
    /// An `Err` becomes an `InvalidWorkItem` failure for that item only.
    fn validate(&self, item: &WorkItem) -> Result<(), String>;

    /// Execute one work item
    ///
    /// Resources opened here must be released before returning. The future may
    /// be dropped at any await point when the dispatch deadline fires.
    ///
    /// # Errors
    /// Returns the operation error (becomes a failure outcome)
    async fn execute(&self, item: &WorkItem) -> Result<Self::Output, OperationError>;
}

#[cfg(test)]
mod tests {
    use super::Operation;
    use crate::{OperationError, WorkItem};

    struct Echo;

    impl Operation for Echo {
        type Output = usize;

        fn name(&self) -> &str {
            "echo"
        }

        fn validate(&self, item: &WorkItem) -> Result<(), String> {
            if item.as_str().starts_with('!') {
                return Err("leading '!'".to_string());
            }
            Ok(())
        }

        async fn execute(&self, item: &WorkItem) -> Result<usize, OperationError> {
            Ok(item.as_str().len())
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_operation_future_is_send() {
        let op = Echo;
        let item = WorkItem::from("abc");
        let fut = op.execute(&item);
        assert_send(&fut);
        assert_eq!(fut.await, Ok(3));
        assert!(op.validate(&WorkItem::from("!x")).is_err());
        assert_eq!(op.name(), "echo");
    }
}
