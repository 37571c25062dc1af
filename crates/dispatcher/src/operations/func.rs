//! FnOperation - adapts an async closure into an Operation

use std::future::Future;

use contracts::{Operation, OperationError, WorkItem};

/// Operation backed by an async closure
pub struct FnOperation<F> {
    name: String,
    f: F,
}

/// Wrap `f` as an operation named `name`
///
/// # Example
///
/// ```
/// use contracts::{OperationError, WorkItem};
/// use dispatcher::from_fn;
///
/// let op = from_fn("len", |item: WorkItem| async move {
///     Ok::<_, OperationError>(item.as_str().len())
/// });
/// ```
pub fn from_fn<F, Fut, T>(name: impl Into<String>, f: F) -> FnOperation<F>
where
    F: Fn(WorkItem) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, OperationError>> + Send,
{
    FnOperation {
        name: name.into(),
        f,
    }
}

impl<F, Fut, T> Operation for FnOperation<F>
where
    F: Fn(WorkItem) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, OperationError>> + Send,
    T: Send,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, _item: &WorkItem) -> Result<(), String> {
        Ok(())
    }

    async fn execute(&self, item: &WorkItem) -> Result<T, OperationError> {
        (self.f)(item.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dispatcher;
    use std::time::Duration;

    #[tokio::test]
    async fn test_closure_operation_dispatch() {
        let op = from_fn("parse", |item: WorkItem| async move {
            item.as_str()
                .parse::<u32>()
                .map_err(|e| OperationError::payload(e.to_string()))
        });

        let results = Dispatcher::new(op)
            .dispatch(
                vec![WorkItem::from("1"), WorkItem::from("two"), WorkItem::from("3")],
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        let mut values: Vec<u32> = results.successes().map(|(_, v)| *v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 3]);
        assert_eq!(results.failure_count(), 1);
    }
}
