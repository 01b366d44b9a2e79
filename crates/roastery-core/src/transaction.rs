// Scoped transactions
//
// `with_transaction` is the only way workflows touch a unit of work: begin,
// run the body, commit on success, roll back and propagate on failure. The
// unit of work is consumed on every path, so its connection is always
// released.

use futures::future::BoxFuture;
use tracing::{error, warn};

use crate::error::Result;
use crate::traits::{TransactionFactory, UnitOfWork};

/// Run `body` inside a fresh unit of work.
///
/// # Example
///
/// ```ignore
/// let coffee = with_transaction(factory, |tx| {
///     Box::pin(async move { tx.increment_recommendations(1).await })
/// })
/// .await?;
/// ```
pub async fn with_transaction<T, F>(transactions: &dyn TransactionFactory, body: F) -> Result<T>
where
    T: Send,
    F: for<'tx> FnOnce(&'tx mut Box<dyn UnitOfWork>) -> BoxFuture<'tx, Result<T>> + Send,
{
    let mut tx = transactions.begin().await?;
    let result = body(&mut tx).await;

    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "rolling back transaction");
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
