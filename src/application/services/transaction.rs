//! Commit-or-rollback helper for catalog transactions.

use crate::domain::repositories::CatalogTransaction;
use crate::error::AppError;

/// Commits `tx` if `result` is `Ok`, rolls it back otherwise.
///
/// A failed rollback is logged; the original error is returned.
pub(crate) async fn finish<T>(
    mut tx: Box<dyn CatalogTransaction>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback().await {
                tracing::error!(error = %rollback_error, "Failed to roll back catalog transaction");
            }
            Err(e)
        }
    }
}
