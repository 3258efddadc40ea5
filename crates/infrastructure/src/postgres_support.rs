use std::collections::BTreeSet;

use corbel_core::{AppError, AppResult};
use corbel_domain::Permission;
use sqlx::{PgPool, Postgres, Transaction};

/// Maps a sqlx failure onto the application error taxonomy.
///
/// Connectivity problems become `Unavailable` so permission checks fail
/// closed instead of surfacing as internal errors.
pub(crate) fn map_sqlx_error(error: sqlx::Error, context: &str) -> AppError {
    match &error {
        sqlx::Error::Database(database_error) => match database_error.code().as_deref() {
            Some("23505") => AppError::Conflict(format!("{context}: duplicate entry")),
            Some("23503") => {
                AppError::NotFound(format!("{context}: referenced row does not exist"))
            }
            _ => AppError::Internal(format!("{context}: {error}")),
        },
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => AppError::Unavailable(format!("{context}: {error}")),
        _ => AppError::Internal(format!("{context}: {error}")),
    }
}

pub(crate) async fn begin(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    pool.begin()
        .await
        .map_err(|error| map_sqlx_error(error, "failed to begin transaction"))
}

pub(crate) async fn commit(transaction: Transaction<'static, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| map_sqlx_error(error, "failed to commit transaction"))
}

pub(crate) fn encode_permissions(permissions: &BTreeSet<Permission>) -> Vec<i16> {
    permissions.iter().map(Permission::id).collect()
}

pub(crate) fn decode_permissions(ids: &[i16]) -> AppResult<BTreeSet<Permission>> {
    Permission::parse_ids(ids).map_err(|error| {
        AppError::Internal(format!("stored permission set is invalid: {error}"))
    })
}
