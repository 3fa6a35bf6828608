use std::future::Future;
use std::sync::{Arc, RwLock};

use capvault_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::keycap_repository::KeycapRepository;
use crate::snapshot_repository::SnapshotRepository;

/// Central database facade: owns the connection pool, runs migrations,
/// and vends repository instances.
///
/// Opening is an explicit step performed once at startup. After that, any
/// operation that fails with a connection-class error triggers exactly one
/// pool rebuild and one retry; a second failure is reported as
/// [`AppError::StorageUnavailable`].
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    /// `None` for pools handed in from outside; those cannot be rebuilt.
    config: Option<DatabaseConfig>,
    pool: RwLock<PgPool>,
}

impl Database {
    /// Connect to PostgreSQL, verify the connection and run migrations.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let db = Self::connect(config).await?;
        db.migrate().await?;
        tracing::info!("Connected to database");
        Ok(db)
    }

    /// Connect to PostgreSQL and verify the connection with a ping.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = build_pool(config).await?;
        Ok(Self {
            inner: Arc::new(Inner {
                config: Some(config.clone()),
                pool: RwLock::new(pool),
            }),
        })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    ///
    /// Such a handle never reconnects.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: None,
                pool: RwLock::new(pool),
            }),
        }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Check database connectivity, reconnecting once if needed.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.run(|pool| async move { sqlx::query("SELECT 1").execute(&pool).await })
            .await?;
        Ok(())
    }

    /// Close every connection in the pool.
    pub async fn close(&self) {
        self.pool().close().await;
        tracing::info!("Database connection closed");
    }

    /// Get a [`SnapshotRepository`] backed by this database.
    pub fn snapshot_repo(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.clone())
    }

    /// Get a [`KeycapRepository`] backed by this database.
    pub fn keycap_repo(&self) -> KeycapRepository {
        KeycapRepository::new(self.clone())
    }

    /// The current pool. Cheap: pools are reference counted.
    pub fn pool(&self) -> PgPool {
        self.inner
            .pool
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Run `op` against the pool, rebuilding the pool and retrying once if
    /// the connection turns out to be gone.
    pub(crate) async fn run<T, F, Fut>(&self, op: F) -> Result<T, AppError>
    where
        F: Fn(PgPool) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, sqlx::Error>> + Send,
        T: Send,
    {
        match op(self.pool()).await {
            Ok(value) => Ok(value),
            Err(e) if is_connection_error(&e) => {
                tracing::warn!(error = %e, "Database connection lost, attempting to reconnect");
                let pool = self.reconnect().await?;
                op(pool).await.map_err(|e| {
                    if is_connection_error(&e) {
                        AppError::StorageUnavailable(format!("Database unreachable after reconnect: {e}"))
                    } else {
                        AppError::DatabaseError(e.to_string())
                    }
                })
            }
            Err(e) => Err(AppError::DatabaseError(e.to_string())),
        }
    }

    async fn reconnect(&self) -> Result<PgPool, AppError> {
        let Some(config) = &self.inner.config else {
            return Err(AppError::StorageUnavailable(
                "Database connection lost and no configuration to reconnect with".into(),
            ));
        };

        let pool = build_pool(config).await?;
        let previous = {
            let mut guard = self
                .inner
                .pool
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::replace(&mut *guard, pool.clone())
        };
        previous.close().await;

        tracing::info!("Reconnected to database");
        Ok(pool)
    }
}

async fn build_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| AppError::StorageUnavailable(format!("Failed to connect: {e}")))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::StorageUnavailable(format!("Database ping failed: {e}")))?;

    Ok(pool)
}

/// Errors meaning the connection itself is unusable, as opposed to a bad
/// query or constraint violation.
fn is_connection_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}
