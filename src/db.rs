use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::migrator::Migrator;
use metrics::{counter, gauge, histogram};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
    /// Log every statement through sqlx
    pub sqlx_logging: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
            sqlx_logging: false,
        }
    }
}

impl DbConfig {
    /// A single-connection in-memory SQLite database. Every pooled connection
    /// to `sqlite::memory:` would get its own database, so the pool is pinned
    /// to one connection.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout: Duration::from_secs(3600),
            ..Default::default()
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
            sqlx_logging: cfg.log_level.eq_ignore_ascii_case("trace"),
        }
    }
}

/// Establishes a connection pool to the database
///
/// # Errors
/// Returns a `ServiceError` if the connection cannot be established
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool to the database with custom configuration
///
/// SQLite connections are opened with `foreign_keys = ON`, which sqlx
/// applies to every pooled connection.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(config.sqlx_logging);

    gauge!("warehouse_db.max_connections", config.max_connections as f64);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Database connection pool established successfully");

    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Database access wrapper with built-in metrics and error handling
#[derive(Debug, Clone)]
pub struct DatabaseAccess {
    pool: Arc<DbPool>,
}

impl DatabaseAccess {
    /// Create a new database access instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &DbPool {
        &self.pool
    }

    /// Execute one ORM operation with metrics, logging and error classification
    pub async fn execute<'a, F, Fut, T>(&'a self, operation: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&'a DbPool) -> Fut,
        Fut: Future<Output = Result<T, DbErr>> + 'a,
    {
        let db: &'a DbPool = &self.pool;
        let start = std::time::Instant::now();

        debug!(operation = %operation, "Starting database operation");

        let result = f(db).await.map_err(|e| {
            let err = ServiceError::db_error(e);
            if err.is_constraint_violation() {
                debug!(operation = %operation, error = %err, "Constraint rejected operation");
                counter!("warehouse_db.operation.constraint_violation", 1, "operation" => operation.to_string());
            } else {
                error!(operation = %operation, error = %err, "Database operation failed");
                counter!("warehouse_db.operation.error", 1, "operation" => operation.to_string());
            }
            err
        });

        let elapsed = start.elapsed();
        histogram!("warehouse_db.operation.duration", elapsed, "operation" => operation.to_string());

        if result.is_ok() {
            debug!(operation = %operation, duration = ?elapsed, "Database operation completed successfully");
        }

        result
    }
}

/// Runs database migrations
///
/// # Errors
/// Returns a `ServiceError` if migrations fail to execute
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = Migrator::up(pool, None)
        .await
        .map_err(|e| ServiceError::MigrationError(e.to_string()));

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!(
            "Database migrations completed successfully in {:?}",
            elapsed
        ),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Rolls back every applied migration, dropping `spaces` before `warehouse`
pub async fn rollback_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Rolling back database migrations");

    Migrator::reset(pool).await.map_err(|e| {
        error!("Database rollback failed: {}", e);
        ServiceError::MigrationError(e.to_string())
    })
}

/// Drops and recreates both tables, discarding all rows
pub async fn reset_schema(pool: &DbPool) -> Result<(), ServiceError> {
    rollback_migrations(pool).await?;
    run_migrations(pool).await
}

/// Names of migrations that have not been applied yet
pub async fn pending_migrations(pool: &DbPool) -> Result<Vec<String>, ServiceError> {
    let pending = Migrator::get_pending_migrations(pool)
        .await
        .map_err(|e| ServiceError::MigrationError(e.to_string()))?;

    Ok(pending.iter().map(|m| m.name().to_string()).collect())
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    debug!("Checking database connection");
    let start = std::time::Instant::now();

    let result = pool.ping().await.map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            debug!("Database connection check successful in {:?}", elapsed);
            gauge!("warehouse_db.connection_latency", elapsed.as_millis() as f64);
        }
        Err(e) => {
            error!(
                "Database connection check failed after {:?}: {}",
                elapsed, e
            );
            counter!("warehouse_db.connection_failures", 1);
        }
    }

    result
}

/// Closes the database connection pool
pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");

    pool.close().await.map_err(ServiceError::DatabaseError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_apply_and_roll_back() {
        let pool = establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("in-memory sqlite");

        assert_eq!(pending_migrations(&pool).await.unwrap().len(), 2);
        run_migrations(&pool).await.expect("migrate up");
        assert!(pending_migrations(&pool).await.unwrap().is_empty());

        rollback_migrations(&pool).await.expect("migrate down");
        assert_eq!(pending_migrations(&pool).await.unwrap().len(), 2);

        check_connection(&pool).await.expect("ping");
        close_pool(pool).await.expect("close");
    }

    #[tokio::test]
    async fn reset_schema_empties_both_tables() {
        use crate::entities::{space, warehouse};
        use sea_orm::{ActiveModelTrait, EntityTrait, NotSet, Set};

        let pool = establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("in-memory sqlite");
        run_migrations(&pool).await.expect("migrate up");

        let owner = warehouse::ActiveModel {
            warehouse_id: NotSet,
            name: NotSet,
            width: Set(3),
            height: Set(2),
        }
        .insert(&pool)
        .await
        .unwrap();
        space::ActiveModel {
            warehouse_id: Set(owner.warehouse_id),
            x_pos: Set(1),
            y_pos: Set(1),
            kind: Set(Some("shelf".to_string())),
        }
        .insert(&pool)
        .await
        .unwrap();

        reset_schema(&pool).await.expect("reset");

        let warehouses = warehouse::Entity::find().all(&pool).await.expect("warehouse table");
        let spaces = space::Entity::find().all(&pool).await.expect("spaces table");
        assert!(warehouses.is_empty());
        assert!(spaces.is_empty());
        assert!(pending_migrations(&pool).await.unwrap().is_empty());
    }

    #[test]
    fn config_maps_from_app_config() {
        let mut cfg = AppConfig::for_database("sqlite://warehouse.db?mode=rwc");
        cfg.db_max_connections = 4;
        cfg.db_idle_timeout_secs = 42;

        let db_cfg = DbConfig::from(&cfg);
        assert_eq!(db_cfg.url, "sqlite://warehouse.db?mode=rwc");
        assert_eq!(db_cfg.max_connections, 4);
        assert_eq!(db_cfg.idle_timeout, Duration::from_secs(42));
        assert!(!db_cfg.sqlx_logging);
    }
}
