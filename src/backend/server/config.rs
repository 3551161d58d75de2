/**
 * Server Configuration
 *
 * Configuration comes from environment variables, with development
 * defaults where that is safe. Services that fail to initialize are set
 * to `None` and the server continues without them; the messaging core
 * stays functional with its in-memory store.
 */
use sqlx::PgPool;

/// Database configuration result
///
/// `None` when the database is not configured or unreachable.
pub type DatabaseConfig = Option<PgPool>;

/// Load and initialize the database connection pool
///
/// 1. Reads `DATABASE_URL` from the environment
/// 2. Creates a Postgres connection pool
/// 3. Runs migrations
///
/// Errors are logged but do not prevent startup; the function returns
/// `None` on any failure and the server runs with the in-memory store
/// only.
pub async fn load_database() -> DatabaseConfig {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; messages will not survive a restart");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Continuing with in-memory message store only");
            return None;
        }
    };

    tracing::info!("Database connection pool created");

    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed"),
        Err(e) => {
            // Migrations may already have been applied by another instance.
            tracing::warn!("Migration run failed, continuing: {:?}", e);
        }
    }

    Some(pool)
}

/// Listen port, `SERVER_PORT` with a development default
pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001)
}
