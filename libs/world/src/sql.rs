//! Runner owning the per-node database.
//!
//! The database is recreated on start so every scenario begins empty, and
//! dropped again when the runner is signalled.

use async_trait::async_trait;
use dusts_runner::{Ready, RunError, Runner, Signals};
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

use crate::error::WorldError;

#[derive(Debug, Clone)]
pub struct SqlRunner {
    admin_url: String,
    database: String,
}

impl SqlRunner {
    /// From a full connection string such as `postgres://user:pw@host/diego_1`.
    /// The administrative connection uses the same URL without the database.
    pub fn new(connection: &str) -> Result<Self, WorldError> {
        let (base, database) = split_database(connection)?;
        Ok(Self {
            admin_url: base.to_string(),
            database: database.to_string(),
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn boxed(self) -> Box<dyn Runner> {
        Box::new(self)
    }

    async fn execute(&self, conn: &mut PgConnection, statement: &str) -> Result<(), RunError> {
        sqlx::query(statement)
            .execute(conn)
            .await
            .map_err(|e| RunError::failed(format!("sql: {statement}: {e}")))?;
        Ok(())
    }
}

/// Split `.../name` into the base ending in `/` and a database name made of
/// lowercase letters, digits and underscores.
pub fn split_database(connection: &str) -> Result<(&str, &str), WorldError> {
    let slash = connection
        .rfind('/')
        .ok_or_else(|| WorldError::InvalidAddress(connection.to_string()))?;
    let (base, database) = (&connection[..=slash], &connection[slash + 1..]);

    let valid = !database.is_empty()
        && database
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        return Err(WorldError::InvalidAddress(connection.to_string()));
    }

    Ok((base, database))
}

#[async_trait]
impl Runner for SqlRunner {
    fn name(&self) -> &str {
        "sql"
    }

    async fn run(self: Box<Self>, mut signals: Signals, ready: Ready) -> Result<(), RunError> {
        let mut conn = PgConnection::connect(&self.admin_url)
            .await
            .map_err(|e| RunError::failed(format!("sql: connect: {e}")))?;

        let drop_statement = format!("DROP DATABASE IF EXISTS \"{}\"", self.database);
        self.execute(&mut conn, &drop_statement).await?;
        self.execute(&mut conn, &format!("CREATE DATABASE \"{}\"", self.database))
            .await?;
        info!(database = %self.database, "database created");

        ready.signal();
        let signal = signals.recv().await;

        info!(database = %self.database, %signal, "dropping database");
        let result = self.execute(&mut conn, &drop_statement).await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "failed to close sql connection");
        }
        result
    }
}
