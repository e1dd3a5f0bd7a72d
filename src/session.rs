use log::{info, LevelFilter};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, Executor};

use crate::config::{Credentials, Driver};
use crate::Result;

/// A single connection that runs raw SQL text.
///
/// Transactions are driven with plain `BEGIN`/`COMMIT`/`ROLLBACK` statements so
/// one session can alternate between per-statement and whole-load transactions.
#[allow(async_fn_in_trait)]
pub trait SqlSession {
    /// Runs `sql` and returns the number of affected rows.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    async fn begin(&mut self) -> Result<()> {
        self.execute("BEGIN").await.map(drop)
    }

    async fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT").await.map(drop)
    }

    async fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK").await.map(drop)
    }
}

impl SqlSession for PgConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let done = Executor::execute(&mut *self, sql).await?;
        Ok(done.rows_affected())
    }
}

impl SqlSession for MySqlConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let done = Executor::execute(&mut *self, sql).await?;
        Ok(done.rows_affected())
    }
}

/// Connection to whichever backend the credentials name.
pub enum DbConnection {
    Postgres(PgConnection),
    MySql(MySqlConnection),
}

impl DbConnection {
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let conn = match credentials.driver {
            Driver::Postgres => {
                let mut options = PgConnectOptions::new()
                    .host(&credentials.host)
                    .port(credentials.port)
                    .username(&credentials.user)
                    .database(&credentials.dbname);
                if let Some(password) = &credentials.password {
                    options = options.password(password);
                }
                // batch statements are far too large for the default info-level statement log
                let options = options.log_statements(LevelFilter::Trace);
                DbConnection::Postgres(PgConnection::connect_with(&options).await?)
            }
            Driver::Mysql => {
                let mut options = MySqlConnectOptions::new()
                    .host(&credentials.host)
                    .port(credentials.port)
                    .username(&credentials.user)
                    .database(&credentials.dbname);
                if let Some(password) = &credentials.password {
                    options = options.password(password);
                }
                let options = options.log_statements(LevelFilter::Trace);
                DbConnection::MySql(MySqlConnection::connect_with(&options).await?)
            }
        };
        info!(
            "Connected to {:?} database {} as {}",
            credentials.driver, credentials.dbname, credentials.user
        );
        Ok(conn)
    }

    pub async fn close(self) -> Result<()> {
        match self {
            DbConnection::Postgres(conn) => conn.close().await?,
            DbConnection::MySql(conn) => conn.close().await?,
        }
        Ok(())
    }
}

impl SqlSession for DbConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        match self {
            DbConnection::Postgres(conn) => SqlSession::execute(conn, sql).await,
            DbConnection::MySql(conn) => SqlSession::execute(conn, sql).await,
        }
    }
}
