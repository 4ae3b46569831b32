//! Write transactions that take SQLite's write lock up front.
//!
//! A deferred transaction that reads before it writes cannot upgrade its
//! snapshot once another connection has committed under WAL. SQLite then
//! fails the upgrade with `SQLITE_BUSY_SNAPSHOT` without consulting the busy
//! timeout. `BEGIN IMMEDIATE` takes the write lock before the first read, so
//! concurrent writers queue on the busy timeout instead.

use std::ops::{Deref, DerefMut};

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::error::{DatabaseError, Result};

/// A `BEGIN IMMEDIATE` transaction on a pooled connection.
///
/// Dereferences to the connection, so it can be passed wherever a
/// `&mut SqliteConnection` or an executor (`&mut *tx`) is expected.
/// A transaction dropped without [`commit`](Self::commit) or
/// [`rollback`](Self::rollback) closes its connection, which rolls it back.
pub struct WriteTx {
    conn: PoolConnection<Sqlite>,
    open: bool,
}

impl WriteTx {
    pub async fn begin(pool: &SqlitePool) -> Result<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(Self { conn, open: true })
    }

    pub async fn commit(mut self) -> Result<()> {
        sqlx::query("COMMIT").execute(&mut *self.conn).await?;
        self.open = false;
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<()> {
        sqlx::query("ROLLBACK").execute(&mut *self.conn).await?;
        self.open = false;
        Ok(())
    }

    /// Commit when `outcome` is `Ok`, roll back and pass the error through otherwise.
    pub async fn finish<T, E>(self, outcome: std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<DatabaseError>,
    {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.rollback().await {
                    warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }
}

impl Deref for WriteTx {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &*self.conn
    }
}

impl DerefMut for WriteTx {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut *self.conn
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if self.open {
            self.conn.close_on_drop();
        }
    }
}
