/// PostgreSQL-backed store.
///
/// Uses a single `aqmon.kv_state` table, created on connect if missing.
/// The connection string comes from `DATABASE_URL` (loaded from `.env`
/// when present).

use chrono::Utc;
use postgres::{Client, NoTls};
use std::env;

use super::KeyValueStore;
use crate::model::AqError;

const SCHEMA_SQL: &str = "
    CREATE SCHEMA IF NOT EXISTS aqmon;
    CREATE TABLE IF NOT EXISTS aqmon.kv_state (
        key        TEXT PRIMARY KEY,
        value      TEXT NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    );
";

pub struct PostgresStore {
    client: Client,
}

fn store_error(context: &str, err: postgres::Error) -> AqError {
    AqError::Store(format!("{}: {}", context, err))
}

impl PostgresStore {
    /// Connects and makes sure the state table exists.
    pub fn connect(database_url: &str) -> Result<Self, AqError> {
        let mut client =
            Client::connect(database_url, NoTls).map_err(|e| store_error("connect", e))?;
        client
            .batch_execute(SCHEMA_SQL)
            .map_err(|e| store_error("create schema", e))?;
        Ok(PostgresStore { client })
    }

    /// Connects using `DATABASE_URL` from the environment or `.env`.
    pub fn from_env() -> Result<Self, AqError> {
        dotenv::dotenv().ok();
        let url = env::var("DATABASE_URL")
            .map_err(|_| AqError::Store("DATABASE_URL must be set".to_string()))?;
        Self::connect(&url)
    }
}

impl KeyValueStore for PostgresStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, AqError> {
        let row = self
            .client
            .query_opt("SELECT value FROM aqmon.kv_state WHERE key = $1", &[&key])
            .map_err(|e| store_error("select", e))?;
        Ok(row.map(|r| r.get(0)))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), AqError> {
        self.client
            .execute(
                "INSERT INTO aqmon.kv_state (key, value, updated_at)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (key) DO UPDATE
                 SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at",
                &[&key, &value, &Utc::now()],
            )
            .map_err(|e| store_error("upsert", e))?;
        Ok(())
    }
}
