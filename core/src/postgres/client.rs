use std::{env, time::Duration};

use async_trait::async_trait;
use bb8::{Pool, RunError};
use bb8_postgres::PostgresConnectionManager;
use dotenv::dotenv;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use rust_decimal::Decimal;
use tokio::{task, time::timeout};
pub use tokio_postgres::types::{ToSql, Type as PgType};
use tokio_postgres::{config::SslMode, Config, Error as PgError, Row, ToStatement};
use tracing::error;
use uuid::Uuid;

use crate::{
    executor::{AsyncStatementExecutor, ExecutionError},
    value::SqlValue,
};

/// The provider identifier this client reports to the registry.
pub const POSTGRES_PROVIDER_ID: &str = "postgres";

pub fn connection_string() -> Result<String, env::VarError> {
    dotenv().ok();
    let connection = env::var("DATABASE_URL")?;
    Ok(connection)
}

#[derive(thiserror::Error, Debug)]
pub enum PostgresConnectionError {
    #[error("The database connection string is wrong please check your environment: {0}")]
    DatabaseConnectionConfigWrong(#[from] env::VarError),

    #[error("Connection pool error: {0}")]
    ConnectionPoolError(#[from] tokio_postgres::Error),

    #[error("Connection pool runtime error: {0}")]
    ConnectionPoolRuntimeError(#[from] RunError<tokio_postgres::Error>),

    #[error("Can not connect to the database please make sure your connection string is correct")]
    CanNotConnectToDatabase,

    #[error("Could not parse connection string make sure it is correctly formatted")]
    CouldNotParseConnectionString,

    #[error("Could not create tls connector")]
    CouldNotCreateTlsConnector,
}

#[derive(thiserror::Error, Debug)]
pub enum PostgresError {
    #[error("PgError {0}")]
    PgError(#[from] PgError),

    #[error("Connection pool error: {0}")]
    ConnectionPoolError(#[from] RunError<tokio_postgres::Error>),
}

/// Pooled Postgres access implementing the engine's execution seam. The
/// engine builds the statements; this client only binds parameters and runs
/// them.
pub struct PostgresClient {
    pool: Pool<PostgresConnectionManager<MakeTlsConnector>>,
}

impl PostgresClient {
    pub async fn new() -> Result<Self, PostgresConnectionError> {
        async fn _new(disable_ssl: bool) -> Result<PostgresClient, PostgresConnectionError> {
            let connection_str = connection_string()?;
            let mut config: Config = connection_str
                .parse()
                .map_err(|_| PostgresConnectionError::CouldNotParseConnectionString)?;

            if disable_ssl {
                config.ssl_mode(SslMode::Disable);
            }

            let connector = TlsConnector::builder()
                .build()
                .map_err(|_| PostgresConnectionError::CouldNotCreateTlsConnector)?;
            let tls_connector = MakeTlsConnector::new(connector);

            // Perform a direct connection test
            let (client, connection) =
                match timeout(Duration::from_millis(5000), config.connect(tls_connector.clone()))
                    .await
                {
                    Ok(Ok((client, connection))) => (client, connection),
                    Ok(Err(e)) => {
                        // retry without ssl if ssl has been attempted and failed
                        if !disable_ssl &&
                            config.get_ssl_mode() != SslMode::Disable &&
                            !connection_str.contains("sslmode=require")
                        {
                            return Box::pin(_new(true)).await;
                        }
                        error!("Error connecting to database: {}", e);
                        return Err(PostgresConnectionError::CanNotConnectToDatabase);
                    }
                    Err(e) => {
                        error!("Timeout connecting to database: {}", e);
                        return Err(PostgresConnectionError::CanNotConnectToDatabase);
                    }
                };

            // Spawn the connection future to ensure the connection is established
            let connection_handle = task::spawn(connection);

            // Perform a simple query to check the connection
            match client.query_one("SELECT 1", &[]).await {
                Ok(_) => {}
                Err(_) => return Err(PostgresConnectionError::CanNotConnectToDatabase),
            };

            // Drop the client and ensure the connection handle completes
            drop(client);
            match connection_handle.await {
                Ok(Ok(())) => (),
                Ok(Err(_)) => return Err(PostgresConnectionError::CanNotConnectToDatabase),
                Err(_) => return Err(PostgresConnectionError::CanNotConnectToDatabase),
            }

            let manager = PostgresConnectionManager::new(config, tls_connector);

            let pool = Pool::builder().build(manager).await?;

            Ok(PostgresClient { pool })
        }

        _new(false).await
    }

    pub async fn execute<T>(
        &self,
        query: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, PostgresError>
    where
        T: ?Sized + ToStatement,
    {
        let conn = self.pool.get().await?;
        conn.execute(query, params).await.map_err(PostgresError::PgError)
    }

    pub async fn query<T>(
        &self,
        query: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, PostgresError>
    where
        T: ?Sized + ToStatement,
    {
        let conn = self.pool.get().await?;
        let rows = conn.query(query, params).await.map_err(PostgresError::PgError)?;
        Ok(rows)
    }
}

fn bind_parameters(parameters: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
    parameters.iter().map(|parameter| parameter as &(dyn ToSql + Sync)).collect()
}

/// Reads the single key column of a `RETURNING` row into the value kind that
/// matches its declared column type.
fn key_from_row(row: &Row) -> Result<SqlValue, ExecutionError> {
    let column = match row.columns().first() {
        Some(column) => column,
        None => return Err(ExecutionError::new("key query returned a row with no columns")),
    };

    let ty = column.type_();
    if *ty == PgType::INT2 {
        Ok(SqlValue::I16(row.try_get(0).map_err(ExecutionError::from_source)?))
    } else if *ty == PgType::INT4 {
        Ok(SqlValue::I32(row.try_get(0).map_err(ExecutionError::from_source)?))
    } else if *ty == PgType::INT8 {
        Ok(SqlValue::I64(row.try_get(0).map_err(ExecutionError::from_source)?))
    } else if *ty == PgType::UUID {
        Ok(SqlValue::Uuid(row.try_get::<_, Uuid>(0).map_err(ExecutionError::from_source)?))
    } else if *ty == PgType::NUMERIC {
        Ok(SqlValue::Numeric(row.try_get::<_, Decimal>(0).map_err(ExecutionError::from_source)?))
    } else if *ty == PgType::TEXT || *ty == PgType::VARCHAR || *ty == PgType::BPCHAR {
        Ok(SqlValue::Text(row.try_get(0).map_err(ExecutionError::from_source)?))
    } else {
        Err(ExecutionError::new(format!("unsupported primary key column type '{}'", ty)))
    }
}

#[async_trait]
impl AsyncStatementExecutor for PostgresClient {
    fn provider_id(&self) -> &str {
        POSTGRES_PROVIDER_ID
    }

    async fn execute(&self, query: &str, parameters: &[SqlValue]) -> Result<u64, ExecutionError> {
        let params = bind_parameters(parameters);
        PostgresClient::execute(self, query, &params).await.map_err(ExecutionError::from_source)
    }

    async fn query_keys(
        &self,
        query: &str,
        parameters: &[SqlValue],
    ) -> Result<Vec<SqlValue>, ExecutionError> {
        let params = bind_parameters(parameters);
        let rows =
            PostgresClient::query(self, query, &params).await.map_err(ExecutionError::from_source)?;

        rows.iter().map(key_from_row).collect()
    }
}
