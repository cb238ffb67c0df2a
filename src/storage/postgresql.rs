//! Client-server engine connection.
//!
//! `tokio-postgres` is asynchronous while the storage layer is blocking, so
//! each connection owns a current-thread runtime. The driver task is spawned
//! on that runtime and makes progress whenever a query blocks on it.

#[cfg(feature = "postgres")]
mod implementation {
    use crate::storage::connection::Backend;
    use crate::storage::engine::Engine;
    use crate::storage::row::{Row, Value};
    use crate::{Error, Result};
    use std::time::Duration;
    use tokio::runtime::Runtime;
    use tokio::task::JoinHandle;
    use tokio_postgres::types::{ToSql, Type};
    use tokio_postgres::{Client, NoTls};

    /// A single PostgreSQL connection.
    pub struct PostgresConnection {
        client: Client,
        driver: JoinHandle<()>,
        runtime: Runtime,
    }

    impl PostgresConnection {
        /// Connects to the server named by `url`.
        ///
        /// # Errors
        ///
        /// Returns an error if the URL does not parse, the runtime cannot be
        /// built, or the server cannot be reached within `connect_timeout`.
        pub fn open(url: &str, connect_timeout: Duration) -> Result<Self> {
            let mut config: tokio_postgres::Config = url.parse()?;
            config.connect_timeout(connect_timeout);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| Error::OperationFailed {
                    operation: "postgres_create_runtime".to_string(),
                    cause: e.to_string(),
                })?;

            let (client, connection) = runtime.block_on(config.connect(NoTls))?;
            let driver = runtime.spawn(async move {
                if let Err(e) = connection.await {
                    tracing::warn!(error = %e, "PostgreSQL connection terminated with error");
                }
            });

            Ok(Self {
                client,
                driver,
                runtime,
            })
        }
    }

    impl Backend for PostgresConnection {
        fn engine(&self) -> Engine {
            Engine::ClientServer
        }

        fn query(&mut self, statement: &str, params: &[Value]) -> Result<(Vec<Row>, u64)> {
            let bound: Vec<Box<dyn ToSql + Sync>> = params.iter().map(bind_param).collect();
            let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|b| b.as_ref()).collect();
            let client = &self.client;

            self.runtime.block_on(async {
                let prepared = client.prepare(statement).await?;
                if prepared.columns().is_empty() {
                    let affected = client.execute(&prepared, &refs).await?;
                    return Ok::<_, Error>((Vec::new(), affected));
                }

                let rows = client.query(&prepared, &refs).await?;
                let converted = rows.iter().map(row_from_pg).collect::<Result<Vec<_>>>()?;
                let count = converted.len() as u64;
                Ok::<_, Error>((converted, count))
            })
        }

        fn execute_batch(&mut self, sql: &str) -> Result<()> {
            self.runtime.block_on(self.client.batch_execute(sql))?;
            Ok(())
        }

        fn close(self: Box<Self>) -> Result<()> {
            let Self {
                client,
                driver,
                runtime,
            } = *self;
            drop(client);
            // the driver finishes once it sees the client hang up
            join_driver(&runtime, driver);
            Ok(())
        }
    }

    /// Waits for the driver task, logging it if the task panicked or was
    /// cancelled. Returns whether it finished cleanly.
    fn join_driver(runtime: &Runtime, driver: JoinHandle<()>) -> bool {
        match runtime.block_on(driver) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "PostgreSQL driver task did not finish");
                false
            },
        }
    }

    /// Boxes a parameter as the Rust type whose PostgreSQL mapping matches it.
    ///
    /// `NULL` is sent as a text-typed null, which PostgreSQL coerces for any
    /// column this crate writes.
    fn bind_param(value: &Value) -> Box<dyn ToSql + Sync> {
        match value {
            Value::Null => Box::new(None::<String>),
            Value::Integer(i) => Box::new(*i),
            Value::Real(r) => Box::new(*r),
            Value::Text(s) => Box::new(s.clone()),
            Value::Blob(b) => Box::new(b.clone()),
        }
    }

    /// Converts a driver row into the engine-neutral [`Row`].
    fn row_from_pg(row: &tokio_postgres::Row) -> Result<Row> {
        let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        let values = row
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| value_at(row, i, column.type_()))
            .collect::<std::result::Result<Vec<_>, tokio_postgres::Error>>()?;
        Ok(Row::new(columns, values))
    }

    fn value_at(
        row: &tokio_postgres::Row,
        i: usize,
        ty: &Type,
    ) -> std::result::Result<Value, tokio_postgres::Error> {
        let value = if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(i)?.map(Value::Integer)
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(i)?
                .map(|v| Value::Integer(i64::from(v)))
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(i)?
                .map(|v| Value::Integer(i64::from(v)))
        } else if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(i)?
                .map(|v| Value::Integer(i64::from(v)))
        } else if *ty == Type::FLOAT8 {
            row.try_get::<_, Option<f64>>(i)?.map(Value::Real)
        } else if *ty == Type::FLOAT4 {
            row.try_get::<_, Option<f32>>(i)?
                .map(|v| Value::Real(f64::from(v)))
        } else if *ty == Type::BYTEA {
            row.try_get::<_, Option<Vec<u8>>>(i)?.map(Value::Blob)
        } else {
            row.try_get::<_, Option<String>>(i)?.map(Value::Text)
        };
        Ok(value.unwrap_or(Value::Null))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn runtime() -> Runtime {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
        }

        #[test]
        fn test_join_driver_clean_exit() {
            let runtime = runtime();
            let driver = runtime.spawn(async {});
            assert!(join_driver(&runtime, driver));
        }

        #[test]
        #[allow(clippy::panic)]
        fn test_join_driver_reports_panicked_task() {
            let runtime = runtime();
            let driver = runtime.spawn(async { panic!("connection task failed") });
            assert!(!join_driver(&runtime, driver));
        }

        #[test]
        fn test_join_driver_reports_cancelled_task() {
            let runtime = runtime();
            let driver = runtime.spawn(std::future::pending::<()>());
            driver.abort();
            assert!(!join_driver(&runtime, driver));
        }
    }
}

#[cfg(feature = "postgres")]
pub use implementation::PostgresConnection;
