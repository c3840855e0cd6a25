//! Generic client trait for unified database access.

use crate::error::CraftResult;
use crate::row::Row;
use crate::value::Value;

/// A trait that unifies database clients and transactions.
///
/// Finishers and generated repositories make exactly one call on this trait
/// per operation. Retries, pooling and timeouts belong to the implementor or
/// the caller.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<u64>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// Extra rows are ignored, not reported.
    fn query_opt(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, args).await?;
            Ok(rows.into_iter().next())
        }
    }
}

impl<T: GenericClient> GenericClient for &T {
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<Vec<Row>>> + Send {
        (**self).query(sql, args)
    }

    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<u64>> + Send {
        (**self).execute(sql, args)
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::GenericClient;
    use crate::error::CraftResult;
    use crate::row::Row;
    use crate::value::Value;
    use tokio_postgres::types::ToSql;

    fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
        args.iter().map(|a| a as &(dyn ToSql + Sync)).collect()
    }

    fn convert(rows: Vec<tokio_postgres::Row>) -> CraftResult<Vec<Row>> {
        rows.iter().map(Row::try_from).collect()
    }

    impl GenericClient for tokio_postgres::Client {
        async fn query(&self, sql: &str, args: &[Value]) -> CraftResult<Vec<Row>> {
            let rows = tokio_postgres::Client::query(self, sql, &params(args)).await?;
            convert(rows)
        }

        async fn execute(&self, sql: &str, args: &[Value]) -> CraftResult<u64> {
            Ok(tokio_postgres::Client::execute(self, sql, &params(args)).await?)
        }
    }

    impl GenericClient for tokio_postgres::Transaction<'_> {
        async fn query(&self, sql: &str, args: &[Value]) -> CraftResult<Vec<Row>> {
            let rows = tokio_postgres::Transaction::query(self, sql, &params(args)).await?;
            convert(rows)
        }

        async fn execute(&self, sql: &str, args: &[Value]) -> CraftResult<u64> {
            Ok(tokio_postgres::Transaction::execute(self, sql, &params(args)).await?)
        }
    }
}
