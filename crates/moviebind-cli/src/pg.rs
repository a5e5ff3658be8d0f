//! [`Store`] backed by Postgres through sqlx.
//!
//! The seeding run is synchronous, so the store blocks on the binary's tokio
//! runtime. It must be driven from a blocking worker thread
//! (`tokio::task::spawn_blocking`), never from inside an async task.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tokio::runtime::Handle;

use moviebind_core::{Catalog, ColumnType, EntityId, FieldValue, Record, Table};
use moviebind_generate::{Store, StoreError};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

pub struct PgStore {
    pool: PgPool,
    catalog: Catalog,
    runtime: Handle,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgStore {
    pub fn new(pool: PgPool, catalog: Catalog, runtime: Handle) -> Self {
        Self {
            pool,
            catalog,
            runtime,
            tx: None,
        }
    }
}

impl Store for PgStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        if self.tx.is_some() {
            return Err(StoreError::TransactionOpen);
        }
        let tx = self
            .runtime
            .block_on(self.pool.begin())
            .map_err(store_error)?;
        self.tx = Some(tx);
        Ok(())
    }

    fn flush(&mut self, pending: &[Record]) -> Result<Vec<Option<EntityId>>, StoreError> {
        let tx = self.tx.as_mut().ok_or(StoreError::NoTransaction)?;
        let catalog = &self.catalog;

        self.runtime.block_on(async {
            let mut ids = Vec::with_capacity(pending.len());
            for record in pending {
                let table = catalog.table(record.kind()).ok_or_else(|| {
                    StoreError::Backend(format!("unknown table {}", record.kind()))
                })?;
                let identity = table.identity_column().map(|column| column.name.as_str());
                let sql = insert_sql(table, record, identity);

                let mut query = sqlx::query(&sql);
                for (column, value) in record.values() {
                    let column_type = table
                        .column(column)
                        .map(|column| column.column_type)
                        .ok_or_else(|| {
                            StoreError::Backend(format!("unknown column {}.{column}", table.name))
                        })?;
                    query = bind_value(query, column_type, value, &table.name, column)?;
                }

                match identity {
                    Some(identity) => {
                        let row = query.fetch_one(&mut **tx).await.map_err(store_error)?;
                        let id: i64 = row.try_get(identity).map_err(store_error)?;
                        ids.push(Some(EntityId(id)));
                    }
                    None => {
                        query.execute(&mut **tx).await.map_err(store_error)?;
                        ids.push(None);
                    }
                }
            }
            Ok::<_, StoreError>(ids)
        })
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::NoTransaction)?;
        self.runtime.block_on(tx.commit()).map_err(store_error)
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::NoTransaction)?;
        self.runtime.block_on(tx.rollback()).map_err(store_error)
    }
}

fn insert_sql(table: &Table, record: &Record, identity: Option<&str>) -> String {
    let columns: Vec<&str> = record.values().iter().map(|(column, _)| *column).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        columns.join(", "),
        placeholders.join(", ")
    );
    if let Some(identity) = identity {
        sql.push_str(&format!(" RETURNING {identity}"));
    }
    sql
}

fn bind_value<'q>(
    query: PgQuery<'q>,
    column_type: ColumnType,
    value: &FieldValue,
    table: &str,
    column: &str,
) -> Result<PgQuery<'q>, StoreError> {
    let mismatch = || {
        StoreError::Backend(format!(
            "cannot bind {} to {table}.{column} ({})",
            value.kind_name(),
            column_type.name()
        ))
    };

    let query = match (column_type, value) {
        (ColumnType::BigInt, FieldValue::Int(v)) => query.bind(*v),
        (ColumnType::BigInt, FieldValue::Null) => query.bind(None::<i64>),
        (ColumnType::Integer, FieldValue::Int(v)) => {
            query.bind(i32::try_from(*v).map_err(|_| mismatch())?)
        }
        (ColumnType::Integer, FieldValue::Null) => query.bind(None::<i32>),
        (ColumnType::Boolean, FieldValue::Bool(v)) => query.bind(*v),
        (ColumnType::Boolean, FieldValue::Null) => query.bind(None::<bool>),
        (ColumnType::Varchar { .. } | ColumnType::Text, FieldValue::Text(v)) => {
            query.bind(v.clone())
        }
        (ColumnType::Varchar { .. } | ColumnType::Text, FieldValue::Null) => {
            query.bind(None::<String>)
        }
        (ColumnType::Numeric { .. }, FieldValue::Decimal(v)) => query.bind(*v),
        (ColumnType::Numeric { .. }, FieldValue::Null) => query.bind(None::<Decimal>),
        (ColumnType::Date, FieldValue::Date(v)) => query.bind(*v),
        (ColumnType::Date, FieldValue::Null) => query.bind(None::<NaiveDate>),
        (ColumnType::Timestamp, FieldValue::Timestamp(v)) => query.bind(*v),
        (ColumnType::Timestamp, FieldValue::Null) => query.bind(None::<NaiveDateTime>),
        _ => return Err(mismatch()),
    };
    Ok(query)
}

fn store_error(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        let table = db.table().unwrap_or("unknown").to_string();
        let constraint = db.constraint().unwrap_or("unknown").to_string();
        if db.is_unique_violation() {
            return StoreError::UniqueViolation { table, constraint };
        }
        if db.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation { table, constraint };
        }
        if db.is_check_violation() {
            return StoreError::Rejected {
                table,
                reason: format!("check constraint {constraint} failed"),
            };
        }
    }
    StoreError::Backend(err.to_string())
}
