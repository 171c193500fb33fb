//! `tokio-postgres` driver.
//!
//! Named `:placeholders` are rewritten to `$n` before execution, and
//! [`BindValue`]s are encoded according to the parameter type the server
//! reports. Temporal values, which the normalizer renders as text, are parsed
//! back for `timestamp`, `timestamptz` and `date` parameters.

use crate::cursor::BoundaryRow;
use crate::dialect::Dialect;
use crate::driver::Driver;
use crate::error::{PageError, PageResult};
use crate::params::{BindValue, Params};
use crate::sql::to_positional;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{GenericClient, Row};

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for BindValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            BindValue::Null => Ok(IsNull::Yes),
            BindValue::Bool(b) => b.to_sql(ty, out),
            BindValue::Int(i) => {
                if *ty == Type::INT2 {
                    i16::try_from(*i)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*i)?.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*i as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*i as f64).to_sql(ty, out)
                } else {
                    i.to_sql(ty, out)
                }
            }
            BindValue::Str(s) => {
                if *ty == Type::TIMESTAMPTZ {
                    DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%z")?
                        .with_timezone(&Utc)
                        .to_sql(ty, out)
                } else if *ty == Type::TIMESTAMP {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")?.to_sql(ty, out)
                } else if *ty == Type::DATE {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")?.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    s.parse::<f32>()?.to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    s.parse::<f64>()?.to_sql(ty, out)
                } else {
                    s.as_str().to_sql(ty, out)
                }
            }
            BindValue::Lob(b) => b.as_slice().to_sql(ty, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl BoundaryRow for Row {
    fn column_value(&self, column: &str) -> Option<Value> {
        let idx = self.columns().iter().position(|c| c.name() == column)?;
        let ty = self.columns()[idx].type_();

        macro_rules! get {
            ($t:ty) => {
                self.try_get::<_, Option<$t>>(idx).ok()?
            };
        }

        let value = if *ty == Type::BOOL {
            get!(bool).map(Value::Bool)
        } else if *ty == Type::INT2 {
            get!(i16).map(Value::from)
        } else if *ty == Type::INT4 {
            get!(i32).map(Value::from)
        } else if *ty == Type::INT8 {
            get!(i64).map(Value::Int)
        } else if *ty == Type::FLOAT4 {
            get!(f32).map(Value::from)
        } else if *ty == Type::FLOAT8 {
            get!(f64).map(Value::Float)
        } else if *ty == Type::TIMESTAMP {
            get!(NaiveDateTime).map(Value::DateTime)
        } else if *ty == Type::TIMESTAMPTZ {
            get!(DateTime<Utc>).map(Value::from)
        } else if *ty == Type::DATE {
            get!(NaiveDate).map(Value::Date)
        } else if *ty == Type::BYTEA {
            get!(Vec<u8>).map(Value::Bytes)
        } else {
            get!(String).map(Value::String)
        };
        Some(value.unwrap_or(Value::Null))
    }
}

/// [`Driver`] over a `tokio-postgres` client or transaction.
///
/// # Example
/// ```ignore
/// use seekpage::{Dialect, MemoryCursorStore, OrderBy, PageRequest, Pager, ParamList, paginate};
/// use seekpage::postgres::PgDriver;
///
/// let driver = PgDriver::new(&client);
/// let order = OrderBy::new().desc("created_at")?.asc("id")?;
/// let pager = Pager::new(1, 20).with_cursor_name("feed");
/// let page = paginate(
///     &driver,
///     Dialect::Postgres,
///     PageRequest::new("SELECT * FROM posts", &order, &ParamList::new(), &pager),
///     &MemoryCursorStore::new(),
/// )
/// .await?;
/// ```
#[derive(Debug)]
pub struct PgDriver<'a, C> {
    client: &'a C,
}

impl<'a, C> PgDriver<'a, C>
where
    C: GenericClient + Sync,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &'a C {
        self.client
    }
}

fn ensure_postgres(dialect: Dialect) -> PageResult<()> {
    match dialect {
        Dialect::Postgres => Ok(()),
        other => Err(PageError::Driver(format!(
            "PgDriver cannot execute {other} statements"
        ))),
    }
}

impl<C> Driver for PgDriver<'_, C>
where
    C: GenericClient + Sync,
{
    type Row = Row;

    async fn execute(&self, dialect: Dialect, sql: &str, params: &Params) -> PageResult<Vec<Row>> {
        ensure_postgres(dialect)?;
        let (sql, ordered) = to_positional(sql, params)?;
        let refs: Vec<&(dyn ToSql + Sync)> = ordered
            .iter()
            .map(|p| p.value() as &(dyn ToSql + Sync))
            .collect();
        Ok(self.client.query(sql.as_str(), &refs).await?)
    }

    async fn count(&self, dialect: Dialect, sql: &str, params: &Params) -> PageResult<i64> {
        ensure_postgres(dialect)?;
        let (sql, ordered) = to_positional(sql, params)?;
        let refs: Vec<&(dyn ToSql + Sync)> = ordered
            .iter()
            .map(|p| p.value() as &(dyn ToSql + Sync))
            .collect();
        let row = self.client.query_one(sql.as_str(), &refs).await?;
        Ok(row.try_get::<_, i64>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: BindValue, ty: &Type) -> Result<(IsNull, Vec<u8>), BoxError> {
        let mut out = BytesMut::new();
        let is_null = value.to_sql(ty, &mut out)?;
        Ok((is_null, out.to_vec()))
    }

    #[test]
    fn ints_narrow_to_column_width() {
        let (_, bytes) = encode(BindValue::Int(7), &Type::INT4).unwrap();
        assert_eq!(bytes, 7i32.to_be_bytes());
        let (_, bytes) = encode(BindValue::Int(7), &Type::INT8).unwrap();
        assert_eq!(bytes, 7i64.to_be_bytes());
        assert!(encode(BindValue::Int(i64::MAX), &Type::INT2).is_err());
    }

    #[test]
    fn null_is_flagged() {
        let (is_null, bytes) = encode(BindValue::Null, &Type::TEXT).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(bytes.is_empty());
    }

    #[test]
    fn temporal_text_is_parsed_for_timestamp_params() {
        let s = BindValue::Str("2024-01-02 03:04:05+0000".to_string());
        assert!(encode(s, &Type::TIMESTAMPTZ).is_ok());
        let d = BindValue::Str("2024-01-02".to_string());
        assert!(encode(d, &Type::DATE).is_ok());
        let bad = BindValue::Str("yesterday".to_string());
        assert!(encode(bad, &Type::TIMESTAMP).is_err());
    }

    #[test]
    fn rejects_other_dialects() {
        assert!(ensure_postgres(Dialect::Postgres).is_ok());
        assert!(ensure_postgres(Dialect::MySql).is_err());
    }
}
