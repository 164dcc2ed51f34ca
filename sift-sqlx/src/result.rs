use crate::entity::Entity;
use crate::error::SqlxDriverError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sift_core::{DataSourceResult, ScalarValue};
use sqlx::{Database, Encode, Executor, FromRow, IntoArguments, Pool, Type};

// QueryAs and QueryScalar share no bind trait, hence the macro.
macro_rules! bind_scalar {
    ($query:expr, $value:expr) => {
        match $value {
            ScalarValue::Null => $query.bind(Option::<i64>::None),
            ScalarValue::Bool(v) => $query.bind(v),
            ScalarValue::Int(v) => $query.bind(v),
            ScalarValue::Float(v) => $query.bind(v),
            ScalarValue::Str(v) => $query.bind(v),
            ScalarValue::Date(v) => $query.bind(v),
            ScalarValue::Time(v) => $query.bind(v),
            ScalarValue::DateTime(v) => $query.bind(v),
        }
    };
}

/// One executed pass: the page rows keyed by entity identity, plus the
/// matching-row count taken before pagination bounds applied.
pub struct SqlxResult<T> {
    entries: Vec<(String, T)>,
    count: u64,
}

impl<T: Entity> SqlxResult<T> {
    pub(crate) async fn fetch<DB>(
        pool: &Pool<DB>,
        select: (String, Vec<ScalarValue>),
        count: (String, Vec<ScalarValue>),
    ) -> Result<Self, SqlxDriverError>
    where
        DB: Database,
        T: for<'r> FromRow<'r, DB::Row>,
        for<'c> &'c Pool<DB>: Executor<'c, Database = DB>,
        for<'q> DB::Arguments<'q>: IntoArguments<'q, DB>,
        (i64,): for<'r> FromRow<'r, DB::Row>,
        i64: Type<DB> + for<'q> Encode<'q, DB>,
        Option<i64>: for<'q> Encode<'q, DB>,
        f64: Type<DB> + for<'q> Encode<'q, DB>,
        bool: Type<DB> + for<'q> Encode<'q, DB>,
        String: Type<DB> + for<'q> Encode<'q, DB>,
        NaiveDate: Type<DB> + for<'q> Encode<'q, DB>,
        NaiveTime: Type<DB> + for<'q> Encode<'q, DB>,
        NaiveDateTime: Type<DB> + for<'q> Encode<'q, DB>,
    {
        let (count_sql, count_binds) = count;
        tracing::debug!(sql = %count_sql, binds = count_binds.len(), "executing count");
        let mut query = sqlx::query_scalar::<DB, i64>(&count_sql);
        for value in count_binds {
            query = bind_scalar!(query, value);
        }
        let total = query
            .fetch_one(pool)
            .await
            .map_err(SqlxDriverError::Execute)?;

        let (select_sql, select_binds) = select;
        tracing::debug!(sql = %select_sql, binds = select_binds.len(), "executing page select");
        let mut query = sqlx::query_as::<DB, T>(&select_sql);
        for value in select_binds {
            query = bind_scalar!(query, value);
        }
        let rows = query
            .fetch_all(pool)
            .await
            .map_err(SqlxDriverError::Execute)?;

        Ok(Self {
            entries: rows.into_iter().map(|row| (row.identity(), row)).collect(),
            count: total.max(0) as u64,
        })
    }

    /// Look up a page record by its identity key.
    pub fn get(&self, identity: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, record)| record)
    }

    /// Identity keys of the page, in select order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

impl<T: Entity> DataSourceResult<T> for SqlxResult<T> {
    fn count(&self) -> u64 {
        self.count
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = &'a T> + 'a> {
        Box::new(self.entries.iter().map(|(_, record)| record))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
