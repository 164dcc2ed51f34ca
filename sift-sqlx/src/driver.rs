use crate::entity::Entity;
use crate::error::SqlxDriverError;
use crate::fields::{SqlFieldHandle, SqlxDriverExtension};
use crate::query::{CountStrategy, Dialect, QueryBuilder};
use crate::result::SqlxResult;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sift_core::{
    Comparison, DataSourceError, DataSourceField, DataSourceResult, Driver, FieldOptions,
};
use sqlx::{Database, Encode, Executor, FromRow, IntoArguments, Pool, Type};
use std::marker::PhantomData;
use std::sync::Arc;

/// Registry key of the SQLx driver.
pub const SQLX_DRIVER_TYPE: &str = "sqlx";

/// Alias given to the entity table in generated SQL.
pub const DEFAULT_ALIAS: &str = "e";

/// Driver translating fields into SQL executed through an `sqlx::Pool`.
///
/// The driver owns a template [`QueryBuilder`] seeded from the entity's
/// table and columns; each build pass works on a fresh clone, so base
/// restrictions configured up front apply to every pass and passes never
/// see each other's state. Two statements run per pass: the matching-row
/// count (bounds ignored) and the page select.
pub struct SqlxDriver<T, DB: Database> {
    extensions: Vec<Arc<dyn SqlxDriverExtension>>,
    pool: Pool<DB>,
    template: QueryBuilder,
    count_strategy: CountStrategy,
    current: Option<QueryBuilder>,
    _marker: PhantomData<T>,
}

impl<T, DB: Database> std::fmt::Debug for SqlxDriver<T, DB> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxDriver")
            .field("extensions", &self.extensions.len())
            .field("template", &self.template)
            .field("count_strategy", &self.count_strategy)
            .finish_non_exhaustive()
    }
}

impl<T: Entity, DB: Database> SqlxDriver<T, DB> {
    /// Driver over the entity's own table, with the dialect inferred from
    /// the database type.
    pub fn new(
        extensions: Vec<Arc<dyn SqlxDriverExtension>>,
        pool: Pool<DB>,
    ) -> Result<Self, DataSourceError> {
        if T::table_name().is_empty() {
            return Err(DataSourceError::Configuration(
                "entity table name must not be empty".to_string(),
            ));
        }
        let template = QueryBuilder::new(T::table_name(), DEFAULT_ALIAS).columns(T::columns());
        Ok(Self::from_template(extensions, pool, template))
    }

    /// Driver over a caller-supplied template, for selects with base
    /// restrictions or joins configured up front. The placeholder dialect
    /// always comes from the database type, whatever the template carried.
    pub fn from_template(
        extensions: Vec<Arc<dyn SqlxDriverExtension>>,
        pool: Pool<DB>,
        template: QueryBuilder,
    ) -> Self {
        Self {
            extensions,
            pool,
            template: template.dialect(Dialect::from_database_name(DB::NAME)),
            count_strategy: CountStrategy::default(),
            current: None,
            _marker: PhantomData,
        }
    }

    /// Change how the matching-row count is computed. Templates that fan
    /// out over joins need [`CountStrategy::Wrapped`].
    pub fn count_strategy(mut self, strategy: CountStrategy) -> Self {
        self.count_strategy = strategy;
        self
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }

    /// Fresh working copy of the template for one pass.
    pub fn init_query(&self) -> QueryBuilder {
        self.template.clone()
    }

    /// The working query of the pass being built.
    ///
    /// Populated only while the pre-build hooks run; any other access is a
    /// state error.
    pub fn current_query(&self) -> Result<&QueryBuilder, SqlxDriverError> {
        self.current
            .as_ref()
            .ok_or(SqlxDriverError::QueryOutsideBuild)
    }

    fn run_pre_build(&mut self) -> Result<(), SqlxDriverError> {
        let query = self
            .current
            .as_mut()
            .ok_or(SqlxDriverError::QueryOutsideBuild)?;
        for extension in &self.extensions {
            extension.pre_build(query)?;
        }
        Ok(())
    }

    fn build(
        &mut self,
        fields: &[Box<dyn DataSourceField>],
        first: u64,
        max: Option<u64>,
    ) -> Result<QueryBuilder, SqlxDriverError> {
        // The hook window closes here; fields build against a query the
        // accessor no longer exposes.
        let mut query = self
            .current
            .take()
            .ok_or(SqlxDriverError::QueryOutsideBuild)?;

        for field in fields {
            let handle = field
                .as_any()
                .downcast_ref::<SqlFieldHandle>()
                .ok_or_else(|| SqlxDriverError::MissingCapability {
                    field: field.name().to_string(),
                })?;
            handle.builder().build_query(&mut query)?;
        }

        let mut ordered: Vec<_> = fields
            .iter()
            .filter_map(|f| f.ordering().map(|o| (f, o)))
            .collect();
        ordered.sort_by_key(|(_, o)| o.priority);
        for (field, ordering) in ordered {
            query.order_by(field.source_field(), ordering.direction);
        }

        if let Some(max) = max {
            query.set_first_result(first).set_max_results(max);
        }

        Ok(query)
    }
}

#[async_trait]
impl<T, DB> Driver<T> for SqlxDriver<T, DB>
where
    DB: Database,
    T: Entity + for<'r> FromRow<'r, DB::Row>,
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
    fn driver_type(&self) -> &'static str {
        SQLX_DRIVER_TYPE
    }

    fn create_field(
        &self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
        options: &FieldOptions,
    ) -> Result<Box<dyn DataSourceField>, DataSourceError> {
        let extension = self
            .extensions
            .iter()
            .find(|e| e.has_field_type(type_name))
            .ok_or_else(|| DataSourceError::UnsupportedFieldType {
                type_name: type_name.to_string(),
                driver_type: SQLX_DRIVER_TYPE,
            })?;
        let mut field = extension.create_field(name, type_name, comparison, options)?;
        for extension in &self.extensions {
            extension.decorate_field(field.as_mut());
        }
        Ok(Box::new(SqlFieldHandle::new(field)))
    }

    async fn get_result(
        &mut self,
        fields: &[Box<dyn DataSourceField>],
        first: u64,
        max: Option<u64>,
    ) -> Result<Box<dyn DataSourceResult<T>>, DataSourceError> {
        tracing::debug!(
            driver = SQLX_DRIVER_TYPE,
            table = T::table_name(),
            fields = fields.len(),
            first,
            max = ?max,
            "building sql result"
        );
        self.current = Some(self.init_query());
        let built = self
            .run_pre_build()
            .and_then(|()| self.build(fields, first, max));
        // Cleared before anything touches the database; failures clear it
        // too.
        self.current = None;
        let query = built?;

        let count = query
            .build_count(self.count_strategy)
            .map_err(SqlxDriverError::Query)?;
        let select = query.build_select().map_err(SqlxDriverError::Query)?;
        let result = SqlxResult::fetch(&self.pool, select, count).await?;
        Ok(Box::new(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::CoreExtension;
    use sqlx::{Sqlite, SqlitePool};

    #[derive(Debug, sqlx::FromRow)]
    struct News {
        id: i64,
        title: String,
    }

    impl Entity for News {
        type Id = i64;

        fn table_name() -> &'static str {
            "news"
        }

        fn columns() -> &'static [&'static str] {
            &["id", "title"]
        }

        fn id(&self) -> &i64 {
            &self.id
        }
    }

    #[derive(Debug, sqlx::FromRow)]
    struct Unnamed {
        id: i64,
    }

    impl Entity for Unnamed {
        type Id = i64;

        fn table_name() -> &'static str {
            ""
        }

        fn columns() -> &'static [&'static str] {
            &["id"]
        }

        fn id(&self) -> &i64 {
            &self.id
        }
    }

    fn pool() -> SqlitePool {
        SqlitePool::connect_lazy("sqlite::memory:").unwrap()
    }

    fn extensions() -> Vec<Arc<dyn SqlxDriverExtension>> {
        vec![Arc::new(CoreExtension)]
    }

    #[tokio::test]
    async fn the_template_selects_the_entity_columns() {
        let driver = SqlxDriver::<News, Sqlite>::new(extensions(), pool()).unwrap();
        let (sql, binds) = driver.init_query().build_select().unwrap();
        assert_eq!(sql, "SELECT e.id, e.title FROM news e");
        assert!(binds.is_empty());
    }

    #[tokio::test]
    async fn an_empty_table_name_is_a_configuration_error() {
        let err = SqlxDriver::<Unnamed, Sqlite>::new(extensions(), pool()).unwrap_err();
        assert!(matches!(err, DataSourceError::Configuration(_)));
    }

    #[tokio::test]
    async fn the_working_query_is_closed_outside_a_pass() {
        let driver = SqlxDriver::<News, Sqlite>::new(extensions(), pool()).unwrap();
        assert!(matches!(
            driver.current_query(),
            Err(SqlxDriverError::QueryOutsideBuild)
        ));
    }

    #[tokio::test]
    async fn foreign_fields_are_rejected_during_build() {
        let mut driver = SqlxDriver::<News, Sqlite>::new(extensions(), pool()).unwrap();
        driver.current = Some(driver.init_query());

        struct Foreign;
        impl DataSourceField for Foreign {
            fn name(&self) -> &str {
                "title"
            }
            fn type_name(&self) -> &'static str {
                "text"
            }
            fn comparison(&self) -> Comparison {
                Comparison::Eq
            }
            fn source_field(&self) -> &str {
                "title"
            }
            fn bind_parameter(
                &mut self,
                _raw: &serde_json::Value,
            ) -> Result<(), DataSourceError> {
                Ok(())
            }
            fn parameter(&self) -> Option<&sift_core::ParameterValue> {
                None
            }
            fn ordering(&self) -> Option<sift_core::FieldOrdering> {
                None
            }
            fn set_ordering(&mut self, _ordering: Option<sift_core::FieldOrdering>) {}
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }

        let fields: Vec<Box<dyn DataSourceField>> = vec![Box::new(Foreign)];
        let err = driver.build(&fields, 0, None).unwrap_err();
        assert!(matches!(
            err,
            SqlxDriverError::MissingCapability { field } if field == "title"
        ));
    }
}
