use crate::driver::{SqlxDriver, SQLX_DRIVER_TYPE};
use crate::entity::Entity;
use crate::fields::{CoreExtension, SqlxDriverExtension};
use crate::query::{CountStrategy, QueryBuilder};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sift_core::{DataSourceError, Driver, DriverFactory};
use sqlx::{Database, Encode, Executor, FromRow, IntoArguments, Pool, Type};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// Options consumed by [`SqlxFactory`].
pub struct SqlxDriverOptions<DB: Database> {
    pub pool: Pool<DB>,
    pub template: Option<QueryBuilder>,
    pub count_strategy: CountStrategy,
}

impl<DB: Database> SqlxDriverOptions<DB> {
    pub fn new(pool: Pool<DB>) -> Self {
        Self {
            pool,
            template: None,
            count_strategy: CountStrategy::default(),
        }
    }

    /// Select template every pass starts from, instead of the one derived
    /// from the entity.
    pub fn template(mut self, template: QueryBuilder) -> Self {
        self.template = Some(template);
        self
    }

    pub fn count_strategy(mut self, strategy: CountStrategy) -> Self {
        self.count_strategy = strategy;
        self
    }
}

/// Factory registering the SQLx driver under `"sqlx"`.
pub struct SqlxFactory<DB: Database> {
    extensions: Vec<Arc<dyn SqlxDriverExtension>>,
    _marker: PhantomData<DB>,
}

impl<DB: Database> SqlxFactory<DB> {
    pub fn new(extensions: Vec<Arc<dyn SqlxDriverExtension>>) -> Self {
        Self {
            extensions,
            _marker: PhantomData,
        }
    }

    /// Factory with only the built-in field types.
    pub fn core() -> Self {
        Self::new(vec![Arc::new(CoreExtension)])
    }
}

impl<T, DB> DriverFactory<T> for SqlxFactory<DB>
where
    DB: Database + Sync,
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

    fn create_driver(
        &self,
        options: Box<dyn Any + Send>,
    ) -> Result<Box<dyn Driver<T>>, DataSourceError> {
        let options = options.downcast::<SqlxDriverOptions<DB>>().map_err(|_| {
            DataSourceError::Configuration("sqlx driver expects SqlxDriverOptions".to_string())
        })?;
        let SqlxDriverOptions {
            pool,
            template,
            count_strategy,
        } = *options;
        let driver = match template {
            Some(template) => SqlxDriver::from_template(self.extensions.clone(), pool, template),
            None => SqlxDriver::new(self.extensions.clone(), pool)?,
        };
        Ok(Box::new(driver.count_strategy(count_strategy)))
    }
}
