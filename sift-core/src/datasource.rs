use crate::comparison::{Comparison, Direction};
use crate::driver::Driver;
use crate::error::DataSourceError;
use crate::field::{DataSourceField, FieldOptions, FieldOrdering};
use crate::result::DataSourceResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::str::FromStr;
use std::sync::Arc;

/// Sort specification bound through parameters.
///
/// Entries use the `"field,direction"` form; a bare `"field"` sorts
/// ascending. An array fixes multi-key priority by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    One(String),
    Many(Vec<String>),
}

impl SortSpec {
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        match self {
            SortSpec::One(entry) => std::slice::from_ref(entry).iter(),
            SortSpec::Many(entries) => entries.iter(),
        }
        .map(String::as_str)
    }
}

/// Parameter envelope for one data source.
///
/// On the wire every data source is addressed by name in an outer JSON
/// object, so envelopes for several sources coexist in one payload:
///
/// ```json
/// { "news": { "fields": { "title": "foo" }, "page": 2, "maxResults": 20 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    /// Raw per-field values, keyed by field name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Json>,
    /// 1-based page number; only effective together with `max_results`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

fn parse_sort_entry(entry: &str) -> Result<(&str, Direction), DataSourceError> {
    let (field, direction) = match entry.split_once(',') {
        Some((field, direction)) => {
            let direction = Direction::from_str(direction.trim()).map_err(|e| {
                DataSourceError::InvalidParameter {
                    field: "sort".to_string(),
                    message: e.to_string(),
                }
            })?;
            (field.trim(), direction)
        }
        None => (entry.trim(), Direction::Asc),
    };
    if field.is_empty() {
        return Err(DataSourceError::InvalidParameter {
            field: "sort".to_string(),
            message: format!("empty field name in sort entry \"{entry}\""),
        });
    }
    Ok((field, direction))
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A named set of filter fields over one driver.
///
/// The data source owns its fields and its driver; binding parameters
/// configures the fields, [`get_result`](DataSource::get_result) asks the
/// driver for a build pass. Results are cached until fields, parameters or
/// bounds change.
pub struct DataSource<T> {
    name: String,
    driver: Box<dyn Driver<T>>,
    fields: Vec<Box<dyn DataSourceField>>,
    first_result: u64,
    max_results: Option<u64>,
    parameters: Parameters,
    cached: Option<Arc<dyn DataSourceResult<T>>>,
}

impl<T> std::fmt::Debug for DataSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name)
            .field("driver_type", &self.driver.driver_type())
            .field("fields", &self.fields.len())
            .field("first_result", &self.first_result)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

impl<T> DataSource<T> {
    /// Create a data source. Names address the source in parameter
    /// envelopes, so only `[A-Za-z0-9_]` is accepted.
    pub fn new(name: impl Into<String>, driver: Box<dyn Driver<T>>) -> Result<Self, DataSourceError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(DataSourceError::Configuration(format!(
                "invalid data source name \"{name}\" (letters, digits and underscores only)"
            )));
        }
        Ok(Self {
            name,
            driver,
            fields: Vec::new(),
            first_result: 0,
            max_results: None,
            parameters: Parameters::default(),
            cached: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver_type(&self) -> &'static str {
        self.driver.driver_type()
    }

    /// Add a field of the given type, created through the driver's
    /// extensions.
    pub fn add_field(
        &mut self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
    ) -> Result<&mut Self, DataSourceError> {
        self.add_field_with(name, type_name, comparison, FieldOptions::default())
    }

    pub fn add_field_with(
        &mut self,
        name: &str,
        type_name: &str,
        comparison: Comparison,
        options: FieldOptions,
    ) -> Result<&mut Self, DataSourceError> {
        if self.fields.iter().any(|f| f.name() == name) {
            return Err(DataSourceError::DuplicateField(name.to_string()));
        }
        let field = self.driver.create_field(name, type_name, comparison, &options)?;
        self.fields.push(field);
        self.cached = None;
        Ok(self)
    }

    /// Add an externally built field. The field must have been created for
    /// this data source's driver; the driver rejects foreign fields when a
    /// result is built.
    pub fn add_custom_field(
        &mut self,
        field: Box<dyn DataSourceField>,
    ) -> Result<&mut Self, DataSourceError> {
        if self.fields.iter().any(|f| f.name() == field.name()) {
            return Err(DataSourceError::DuplicateField(field.name().to_string()));
        }
        self.fields.push(field);
        self.cached = None;
        Ok(self)
    }

    pub fn fields(&self) -> &[Box<dyn DataSourceField>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&dyn DataSourceField> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .map(|f| f.as_ref())
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut dyn DataSourceField> {
        self.cached = None;
        match self.fields.iter_mut().find(|f| f.name() == name) {
            Some(field) => Some(field.as_mut()),
            None => None,
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name() == name)
    }

    pub fn clear_fields(&mut self) -> &mut Self {
        self.fields.clear();
        self.cached = None;
        self
    }

    /// Offset of the first record, applied only when a maximum is set.
    /// A bound `page` parameter takes precedence.
    pub fn set_first_result(&mut self, first: u64) -> &mut Self {
        self.first_result = first;
        self.cached = None;
        self
    }

    /// Page size; `None` leaves results unbounded. A bound `maxResults`
    /// parameter takes precedence.
    pub fn set_max_results(&mut self, max: Option<u64>) -> &mut Self {
        self.max_results = max;
        self.cached = None;
        self
    }

    /// Bind a parameter envelope.
    ///
    /// `all` is the outer object keyed by data source name; entries for
    /// other sources are ignored. Every declared field is rebound: a field
    /// absent from the envelope is cleared, so stale values never leak into
    /// the next pass. Parameters for undeclared fields are skipped.
    pub fn bind_parameters(&mut self, all: &Json) -> Result<(), DataSourceError> {
        let parameters: Parameters = match all.get(&self.name) {
            Some(sub) => serde_json::from_value(sub.clone()).map_err(|e| {
                DataSourceError::Configuration(format!(
                    "malformed parameters for data source \"{}\": {e}",
                    self.name
                ))
            })?,
            None => Parameters::default(),
        };

        for field in &mut self.fields {
            let raw = parameters
                .fields
                .get(field.name())
                .cloned()
                .unwrap_or(Json::Null);
            field.bind_parameter(&raw)?;
            field.set_ordering(None);
        }
        for name in parameters.fields.keys() {
            if !self.fields.iter().any(|f| f.name() == name) {
                tracing::debug!(
                    datasource = %self.name,
                    field = %name,
                    "ignoring parameter for undeclared field"
                );
            }
        }

        if let Some(sort) = &parameters.sort {
            for (priority, entry) in sort.entries().enumerate() {
                let (field_name, direction) = parse_sort_entry(entry)?;
                match self.fields.iter_mut().find(|f| f.name() == field_name) {
                    Some(field) => field.set_ordering(Some(FieldOrdering {
                        direction,
                        priority: priority as u32,
                    })),
                    None => tracing::debug!(
                        datasource = %self.name,
                        field = %field_name,
                        "ignoring sort entry for undeclared field"
                    ),
                }
            }
        }

        self.parameters = parameters;
        self.cached = None;
        Ok(())
    }

    /// The bound envelope, keyed by this data source's name. Merging the
    /// envelopes of several sources yields one bindable payload.
    pub fn parameters(&self) -> Json {
        let mut outer = Map::new();
        outer.insert(
            self.name.clone(),
            serde_json::to_value(&self.parameters).unwrap_or(Json::Null),
        );
        Json::Object(outer)
    }

    /// Build (or return the cached) result for the current configuration.
    pub async fn get_result(&mut self) -> Result<Arc<dyn DataSourceResult<T>>, DataSourceError> {
        if let Some(cached) = &self.cached {
            tracing::debug!(datasource = %self.name, "returning cached result");
            return Ok(Arc::clone(cached));
        }

        let max = self.parameters.max_results.or(self.max_results);
        let first = match self.parameters.page {
            Some(page) => match max {
                Some(max) if page > 1 => (page - 1) * max,
                _ => 0,
            },
            None => self.first_result,
        };

        tracing::debug!(
            datasource = %self.name,
            driver = self.driver.driver_type(),
            fields = self.fields.len(),
            first,
            max = ?max,
            "building result"
        );
        let result = self.driver.get_result(&self.fields, first, max).await?;
        let result: Arc<dyn DataSourceResult<T>> = Arc::from(result);
        self.cached = Some(Arc::clone(&result));
        Ok(result)
    }
}
