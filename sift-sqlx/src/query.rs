use sift_core::{Direction, ScalarValue};

/// SQL dialect, selecting the placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    /// Map `sqlx::Database::NAME` to a dialect.
    pub fn from_database_name(name: &str) -> Self {
        match name {
            "SQLite" => Dialect::Sqlite,
            "MySQL" => Dialect::MySql,
            "PostgreSQL" => Dialect::Postgres,
            _ => Dialect::Generic,
        }
    }
}

/// How the matching-row count is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountStrategy {
    /// `SELECT COUNT(*) FROM table alias WHERE ...` with the same
    /// restrictions. Correct for plain single-table templates.
    #[default]
    Plain,
    /// Wrap the unbounded select in a subquery and count its rows. Use for
    /// templates with joins that may fan out.
    Wrapped,
}

/// Comparison operators rendered as plain SQL binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Compare {
        column: String,
        op: CompareOp,
        value: ScalarValue,
    },
    Like {
        column: String,
        pattern: String,
    },
    In {
        column: String,
        values: Vec<ScalarValue>,
        negated: bool,
    },
    Between {
        column: String,
        from: ScalarValue,
        to: ScalarValue,
    },
    IsNull {
        column: String,
        negated: bool,
    },
}

/// Template SELECT over one aliased table.
///
/// Restrictions, sort keys and bounds accumulate; `build_select` and
/// `build_count` render the SQL with dialect placeholders and collect the
/// bind values in order. Identifiers are always validated against a
/// conservative pattern, so a hostile column name is a build error and
/// never reaches the SQL text. Unqualified columns are prefixed with the
/// table alias; a column containing `.` is taken as already qualified.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    alias: String,
    columns: Vec<String>,
    conditions: Vec<Condition>,
    order: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: alias.to_string(),
            columns: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            dialect: Dialect::Generic,
        }
    }

    /// Set the SQL dialect (affects placeholder style).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Columns of the select list, unqualified. Empty selects `alias.*`.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn and_where(&mut self, column: &str, op: CompareOp, value: ScalarValue) -> &mut Self {
        self.conditions.push(Condition::Compare {
            column: column.to_string(),
            op,
            value,
        });
        self
    }

    pub fn and_where_like(&mut self, column: &str, pattern: impl Into<String>) -> &mut Self {
        self.conditions.push(Condition::Like {
            column: column.to_string(),
            pattern: pattern.into(),
        });
        self
    }

    pub fn and_where_in(&mut self, column: &str, values: Vec<ScalarValue>) -> &mut Self {
        self.conditions.push(Condition::In {
            column: column.to_string(),
            values,
            negated: false,
        });
        self
    }

    pub fn and_where_not_in(&mut self, column: &str, values: Vec<ScalarValue>) -> &mut Self {
        self.conditions.push(Condition::In {
            column: column.to_string(),
            values,
            negated: true,
        });
        self
    }

    pub fn and_where_between(
        &mut self,
        column: &str,
        from: ScalarValue,
        to: ScalarValue,
    ) -> &mut Self {
        self.conditions.push(Condition::Between {
            column: column.to_string(),
            from,
            to,
        });
        self
    }

    pub fn and_where_null(&mut self, column: &str) -> &mut Self {
        self.conditions.push(Condition::IsNull {
            column: column.to_string(),
            negated: false,
        });
        self
    }

    pub fn and_where_not_null(&mut self, column: &str) -> &mut Self {
        self.conditions.push(Condition::IsNull {
            column: column.to_string(),
            negated: true,
        });
        self
    }

    /// Append a sort key; earlier keys take precedence.
    pub fn order_by(&mut self, column: &str, direction: Direction) -> &mut Self {
        self.order.push((column.to_string(), direction));
        self
    }

    pub fn set_max_results(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn set_first_result(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Render the page SELECT, returning `(sql, bind_values)`.
    pub fn build_select(&self) -> Result<(String, Vec<ScalarValue>), QueryError> {
        let mut sql = self.render_select_unbounded()?;
        let mut params = Vec::new();
        let mut placeholder_idx = 1usize;
        self.append_where(&mut sql, &mut params, &mut placeholder_idx)?;
        self.append_order(&mut sql)?;
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }
        Ok((sql, params))
    }

    /// Render the matching-row count, returning `(sql, bind_values)`.
    /// Pagination bounds and sort keys never apply to a count.
    pub fn build_count(&self, strategy: CountStrategy) -> Result<(String, Vec<ScalarValue>), QueryError> {
        let mut params = Vec::new();
        let mut placeholder_idx = 1usize;
        match strategy {
            CountStrategy::Plain => {
                let table = validate_identifier(&self.table, "table")?;
                let alias = validate_identifier(&self.alias, "alias")?;
                let mut sql = format!("SELECT COUNT(*) FROM {table} {alias}");
                self.append_where(&mut sql, &mut params, &mut placeholder_idx)?;
                Ok((sql, params))
            }
            CountStrategy::Wrapped => {
                let mut inner = self.render_select_unbounded()?;
                self.append_where(&mut inner, &mut params, &mut placeholder_idx)?;
                Ok((format!("SELECT COUNT(*) FROM ({inner}) AS count_sub"), params))
            }
        }
    }

    fn render_select_unbounded(&self) -> Result<String, QueryError> {
        let table = validate_identifier(&self.table, "table")?;
        let alias = validate_identifier(&self.alias, "alias")?;
        let columns = if self.columns.is_empty() {
            format!("{alias}.*")
        } else {
            let mut list = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                list.push(self.qualify(column)?);
            }
            list.join(", ")
        };
        Ok(format!("SELECT {columns} FROM {table} {alias}"))
    }

    fn append_where(
        &self,
        sql: &mut String,
        params: &mut Vec<ScalarValue>,
        placeholder_idx: &mut usize,
    ) -> Result<(), QueryError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        sql.push_str(" WHERE ");
        let mut first = true;
        for condition in &self.conditions {
            if !first {
                sql.push_str(" AND ");
            }
            first = false;
            match condition {
                Condition::Compare { column, op, value } => {
                    let column = self.qualify(column)?;
                    let placeholder = self.next_placeholder(placeholder_idx);
                    sql.push_str(&format!("{column} {} {placeholder}", op.as_sql()));
                    params.push(value.clone());
                }
                Condition::Like { column, pattern } => {
                    let column = self.qualify(column)?;
                    let placeholder = self.next_placeholder(placeholder_idx);
                    sql.push_str(&format!("{column} LIKE {placeholder}"));
                    params.push(ScalarValue::Str(pattern.clone()));
                }
                Condition::In {
                    column,
                    values,
                    negated,
                } => {
                    if values.is_empty() {
                        // IN () is not valid SQL; an empty list matches
                        // nothing, its negation everything
                        sql.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                        continue;
                    }
                    let column = self.qualify(column)?;
                    let placeholders: Vec<_> = values
                        .iter()
                        .map(|_| self.next_placeholder(placeholder_idx))
                        .collect();
                    let keyword = if *negated { "NOT IN" } else { "IN" };
                    sql.push_str(&format!(
                        "{column} {keyword} ({})",
                        placeholders.join(", ")
                    ));
                    params.extend(values.iter().cloned());
                }
                Condition::Between { column, from, to } => {
                    let column = self.qualify(column)?;
                    let low = self.next_placeholder(placeholder_idx);
                    let high = self.next_placeholder(placeholder_idx);
                    sql.push_str(&format!("{column} BETWEEN {low} AND {high}"));
                    params.push(from.clone());
                    params.push(to.clone());
                }
                Condition::IsNull { column, negated } => {
                    let column = self.qualify(column)?;
                    let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                    sql.push_str(&format!("{column} {keyword}"));
                }
            }
        }
        Ok(())
    }

    fn append_order(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        sql.push_str(" ORDER BY ");
        let mut clauses = Vec::with_capacity(self.order.len());
        for (column, direction) in &self.order {
            let column = self.qualify(column)?;
            let keyword = match direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            clauses.push(format!("{column} {keyword}"));
        }
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn next_placeholder(&self, index: &mut usize) -> String {
        let placeholder = self.dialect.placeholder(*index);
        *index += 1;
        placeholder
    }

    /// Alias-qualify an unqualified column; validate either way.
    fn qualify(&self, column: &str) -> Result<String, QueryError> {
        if column.contains('.') {
            validate_identifier(column, "column")?;
            Ok(column.to_string())
        } else {
            validate_identifier(column, "column")?;
            Ok(format!("{}.{column}", self.alias))
        }
    }
}

#[derive(Debug, Clone)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

fn validate_identifier<'a>(ident: &'a str, kind: &'static str) -> Result<&'a str, QueryError> {
    let valid = !ident.is_empty() && ident.split('.').all(is_valid_segment);
    if valid {
        Ok(ident)
    } else {
        Err(QueryError::InvalidIdentifier {
            kind,
            ident: ident.to_string(),
        })
    }
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let (sql, params) = QueryBuilder::new("news", "e").build_select().unwrap();
        assert_eq!(sql, "SELECT e.* FROM news e");
        assert!(params.is_empty());
    }

    #[test]
    fn test_columns_are_alias_qualified() {
        let (sql, _) = QueryBuilder::new("news", "n")
            .columns(&["id", "title"])
            .build_select()
            .unwrap();
        assert_eq!(sql, "SELECT n.id, n.title FROM news n");
    }

    #[test]
    fn test_conditions_collect_binds_in_order() {
        let mut query = QueryBuilder::new("news", "e");
        query
            .and_where("active", CompareOp::Eq, ScalarValue::Bool(true))
            .and_where_like("author", "%domain1.com%")
            .and_where_between("id", ScalarValue::Int(10), ScalarValue::Int(20));
        let (sql, params) = query.build_select().unwrap();
        assert_eq!(
            sql,
            "SELECT e.* FROM news e WHERE e.active = ? AND e.author LIKE ? AND e.id BETWEEN ? AND ?"
        );
        assert_eq!(
            params,
            vec![
                ScalarValue::Bool(true),
                ScalarValue::Str("%domain1.com%".into()),
                ScalarValue::Int(10),
                ScalarValue::Int(20),
            ]
        );
    }

    #[test]
    fn test_postgres_placeholders_count_through_lists() {
        let mut query = QueryBuilder::new("news", "e").dialect(Dialect::Postgres);
        query
            .and_where("active", CompareOp::Eq, ScalarValue::Bool(true))
            .and_where_in(
                "title",
                vec![ScalarValue::Str("a".into()), ScalarValue::Str("b".into())],
            );
        let (sql, _) = query.build_select().unwrap();
        assert_eq!(
            sql,
            "SELECT e.* FROM news e WHERE e.active = $1 AND e.title IN ($2, $3)"
        );
    }

    #[test]
    fn test_not_in_and_null_render_without_binds() {
        let mut query = QueryBuilder::new("news", "e");
        query
            .and_where_not_in("title", vec![ScalarValue::Str("t1".into())])
            .and_where_not_null("note");
        let (sql, params) = query.build_select().unwrap();
        assert_eq!(
            sql,
            "SELECT e.* FROM news e WHERE e.title NOT IN (?) AND e.note IS NOT NULL"
        );
        assert_eq!(params, vec![ScalarValue::Str("t1".into())]);
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let mut query = QueryBuilder::new("news", "e");
        query.and_where_in("title", Vec::new());
        let (sql, params) = query.build_select().unwrap();
        assert_eq!(sql, "SELECT e.* FROM news e WHERE 1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_order_limit_offset() {
        let mut query = QueryBuilder::new("news", "e");
        query
            .order_by("title", Direction::Desc)
            .order_by("id", Direction::Asc)
            .set_max_results(20)
            .set_first_result(40);
        let (sql, _) = query.build_select().unwrap();
        assert_eq!(
            sql,
            "SELECT e.* FROM news e ORDER BY e.title DESC, e.id ASC LIMIT 20 OFFSET 40"
        );
    }

    #[test]
    fn test_count_ignores_order_and_bounds() {
        let mut query = QueryBuilder::new("news", "e");
        query
            .and_where("active", CompareOp::Eq, ScalarValue::Bool(true))
            .order_by("title", Direction::Desc)
            .set_max_results(10)
            .set_first_result(50);
        let (sql, params) = query.build_count(CountStrategy::Plain).unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM news e WHERE e.active = ?");
        assert_eq!(params, vec![ScalarValue::Bool(true)]);
    }

    #[test]
    fn test_wrapped_count_subquery() {
        let mut query = QueryBuilder::new("news", "e").columns(&["id", "title"]);
        query.and_where("id", CompareOp::Gt, ScalarValue::Int(5));
        let (sql, params) = query.build_count(CountStrategy::Wrapped).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM (SELECT e.id, e.title FROM news e WHERE e.id > ?) AS count_sub"
        );
        assert_eq!(params, vec![ScalarValue::Int(5)]);
    }

    #[test]
    fn test_qualified_columns_pass_through() {
        let mut query = QueryBuilder::new("news", "e");
        query.and_where("meta.author", CompareOp::Eq, ScalarValue::Str("x".into()));
        let (sql, _) = query.build_select().unwrap();
        assert_eq!(sql, "SELECT e.* FROM news e WHERE meta.author = ?");
    }

    #[test]
    fn test_hostile_identifiers_are_rejected() {
        let err = QueryBuilder::new("news; DROP TABLE news", "e")
            .build_select()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { kind: "table", .. }));

        let mut query = QueryBuilder::new("news", "e");
        query.and_where("id = 1 OR 1", CompareOp::Eq, ScalarValue::Int(1));
        let err = query.build_select().unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { kind: "column", .. }));
    }
}
