//! Immutable query plans.
//!
//! A [`QueryPlan`] is the unexecuted representation of one read operation:
//! "select from model X, with joins J, filters F, order O, pagination P".
//! Plans are value types — progressively augmented by the building methods in
//! [`crate::query::build`], never partially executed, and rendered to SQL in
//! one place via SeaQuery.

use sea_query::{
    Asterisk, Expr, ExprTrait, Iden, Order, PostgresQueryBuilder, SelectStatement, Value, Values,
};

use crate::schema::SchemaDescriptor;

struct TableName(&'static str);

impl Iden for TableName {
    fn unquoted(&self) -> &str {
        self.0
    }
}

struct ColumnName(&'static str);

impl Iden for ColumnName {
    fn unquoted(&self) -> &str {
        self.0
    }
}

/// What the plan projects: full rows, a row count, or bare existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Rows,
    Count,
    Exists,
}

/// An eager-load instruction attached for one resolved relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub relation: &'static str,
    pub target_table: &'static str,
    pub local_column: &'static str,
    pub target_column: &'static str,
}

/// Resolved order-by: column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub column: &'static str,
    pub direction: OrderDirection,
}

/// Immutable, incrementally built, unexecuted representation of a read.
///
/// # Example
///
/// ```
/// use once_cell::sync::Lazy;
/// use quaymaster::query::QueryPlan;
/// use quaymaster::schema::{FieldDef, FieldType, SchemaDescriptor};
///
/// static SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
///     SchemaDescriptor::builder("User", "users")
///         .field(FieldDef::new("id", FieldType::Integer).primary_key())
///         .field(FieldDef::new("name", FieldType::Text))
///         .build()
/// });
///
/// let plan = QueryPlan::select(&SCHEMA).with_order_by(Some("name"))?;
/// let (sql, _values) = plan.to_sql();
/// assert!(sql.contains(r#"ORDER BY "name" ASC"#));
/// # Ok::<(), quaymaster::RepositoryError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    schema: &'static SchemaDescriptor,
    projection: Projection,
    joins: Vec<JoinSpec>,
    filters: Vec<(&'static str, Value)>,
    order_by: Option<OrderSpec>,
    skip: Option<u64>,
    limit: Option<u64>,
}

impl QueryPlan {
    /// Base plan selecting full rows of the model.
    pub fn select(schema: &'static SchemaDescriptor) -> Self {
        Self::with_projection(schema, Projection::Rows)
    }

    /// Base plan projecting a row count.
    pub fn count(schema: &'static SchemaDescriptor) -> Self {
        Self::with_projection(schema, Projection::Count)
    }

    /// Base plan projecting bare existence.
    pub fn exists(schema: &'static SchemaDescriptor) -> Self {
        Self::with_projection(schema, Projection::Exists)
    }

    fn with_projection(schema: &'static SchemaDescriptor, projection: Projection) -> Self {
        Self {
            schema,
            projection,
            joins: Vec::new(),
            filters: Vec::new(),
            order_by: None,
            skip: None,
            limit: None,
        }
    }

    pub fn schema(&self) -> &'static SchemaDescriptor {
        self.schema
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    /// Conjunctive equality predicates, in attachment order.
    pub fn filters(&self) -> &[(&'static str, Value)] {
        &self.filters
    }

    pub fn order_by(&self) -> Option<&OrderSpec> {
        self.order_by.as_ref()
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub(crate) fn push_join(&mut self, join: JoinSpec) {
        self.joins.push(join);
    }

    pub(crate) fn push_filter(&mut self, column: &'static str, value: Value) {
        self.filters.push((column, value));
    }

    pub(crate) fn set_order_by(&mut self, order: OrderSpec) {
        self.order_by = Some(order);
    }

    pub(crate) fn set_skip(&mut self, skip: u64) {
        self.skip = Some(skip);
    }

    pub(crate) fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    /// Render the plan to a parameterized Postgres statement.
    ///
    /// Building never touches a session; this is the only place plan state
    /// becomes SQL text.
    pub fn to_sql(&self) -> (String, Values) {
        let table = self.schema.table();
        let mut stmt = SelectStatement::default();
        match self.projection {
            Projection::Rows => {
                stmt.column(Asterisk);
            }
            Projection::Count => {
                stmt.expr(Expr::cust("COUNT(*)"));
            }
            Projection::Exists => {
                stmt.expr(Expr::cust("1"));
            }
        }
        stmt.from(TableName(table));

        for join in &self.joins {
            stmt.join(
                sea_query::JoinType::LeftJoin,
                TableName(join.target_table),
                Expr::cust(format!(
                    "{}.{} = {}.{}",
                    table, join.local_column, join.target_table, join.target_column
                )),
            );
        }

        for (column, value) in &self.filters {
            stmt.and_where(Expr::col((TableName(table), ColumnName(column))).eq(value.clone()));
        }

        if let Some(order) = &self.order_by {
            let direction = match order.direction {
                OrderDirection::Asc => Order::Asc,
                OrderDirection::Desc => Order::Desc,
            };
            stmt.order_by(ColumnName(order.column), direction);
        }

        match self.projection {
            Projection::Exists => {
                stmt.limit(1);
            }
            _ => {
                if let Some(limit) = self.limit {
                    stmt.limit(limit);
                }
                if let Some(skip) = self.skip {
                    stmt.offset(skip);
                }
            }
        }

        stmt.build(PostgresQueryBuilder)
    }
}
