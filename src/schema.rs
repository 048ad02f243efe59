//! Schema descriptors for repository models.
//!
//! A [`SchemaDescriptor`] is the closed set of known fields and relations for
//! one model: built once at registration time, immutable afterwards, and
//! shared read-only by every repository operation. Field and relation lookup
//! is exact-name only; there is no fuzzy matching and no call-time
//! reflection over an open-ended object.
//!
//! Descriptors are typically registered as `Lazy` statics:
//!
//! ```
//! use once_cell::sync::Lazy;
//! use quaymaster::schema::{FieldDef, FieldType, RelationDef, SchemaDescriptor};
//!
//! static USER_SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
//!     SchemaDescriptor::builder("User", "users")
//!         .field(FieldDef::new("id", FieldType::Integer).primary_key().auto_increment())
//!         .field(FieldDef::new("name", FieldType::Text).unique())
//!         .field(FieldDef::new("position", FieldType::Text).nullable())
//!         .relation(RelationDef::new("profile", "profiles", "id", "user_id"))
//!         .build()
//! });
//!
//! assert!(USER_SCHEMA.resolve_field("name").is_some());
//! assert!(USER_SCHEMA.resolve_field("Name").is_none());
//! assert!(USER_SCHEMA.resolve_relation("profile").is_some());
//! ```

use sea_query::Value;

/// Storage type of a model field.
///
/// Used to validate values handed to `create`/`update` before anything is
/// staged, and by the JSON binding layer to type raw transport input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Integer,
    BigInteger,
    Float,
    Double,
    Text,
    Uuid,
    DateTimeUtc,
    Json,
}

impl FieldType {
    /// Whether `value` is acceptable for a column of this type.
    ///
    /// Null values are accepted here; nullability is enforced separately
    /// against [`FieldDef::nullable`].
    pub fn accepts(&self, value: &Value) -> bool {
        if value_is_null(value) {
            return true;
        }
        match self {
            FieldType::Bool => matches!(value, Value::Bool(_)),
            FieldType::Integer => matches!(
                value,
                Value::TinyInt(_)
                    | Value::SmallInt(_)
                    | Value::Int(_)
                    | Value::TinyUnsigned(_)
                    | Value::SmallUnsigned(_)
            ),
            FieldType::BigInteger => matches!(
                value,
                Value::TinyInt(_)
                    | Value::SmallInt(_)
                    | Value::Int(_)
                    | Value::BigInt(_)
                    | Value::TinyUnsigned(_)
                    | Value::SmallUnsigned(_)
                    | Value::Unsigned(_)
                    | Value::BigUnsigned(_)
            ),
            FieldType::Float => matches!(value, Value::Float(_)),
            FieldType::Double => matches!(value, Value::Float(_) | Value::Double(_)),
            FieldType::Text => matches!(value, Value::String(_)),
            FieldType::Uuid => matches!(value, Value::Uuid(_)),
            FieldType::DateTimeUtc => matches!(value, Value::ChronoDateTimeUtc(_)),
            FieldType::Json => matches!(value, Value::Json(_)),
        }
    }

    /// Human-readable type name for error details.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Integer => "integer",
            FieldType::BigInteger => "big integer",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Text => "text",
            FieldType::Uuid => "uuid",
            FieldType::DateTimeUtc => "timestamptz",
            FieldType::Json => "json",
        }
    }
}

pub(crate) fn value_is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::Uuid(None)
            | Value::ChronoDateTimeUtc(None)
    )
}

/// One queryable field of a model.
///
/// The field name is the column name; the flags mirror the column metadata a
/// driver would enforce (nullable, unique, primary key, auto-increment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    name: &'static str,
    field_type: FieldType,
    nullable: bool,
    unique: bool,
    primary_key: bool,
    auto_increment: bool,
}

impl FieldDef {
    /// Define a non-nullable, non-unique field.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            nullable: false,
            unique: false,
            primary_key: false,
            auto_increment: false,
        }
    }

    /// Mark the field nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the field unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark the field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark the field auto-incrementing (the driver assigns its value).
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }
}

/// One joinable relation of a model.
///
/// Joins render as `LEFT JOIN target ON local.local_column = target.target_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    name: &'static str,
    target_table: &'static str,
    local_column: &'static str,
    target_column: &'static str,
}

impl RelationDef {
    pub fn new(
        name: &'static str,
        target_table: &'static str,
        local_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            name,
            target_table,
            local_column,
            target_column,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn target_table(&self) -> &'static str {
        self.target_table
    }

    pub fn local_column(&self) -> &'static str {
        self.local_column
    }

    pub fn target_column(&self) -> &'static str {
        self.target_column
    }
}

/// The closed set of known fields and relations for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    model: &'static str,
    table: &'static str,
    fields: Vec<FieldDef>,
    relations: Vec<RelationDef>,
}

impl SchemaDescriptor {
    /// Start building a descriptor for `model` stored in `table`.
    pub fn builder(model: &'static str, table: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            model,
            table,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Model name used in error messages.
    pub fn model(&self) -> &'static str {
        self.model
    }

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Resolve a field by exact name.
    pub fn resolve_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a relation by exact name.
    pub fn resolve_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }

    /// The primary key field, if one was declared.
    pub fn primary_key(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.primary_key)
    }
}

/// Builder returned by [`SchemaDescriptor::builder`].
pub struct SchemaBuilder {
    model: &'static str,
    table: &'static str,
    fields: Vec<FieldDef>,
    relations: Vec<RelationDef>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn build(self) -> SchemaDescriptor {
        SchemaDescriptor {
            model: self.model,
            table: self.table,
            fields: self.fields,
            relations: self.relations,
        }
    }
}
