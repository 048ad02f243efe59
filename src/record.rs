//! Runtime records bound to a schema descriptor.
//!
//! A [`Record`] is one row of a model: a column/value map validated against
//! the model's [`SchemaDescriptor`]. Repositories hand records out from read
//! operations and take them back for update/delete; the driver boundary
//! stages them for insertion and removal.

use std::collections::BTreeMap;

use sea_query::Value;

use crate::error::RepositoryError;
use crate::schema::SchemaDescriptor;

/// Field-name → value mapping used for filters, create data and update data.
pub type ValueMap = BTreeMap<String, Value>;

/// One row of a model, bound to its schema.
///
/// Construction through [`Record::from_values`] validates every key and value
/// type against the schema; rows coming back from a driver are bound without
/// re-validation via [`Record::from_row`] (the driver returned them for this
/// model's plan, so extra joined columns are carried along untouched).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: &'static SchemaDescriptor,
    columns: ValueMap,
}

impl Record {
    /// Build a record from caller-supplied data, validating against the schema.
    ///
    /// # Errors
    ///
    /// `DataValidation` when a key is not a field of the model or its value
    /// does not fit the field's declared type.
    pub fn from_values(
        schema: &'static SchemaDescriptor,
        data: &ValueMap,
    ) -> Result<Self, RepositoryError> {
        for (key, value) in data {
            check_field(schema, key, value)?;
        }
        Ok(Self {
            schema,
            columns: data.clone(),
        })
    }

    /// Bind a driver row to this schema without validation.
    pub fn from_row(schema: &'static SchemaDescriptor, row: ValueMap) -> Self {
        Self {
            schema,
            columns: row,
        }
    }

    /// The schema this record is bound to.
    pub fn schema(&self) -> &'static SchemaDescriptor {
        self.schema
    }

    /// Model name, for error messages.
    pub fn model(&self) -> &'static str {
        self.schema.model()
    }

    /// Value of a column, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.columns.get(field)
    }

    /// Set a field to a new value, validating name and type.
    ///
    /// # Errors
    ///
    /// `DataValidation` when the field is unknown or the value does not fit
    /// its declared type.
    pub fn set(&mut self, field: &str, value: Value) -> Result<(), RepositoryError> {
        check_field(self.schema, field, &value)?;
        self.columns.insert(field.to_string(), value);
        Ok(())
    }

    /// All columns of the record.
    pub fn columns(&self) -> &ValueMap {
        &self.columns
    }

    /// The primary key value, when the schema declares one and it is set.
    pub fn primary_key(&self) -> Option<&Value> {
        let pk = self.schema.primary_key()?;
        self.columns.get(pk.name())
    }
}

pub(crate) fn check_field(
    schema: &SchemaDescriptor,
    key: &str,
    value: &Value,
) -> Result<(), RepositoryError> {
    match schema.resolve_field(key) {
        None => Err(RepositoryError::DataValidation {
            details: format!("'{}' for model '{}'", key, schema.model()),
            original: String::new(),
        }),
        Some(field) if !field.field_type().accepts(value) => {
            Err(RepositoryError::DataValidation {
                details: format!("'{}' for model '{}'", key, schema.model()),
                original: format!(
                    "expected {} value, got {:?}",
                    field.field_type().name(),
                    value
                ),
            })
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldType};
    use once_cell::sync::Lazy;

    static SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
        SchemaDescriptor::builder("User", "users")
            .field(FieldDef::new("id", FieldType::Integer).primary_key().auto_increment())
            .field(FieldDef::new("name", FieldType::Text).unique())
            .field(FieldDef::new("position", FieldType::Text).nullable())
            .build()
    });

    fn values(pairs: &[(&str, Value)]) -> ValueMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_from_values_valid() {
        let record = Record::from_values(&SCHEMA, &values(&[("name", Value::from("amy"))]))
            .expect("valid record");
        assert_eq!(record.get("name"), Some(&Value::from("amy")));
        assert_eq!(record.model(), "User");
    }

    #[test]
    fn test_from_values_unknown_field() {
        let err = Record::from_values(&SCHEMA, &values(&[("nickname", Value::from("x"))]))
            .expect_err("unknown field");
        assert_eq!(
            err,
            RepositoryError::DataValidation {
                details: "'nickname' for model 'User'".to_string(),
                original: String::new(),
            }
        );
    }

    #[test]
    fn test_from_values_wrong_type() {
        let err = Record::from_values(&SCHEMA, &values(&[("name", Value::from(7))]))
            .expect_err("wrong type");
        match err {
            RepositoryError::DataValidation { details, original } => {
                assert_eq!(details, "'name' for model 'User'");
                assert!(original.contains("expected text value"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_set_validates() {
        let mut record =
            Record::from_values(&SCHEMA, &values(&[("name", Value::from("amy"))])).unwrap();
        record.set("position", Value::from("dev")).expect("valid set");
        assert!(record.set("unknown", Value::from("x")).is_err());
        assert!(record.set("name", Value::from(1)).is_err());
    }

    #[test]
    fn test_primary_key_value() {
        let mut record =
            Record::from_values(&SCHEMA, &values(&[("name", Value::from("amy"))])).unwrap();
        assert_eq!(record.primary_key(), None);
        record.set("id", Value::from(3)).unwrap();
        assert_eq!(record.primary_key(), Some(&Value::from(3)));
    }
}
