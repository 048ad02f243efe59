//! In-memory driver for tests and prototyping.
//!
//! [`MemoryStorage`] keeps registered tables in process memory and hands out
//! sessions that interpret query plans directly: equality filters, ordering,
//! offset/limit and the count/exists projections behave like their SQL
//! renderings. Commit applies staged work atomically, assigns auto-increment
//! keys and enforces unique and not-null constraints, reporting the same
//! fault shapes a SQL driver would.
//!
//! The factory also keeps per-storage call counters and accepts injected
//! faults, which makes it double as the session spy the test-suite uses to
//! assert that classification errors are raised before any I/O.
//!
//! Staged work is invisible to reads until commit.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use sea_query::Value;

use crate::driver::{ConstraintKind, DriverFault, Session, SessionFactory};
use crate::query::{Projection, QueryPlan};
use crate::record::{Record, ValueMap};
use crate::schema::{value_is_null, FieldType, SchemaDescriptor};

/// Call counters kept by a [`MemoryStorage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub executes: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub closes: usize,
}

struct Table {
    rows: Vec<ValueMap>,
    next_key: i64,
}

#[derive(Default)]
struct State {
    tables: BTreeMap<&'static str, Table>,
    stats: Stats,
    fail_next_execute: Option<DriverFault>,
    fail_next_commit: Option<DriverFault>,
}

/// Shared in-memory storage; implements [`SessionFactory`].
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table for `schema`. Replaces any existing rows.
    pub fn register(&self, schema: &'static SchemaDescriptor) {
        self.lock().tables.insert(
            schema.table(),
            Table {
                rows: Vec::new(),
                next_key: 1,
            },
        );
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> Stats {
        self.lock().stats
    }

    /// Committed rows of `table`, for test assertions.
    pub fn rows(&self, table: &str) -> Vec<ValueMap> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Make the next `execute` call fail with `fault`.
    pub fn fail_next_execute(&self, fault: DriverFault) {
        self.lock().fail_next_execute = Some(fault);
    }

    /// Make the next `commit` call fail with `fault`.
    pub fn fail_next_commit(&self, fault: DriverFault) {
        self.lock().fail_next_commit = Some(fault);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked; the state
        // itself is still consistent enough to inspect.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionFactory for MemoryStorage {
    fn open_session(&self) -> Result<Box<dyn Session>, DriverFault> {
        Ok(Box::new(MemorySession {
            storage: self.clone(),
            staged: RefCell::new(Staged::default()),
        }))
    }
}

#[derive(Default)]
struct Staged {
    inserts: Vec<Record>,
    deletes: Vec<Record>,
}

/// One session against a [`MemoryStorage`].
pub struct MemorySession {
    storage: MemoryStorage,
    staged: RefCell<Staged>,
}

impl Session for MemorySession {
    fn execute(&self, plan: &QueryPlan) -> Result<Vec<ValueMap>, DriverFault> {
        let mut state = self.storage.lock();
        state.stats.executes += 1;
        if let Some(fault) = state.fail_next_execute.take() {
            return Err(fault);
        }

        for join in plan.joins() {
            if !state.tables.contains_key(join.target_table) {
                return Err(DriverFault::Statement(format!(
                    "relation \"{}\" does not exist",
                    join.target_table
                )));
            }
        }

        let table = state.tables.get(plan.schema().table()).ok_or_else(|| {
            DriverFault::Statement(format!(
                "relation \"{}\" does not exist",
                plan.schema().table()
            ))
        })?;

        let mut rows: Vec<ValueMap> = table
            .rows
            .iter()
            .filter(|row| {
                plan.filters()
                    .iter()
                    .all(|(column, value)| row.get(*column) == Some(value))
            })
            .cloned()
            .collect();

        if let Some(order) = plan.order_by() {
            rows.sort_by(|a, b| cmp_row_values(a.get(order.column), b.get(order.column)));
            if order.direction == crate::query::OrderDirection::Desc {
                rows.reverse();
            }
        }

        match plan.projection() {
            Projection::Rows => {
                let skip = plan.skip().unwrap_or(0) as usize;
                let rows: Vec<ValueMap> = rows.into_iter().skip(skip).collect();
                Ok(match plan.limit() {
                    Some(limit) => rows.into_iter().take(limit as usize).collect(),
                    None => rows,
                })
            }
            Projection::Count => {
                let mut row = ValueMap::new();
                row.insert("count".to_string(), Value::BigInt(Some(rows.len() as i64)));
                Ok(vec![row])
            }
            Projection::Exists => {
                if rows.is_empty() {
                    Ok(Vec::new())
                } else {
                    let mut row = ValueMap::new();
                    row.insert("exists".to_string(), Value::Bool(Some(true)));
                    Ok(vec![row])
                }
            }
        }
    }

    fn add(&self, record: &Record) {
        self.staged.borrow_mut().inserts.push(record.clone());
    }

    fn remove(&self, record: &Record) {
        self.staged.borrow_mut().deletes.push(record.clone());
    }

    fn commit(&self) -> Result<(), DriverFault> {
        let staged = std::mem::take(&mut *self.staged.borrow_mut());
        let mut state = self.storage.lock();
        state.stats.commits += 1;
        if let Some(fault) = state.fail_next_commit.take() {
            return Err(fault);
        }

        // Stage against scratch copies first so a constraint fault leaves
        // the committed tables untouched.
        let mut scratch: BTreeMap<&'static str, (Vec<ValueMap>, i64)> = BTreeMap::new();
        for record in &staged.inserts {
            let table_name = record.schema().table();
            if !state.tables.contains_key(table_name) {
                return Err(DriverFault::Statement(format!(
                    "relation \"{table_name}\" does not exist"
                )));
            }
            if !scratch.contains_key(table_name) {
                let table = &state.tables[table_name];
                scratch.insert(table_name, (table.rows.clone(), table.next_key));
            }
            let (rows, next_key) = match scratch.get_mut(table_name) {
                Some(entry) => entry,
                None => continue,
            };
            let row = insert_row(record, rows, next_key)?;
            rows.push(row);
        }
        for record in &staged.deletes {
            let table_name = record.schema().table();
            if !scratch.contains_key(table_name) {
                let Some(table) = state.tables.get(table_name) else {
                    return Err(DriverFault::Statement(format!(
                        "relation \"{table_name}\" does not exist"
                    )));
                };
                scratch.insert(table_name, (table.rows.clone(), table.next_key));
            }
            if let Some((rows, _)) = scratch.get_mut(table_name) {
                delete_rows(record, rows);
            }
        }

        for (table_name, (rows, next_key)) in scratch {
            if let Some(table) = state.tables.get_mut(table_name) {
                table.rows = rows;
                table.next_key = next_key;
            }
        }
        Ok(())
    }

    fn rollback(&self) {
        *self.staged.borrow_mut() = Staged::default();
        self.storage.lock().stats.rollbacks += 1;
    }

    fn close(&self) {
        self.storage.lock().stats.closes += 1;
    }
}

fn insert_row(
    record: &Record,
    existing: &[ValueMap],
    next_key: &mut i64,
) -> Result<ValueMap, DriverFault> {
    let schema = record.schema();
    let mut row = record.columns().clone();

    for field in schema.fields() {
        let current = row.get(field.name());
        let is_missing = current.map_or(true, value_is_null);

        if is_missing && field.is_auto_increment() {
            let key = *next_key;
            *next_key += 1;
            let value = match field.field_type() {
                FieldType::BigInteger => Value::BigInt(Some(key)),
                _ => Value::Int(Some(key as i32)),
            };
            row.insert(field.name().to_string(), value);
            continue;
        }

        if is_missing && !field.is_nullable() {
            return Err(DriverFault::Data(format!(
                "null value in column \"{}\" violates not-null constraint",
                field.name()
            )));
        }

        if field.is_unique() && !is_missing {
            let value = row.get(field.name()).cloned();
            let clash = existing
                .iter()
                .any(|other| other.get(field.name()) == value.as_ref());
            if clash {
                return Err(DriverFault::Integrity {
                    constraint: Some(ConstraintKind::Unique),
                    message: format!(
                        "duplicate key value violates unique constraint \"{}_{}_key\"",
                        schema.table(),
                        field.name()
                    ),
                });
            }
        }

        // Keep an explicit primary key ahead of the allocator.
        if field.is_primary_key() && !is_missing {
            if let Some(key) = row.get(field.name()).and_then(int_of) {
                if key >= i128::from(*next_key) {
                    *next_key = (key + 1) as i64;
                }
            }
        }
    }

    Ok(row)
}

fn delete_rows(record: &Record, rows: &mut Vec<ValueMap>) {
    match record.primary_key() {
        Some(key) => {
            let pk_name = match record.schema().primary_key() {
                Some(pk) => pk.name(),
                None => return,
            };
            rows.retain(|row| row.get(pk_name) != Some(key));
        }
        None => {
            // No key on the record: fall back to whole-column equality.
            rows.retain(|row| {
                !record
                    .columns()
                    .iter()
                    .all(|(column, value)| row.get(column) == Some(value))
            });
        }
    }
}

fn cmp_row_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => cmp_values(a, b),
    }
}

fn cmp_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    if let (Some(a), Some(b)) = (int_of(a), int_of(b)) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (float_of(a), float_of(b)) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    match (a, b) {
        (Value::String(Some(a)), Value::String(Some(b))) => a.cmp(b),
        (Value::Bool(Some(a)), Value::Bool(Some(b))) => a.cmp(b),
        (Value::Uuid(Some(a)), Value::Uuid(Some(b))) => a.cmp(b),
        (Value::ChronoDateTimeUtc(Some(a)), Value::ChronoDateTimeUtc(Some(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn int_of(value: &Value) -> Option<i128> {
    match value {
        Value::TinyInt(Some(v)) => Some(i128::from(*v)),
        Value::SmallInt(Some(v)) => Some(i128::from(*v)),
        Value::Int(Some(v)) => Some(i128::from(*v)),
        Value::BigInt(Some(v)) => Some(i128::from(*v)),
        Value::TinyUnsigned(Some(v)) => Some(i128::from(*v)),
        Value::SmallUnsigned(Some(v)) => Some(i128::from(*v)),
        Value::Unsigned(Some(v)) => Some(i128::from(*v)),
        Value::BigUnsigned(Some(v)) => Some(i128::from(*v)),
        _ => None,
    }
}

fn float_of(value: &Value) -> Option<f64> {
    match value {
        Value::Float(Some(v)) => Some(f64::from(*v)),
        Value::Double(Some(v)) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
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

    fn storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.register(&SCHEMA);
        storage
    }

    fn stage_user(session: &dyn Session, name: &str) {
        let record =
            Record::from_values(&SCHEMA, &values(&[("name", Value::from(name))])).unwrap();
        session.add(&record);
    }

    #[test]
    fn test_commit_assigns_auto_increment_keys() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        stage_user(session.as_ref(), "amy");
        stage_user(session.as_ref(), "bob");
        session.commit().unwrap();

        let rows = storage.rows("users");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(Some(1))));
        assert_eq!(rows[1].get("id"), Some(&Value::Int(Some(2))));
    }

    #[test]
    fn test_commit_unique_violation_keeps_tables_untouched() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        stage_user(session.as_ref(), "amy");
        session.commit().unwrap();

        let session = storage.open_session().unwrap();
        stage_user(session.as_ref(), "zed");
        stage_user(session.as_ref(), "amy");
        let fault = session.commit().expect_err("duplicate name");
        assert!(matches!(
            fault,
            DriverFault::Integrity {
                constraint: Some(ConstraintKind::Unique),
                ..
            }
        ));
        // The whole staged batch is discarded, including the valid row.
        assert_eq!(storage.rows("users").len(), 1);
    }

    #[test]
    fn test_commit_not_null_violation() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        let record = Record::from_values(&SCHEMA, &values(&[("position", Value::from("dev"))]))
            .unwrap();
        session.add(&record);
        let fault = session.commit().expect_err("name is required");
        assert!(matches!(fault, DriverFault::Data(message) if message.contains("name")));
    }

    #[test]
    fn test_rollback_discards_staged_rows() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        stage_user(session.as_ref(), "amy");
        session.rollback();
        session.commit().unwrap();
        assert!(storage.rows("users").is_empty());
    }

    #[test]
    fn test_execute_filters_and_orders() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        for name in ["zed", "amy", "bob"] {
            stage_user(session.as_ref(), name);
        }
        session.commit().unwrap();

        let plan = QueryPlan::select(&SCHEMA).with_order_by(Some("name")).unwrap();
        let rows = session.execute(&plan).unwrap();
        let names: Vec<_> = rows
            .iter()
            .map(|row| row.get("name").cloned().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![Value::from("amy"), Value::from("bob"), Value::from("zed")]
        );

        let plan = QueryPlan::select(&SCHEMA)
            .with_filters(Some(&values(&[("name", Value::from("bob"))])))
            .unwrap();
        assert_eq!(session.execute(&plan).unwrap().len(), 1);
    }

    #[test]
    fn test_execute_count_and_exists_projections() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        stage_user(session.as_ref(), "amy");
        session.commit().unwrap();

        let count_plan = QueryPlan::count(&SCHEMA);
        let rows = session.execute(&count_plan).unwrap();
        assert_eq!(rows[0].get("count"), Some(&Value::BigInt(Some(1))));

        let exists_plan = QueryPlan::exists(&SCHEMA)
            .with_filters(Some(&values(&[("name", Value::from("nobody"))])))
            .unwrap();
        assert!(session.execute(&exists_plan).unwrap().is_empty());
    }

    #[test]
    fn test_delete_by_primary_key() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        stage_user(session.as_ref(), "amy");
        session.commit().unwrap();

        let row = storage.rows("users").remove(0);
        let record = Record::from_row(&SCHEMA, row);
        let session = storage.open_session().unwrap();
        session.remove(&record);
        session.commit().unwrap();
        assert!(storage.rows("users").is_empty());
    }

    #[test]
    fn test_injected_faults_fire_once() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        storage.fail_next_execute(DriverFault::Statement("bad cast".to_string()));
        let plan = QueryPlan::select(&SCHEMA);
        assert!(session.execute(&plan).is_err());
        assert!(session.execute(&plan).is_ok());
    }

    #[test]
    fn test_stats_track_session_calls() {
        let storage = storage();
        let session = storage.open_session().unwrap();
        session.execute(&QueryPlan::select(&SCHEMA)).unwrap();
        session.commit().unwrap();
        session.close();
        assert_eq!(
            storage.stats(),
            Stats {
                executes: 1,
                commits: 1,
                rollbacks: 0,
                closes: 1,
            }
        );
    }
}
