//! Shared fixtures: User/Profile schemas, their repositories and an
//! in-memory storage factory.

#![allow(dead_code)]

use once_cell::sync::Lazy;
use quaymaster::driver::memory::MemoryStorage;
use quaymaster::schema::{FieldDef, FieldType, RelationDef, SchemaDescriptor};
use quaymaster::{UnitOfWork, ValueMap};
use sea_query::Value;

pub use quaymaster::repository::{Creator, Deleter, Reader, RepositoryDef, Updater};

pub static USER_SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
    SchemaDescriptor::builder("User", "users")
        .field(FieldDef::new("id", FieldType::Integer).primary_key().auto_increment())
        .field(FieldDef::new("name", FieldType::Text).unique())
        .field(FieldDef::new("position", FieldType::Text).nullable())
        .relation(RelationDef::new("profile", "profiles", "id", "user_id"))
        .build()
});

pub static PROFILE_SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
    SchemaDescriptor::builder("Profile", "profiles")
        .field(FieldDef::new("id", FieldType::Integer).primary_key().auto_increment())
        .field(FieldDef::new("user_id", FieldType::Integer).unique())
        .field(FieldDef::new("bio", FieldType::Text).nullable())
        .relation(RelationDef::new("user", "users", "user_id", "id"))
        .build()
});

pub struct UserRepository;

impl RepositoryDef for UserRepository {
    fn schema(&self) -> Option<&'static SchemaDescriptor> {
        Some(&USER_SCHEMA)
    }
    fn repository_name(&self) -> &'static str {
        "UserRepository"
    }
}

impl Creator for UserRepository {}
impl Reader for UserRepository {}
impl Updater for UserRepository {}
impl Deleter for UserRepository {}

pub struct ProfileRepository;

impl RepositoryDef for ProfileRepository {
    fn schema(&self) -> Option<&'static SchemaDescriptor> {
        Some(&PROFILE_SCHEMA)
    }
    fn repository_name(&self) -> &'static str {
        "ProfileRepository"
    }
}

impl Creator for ProfileRepository {}
impl Reader for ProfileRepository {}

/// Repository without a declared model, for usage-error coverage.
pub struct BrokenRepository;

impl RepositoryDef for BrokenRepository {
    fn schema(&self) -> Option<&'static SchemaDescriptor> {
        None
    }
    fn repository_name(&self) -> &'static str {
        "BrokenRepository"
    }
}

impl Creator for BrokenRepository {}
impl Reader for BrokenRepository {}

pub fn storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.register(&USER_SCHEMA);
    storage.register(&PROFILE_SCHEMA);
    storage
}

pub fn values(pairs: &[(&str, Value)]) -> ValueMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn user_data(name: &str) -> ValueMap {
    values(&[("name", Value::from(name))])
}

/// Create and commit one user per name.
pub fn seed_users(storage: &MemoryStorage, names: &[&str]) {
    UnitOfWork::run(storage, |session| {
        for name in names {
            UserRepository.create(session, &user_data(name))?;
        }
        Ok(())
    })
    .expect("seeding users");
}
