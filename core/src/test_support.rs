//! Shared fixtures for the unit tests: a couple of small entities with
//! hand-built column models, and a recording executor that stands in for the
//! relational layer.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    executor::{AsyncStatementExecutor, ExecutionError, StatementExecutor},
    model::{BulkEntity, ColumnDescriptor, EntityColumnModel, ModelDefinitionError},
    value::SqlValue,
};

pub(crate) struct Item {
    pub id: i64,
    pub name: String,
    pub quantity: i32,
}

impl BulkEntity for Item {
    fn column_model() -> Result<EntityColumnModel<Self>, ModelDefinitionError> {
        EntityColumnModel::builder("items")
            .primary_key(
                ColumnDescriptor::new("id", |item: &Item| SqlValue::from(item.id))
                    .generated_on_insert()
                    .with_setter(|item, value| {
                        if let Some(id) = value.as_i64() {
                            item.id = id;
                        }
                    }),
            )
            .column(ColumnDescriptor::new("name", |item: &Item| SqlValue::from(item.name.clone())))
            .column(ColumnDescriptor::new("quantity", |item: &Item| SqlValue::from(item.quantity)))
            .build()
    }
}

pub(crate) fn item_model() -> EntityColumnModel<Item> {
    Item::column_model().unwrap()
}

pub(crate) struct TaggedItem {
    pub tag: String,
    pub name: Option<String>,
}

pub(crate) fn tagged_item_model() -> EntityColumnModel<TaggedItem> {
    EntityColumnModel::builder("tagged_items")
        .primary_key(ColumnDescriptor::new("tag", |item: &TaggedItem| {
            SqlValue::from(item.tag.clone())
        }))
        .column(ColumnDescriptor::new("name", |item: &TaggedItem| SqlValue::from(item.name.clone())))
        .build()
        .unwrap()
}

pub(crate) struct Employee {
    pub id: i64,
    pub name: String,
    pub salary: rust_decimal::Decimal,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub title: String,
    pub city: String,
    pub active: bool,
    pub years: i32,
}

pub(crate) const EMPLOYEE_MUTABLE_COLUMNS: &[&str] =
    &["name", "salary", "email", "phone", "department", "title", "city", "active", "years"];

impl BulkEntity for Employee {
    fn column_model() -> Result<EntityColumnModel<Self>, ModelDefinitionError> {
        EntityColumnModel::builder("employees")
            .primary_key(
                ColumnDescriptor::new("id", |e: &Employee| SqlValue::from(e.id))
                    .generated_on_insert()
                    .with_setter(|e, value| {
                        if let Some(id) = value.as_i64() {
                            e.id = id;
                        }
                    }),
            )
            .column(ColumnDescriptor::new("name", |e: &Employee| SqlValue::from(e.name.clone())))
            .column(ColumnDescriptor::new("salary", |e: &Employee| SqlValue::from(e.salary)))
            .column(ColumnDescriptor::new("email", |e: &Employee| SqlValue::from(e.email.clone())))
            .column(ColumnDescriptor::new("phone", |e: &Employee| SqlValue::from(e.phone.clone())))
            .column(ColumnDescriptor::new("department", |e: &Employee| {
                SqlValue::from(e.department.clone())
            }))
            .column(ColumnDescriptor::new("title", |e: &Employee| SqlValue::from(e.title.clone())))
            .column(ColumnDescriptor::new("city", |e: &Employee| SqlValue::from(e.city.clone())))
            .column(ColumnDescriptor::new("active", |e: &Employee| SqlValue::from(e.active)))
            .column(ColumnDescriptor::new("years", |e: &Employee| SqlValue::from(e.years)))
            .build()
    }
}

pub(crate) fn employee_model() -> EntityColumnModel<Employee> {
    Employee::column_model().unwrap()
}

pub(crate) fn sample_employee(id: i64) -> Employee {
    Employee {
        id,
        name: format!("employee-{}", id),
        salary: rust_decimal::Decimal::new(1000, 0),
        email: format!("e{}@example.com", id),
        phone: "555-0100".to_string(),
        department: "engineering".to_string(),
        title: "engineer".to_string(),
        city: "berlin".to_string(),
        active: true,
        years: 3,
    }
}

/// An executor that records every statement and hands back scripted results.
/// Row counts and key-batch sizes are queued up front so a test fails loudly
/// when the engine issues more statements than expected.
pub(crate) struct MockExecutor {
    provider: String,
    rows: Mutex<VecDeque<u64>>,
    key_batches: Mutex<VecDeque<u64>>,
    next_key: AtomicI64,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub query: String,
    pub parameters: Vec<SqlValue>,
}

impl MockExecutor {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            rows: Mutex::new(VecDeque::new()),
            key_batches: Mutex::new(VecDeque::new()),
            next_key: AtomicI64::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_rows(&self, counts: impl IntoIterator<Item = u64>) {
        self.rows.lock().unwrap().extend(counts);
    }

    pub fn queue_key_batches(&self, counts: impl IntoIterator<Item = u64>) {
        self.key_batches.lock().unwrap().extend(counts);
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn recorded_queries(&self) -> Vec<String> {
        self.recorded_calls().into_iter().map(|call| call.query).collect()
    }

    fn record(&self, query: &str, parameters: &[SqlValue]) {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall { query: query.to_string(), parameters: parameters.to_vec() });
    }

    fn run(&self, query: &str, parameters: &[SqlValue]) -> Result<u64, ExecutionError> {
        self.record(query, parameters);
        self.rows
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ExecutionError::new("no scripted row count left for execute"))
    }

    fn run_keys(&self, query: &str, parameters: &[SqlValue]) -> Result<Vec<SqlValue>, ExecutionError> {
        self.record(query, parameters);
        let count = self
            .key_batches
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ExecutionError::new("no scripted key batch left for query_keys"))?;

        let start = self.next_key.fetch_add(count as i64, Ordering::SeqCst);
        Ok((start..start + count as i64).map(SqlValue::I64).collect())
    }
}

impl StatementExecutor for MockExecutor {
    fn provider_id(&self) -> &str {
        &self.provider
    }

    fn execute(&self, query: &str, parameters: &[SqlValue]) -> Result<u64, ExecutionError> {
        self.run(query, parameters)
    }

    fn query_keys(
        &self,
        query: &str,
        parameters: &[SqlValue],
    ) -> Result<Vec<SqlValue>, ExecutionError> {
        self.run_keys(query, parameters)
    }
}

#[async_trait]
impl AsyncStatementExecutor for MockExecutor {
    fn provider_id(&self) -> &str {
        &self.provider
    }

    async fn execute(&self, query: &str, parameters: &[SqlValue]) -> Result<u64, ExecutionError> {
        self.run(query, parameters)
    }

    async fn query_keys(
        &self,
        query: &str,
        parameters: &[SqlValue],
    ) -> Result<Vec<SqlValue>, ExecutionError> {
        self.run_keys(query, parameters)
    }
}
