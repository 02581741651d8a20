use std::{
    any::{Any, TypeId},
    sync::Arc,
};

use mini_moka::sync::Cache;

use crate::value::SqlValue;

pub type ColumnGetter<T> = Arc<dyn Fn(&T) -> SqlValue + Send + Sync>;
pub type ColumnSetter<T> = Arc<dyn Fn(&mut T, SqlValue) + Send + Sync>;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ModelDefinitionError {
    #[error("a column model needs at least one column")]
    NoColumns,

    #[error("the column '{0}' is declared more than once")]
    DuplicateColumn(String),

    #[error("a column model needs exactly one primary key column")]
    MissingPrimaryKey,
}

/// Per-column metadata for one entity type: the SQL column name, whether the
/// database assigns the value at insert time, and typed get/set access to the
/// backing field. Accessors are resolved once when the model is built, never
/// looked up per row.
pub struct ColumnDescriptor<T> {
    name: String,
    generated_on_insert: bool,
    getter: ColumnGetter<T>,
    setter: Option<ColumnSetter<T>>,
}

impl<T> ColumnDescriptor<T> {
    pub fn new(
        name: impl Into<String>,
        getter: impl Fn(&T) -> SqlValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            generated_on_insert: false,
            getter: Arc::new(getter),
            setter: None,
        }
    }

    /// Marks the column as assigned by the database on insert, e.g. an
    /// auto-increment key. An explicitly set (non-default) value still binds
    /// as a parameter, which is how caller-assigned UUID keys work.
    pub fn generated_on_insert(mut self) -> Self {
        self.generated_on_insert = true;
        self
    }

    pub fn with_setter(mut self, setter: impl Fn(&mut T, SqlValue) + Send + Sync + 'static) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_generated_on_insert(&self) -> bool {
        self.generated_on_insert
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub fn value_of(&self, entity: &T) -> SqlValue {
        (self.getter)(entity)
    }

    pub fn write(&self, entity: &mut T, value: SqlValue) {
        if let Some(setter) = &self.setter {
            setter(entity, value);
        }
    }
}

impl<T> Clone for ColumnDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            generated_on_insert: self.generated_on_insert,
            getter: self.getter.clone(),
            setter: self.setter.clone(),
        }
    }
}

/// Read-only description of one entity type's table: the table name, the
/// ordered column list and the primary key column. Resolved once per type and
/// cached by [`ModelCache`].
pub struct EntityColumnModel<T> {
    table_name: String,
    columns: Vec<ColumnDescriptor<T>>,
    primary_key: usize,
}

impl<T> EntityColumnModel<T> {
    pub fn builder(table_name: impl Into<String>) -> EntityColumnModelBuilder<T> {
        EntityColumnModelBuilder {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: None,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[ColumnDescriptor<T>] {
        &self.columns
    }

    pub fn primary_key(&self) -> &ColumnDescriptor<T> {
        &self.columns[self.primary_key]
    }

    pub fn column_named(&self, name: &str) -> Option<&ColumnDescriptor<T>> {
        self.columns.iter().find(|column| column.name() == name)
    }
}

pub struct EntityColumnModelBuilder<T> {
    table_name: String,
    columns: Vec<ColumnDescriptor<T>>,
    primary_key: Option<usize>,
}

impl<T> EntityColumnModelBuilder<T> {
    pub fn column(mut self, descriptor: ColumnDescriptor<T>) -> Self {
        self.columns.push(descriptor);
        self
    }

    pub fn primary_key(mut self, descriptor: ColumnDescriptor<T>) -> Self {
        self.primary_key = Some(self.columns.len());
        self.columns.push(descriptor);
        self
    }

    pub fn build(self) -> Result<EntityColumnModel<T>, ModelDefinitionError> {
        if self.columns.is_empty() {
            return Err(ModelDefinitionError::NoColumns);
        }

        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|other| other.name() == column.name()) {
                return Err(ModelDefinitionError::DuplicateColumn(column.name().to_string()));
            }
        }

        let primary_key = self.primary_key.ok_or(ModelDefinitionError::MissingPrimaryKey)?;

        Ok(EntityColumnModel { table_name: self.table_name, columns: self.columns, primary_key })
    }
}

/// The metadata-resolution seam: an entity type describes its own table and
/// column layout once, and the engine caches the result per type.
pub trait BulkEntity: Send + Sync + Sized + 'static {
    fn column_model() -> Result<EntityColumnModel<Self>, ModelDefinitionError>;
}

/// Caches resolved column models keyed by entity type id, so accessor
/// resolution happens once per type per engine rather than once per call.
#[derive(Clone)]
pub struct ModelCache {
    models: Cache<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ModelCache {
    pub fn new() -> Self {
        // An application has a bounded set of entity types; 256 is plenty.
        Self { models: Cache::new(256) }
    }

    pub fn resolve<T: BulkEntity>(&self) -> Result<Arc<EntityColumnModel<T>>, ModelDefinitionError> {
        let key = TypeId::of::<T>();

        if let Some(cached) = self.models.get(&key) {
            if let Ok(model) = cached.downcast::<EntityColumnModel<T>>() {
                return Ok(model);
            }
        }

        let model = Arc::new(T::column_model()?);
        self.models.insert(key, model.clone());
        Ok(model)
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}
