use crate::{
    dialect::DialectStrategy,
    model::EntityColumnModel,
    statements::{
        column_names_sql, format_table_name, quote_identifier, InsertStatement,
        StatementBuildError,
    },
};

/// Builds one parameterized multi-row `INSERT` for the whole batch, with one
/// value slot per column in model order for every row.
///
/// A database-generated column whose field still holds its default value is
/// emitted as a `NULL` literal so the database assigns it (sqlite does not
/// support the DEFAULT keyword); an explicitly assigned value binds as a
/// parameter instead. Any other column binds as a parameter unless NULL.
///
/// With `want_keys` set and a dialect that supports it, the statement ends in
/// `RETURNING <pk>`, yielding one key per inserted row in insertion order.
pub fn build_insert<T>(
    model: &EntityColumnModel<T>,
    batch: &[T],
    want_keys: bool,
    dialect: &dyn DialectStrategy,
) -> Result<InsertStatement, StatementBuildError> {
    if batch.is_empty() {
        return Err(StatementBuildError::EmptyBatch);
    }

    let mut query = format!(
        "INSERT INTO {} ({}) VALUES ",
        format_table_name(model.table_name()),
        column_names_sql(model.columns().iter().map(|column| column.name())),
    );
    let mut parameters = Vec::new();

    for (i, entity) in batch.iter().enumerate() {
        if i > 0 {
            query.push_str(", ");
        }
        query.push('(');

        for (j, column) in model.columns().iter().enumerate() {
            if j > 0 {
                query.push_str(", ");
            }

            let value = column.value_of(entity);
            let unassigned = if column.is_generated_on_insert() {
                value.is_default()
            } else {
                value.is_null()
            };

            if unassigned {
                query.push_str("NULL");
            } else {
                parameters.push(value);
                query.push_str(&dialect.placeholder(parameters.len()));
            }
        }

        query.push(')');
    }

    if want_keys && dialect.supports_returning() {
        query.push_str(&format!(" RETURNING {}", quote_identifier(model.primary_key().name())));
    }

    Ok(InsertStatement { query, parameters })
}
