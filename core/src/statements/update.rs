use std::collections::HashSet;

use crate::{
    dialect::DialectStrategy,
    model::EntityColumnModel,
    statements::{format_table_name, quote_identifier, StatementBuildError, UpdateStatement},
};

/// Builds one conditional `UPDATE ... CASE` statement covering every entity
/// in the batch whose modification set marks at least one requested column
/// changed.
///
/// Each requested column becomes `col = CASE WHEN <pk> = <id> THEN <param>
/// ... ELSE col END`; a column nothing in the batch changed contributes no
/// `SET` clause at all. Primary keys appear inline as literals (they come
/// from typed, validated metadata, never raw user input); the values being
/// written always bind as parameters. `modified` must align positionally with
/// `batch`.
///
/// When no entity has any tracked change the returned statement carries an
/// empty id list and must be skipped: an empty `IN ()` clause is not valid
/// SQL.
pub fn build_update<T>(
    model: &EntityColumnModel<T>,
    batch: &[T],
    properties: &[&str],
    modified: &[HashSet<String>],
    dialect: &dyn DialectStrategy,
) -> Result<UpdateStatement, StatementBuildError> {
    if batch.is_empty() {
        return Err(StatementBuildError::EmptyBatch);
    }
    if properties.is_empty() {
        return Err(StatementBuildError::NoProperties);
    }
    if modified.len() != batch.len() {
        return Err(StatementBuildError::ModificationSetMismatch {
            expected: batch.len(),
            got: modified.len(),
        });
    }

    let mut columns = Vec::with_capacity(properties.len());
    for property in properties {
        let column = model.column_named(property).ok_or_else(|| {
            StatementBuildError::UnknownColumn {
                property: property.to_string(),
                table: model.table_name().to_string(),
            }
        })?;
        columns.push(column);
    }

    let primary_key = model.primary_key();
    let pk_name = quote_identifier(primary_key.name());

    let mut parameters = Vec::new();
    let mut set_clauses = Vec::new();
    let mut ids: Vec<String> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for column in columns {
        let mut when_clauses = Vec::new();

        for (entity, entity_modified) in batch.iter().zip(modified) {
            if !entity_modified.contains(column.name()) {
                continue;
            }

            let pk_value = primary_key.value_of(entity);
            let id = pk_value.to_key_literal().ok_or_else(|| {
                StatementBuildError::UnsupportedKeyLiteral {
                    column: primary_key.name().to_string(),
                    kind: pk_value.kind_name(),
                }
            })?;

            let value = column.value_of(entity);
            if value.is_null() {
                when_clauses.push(format!("WHEN {} = {} THEN NULL", pk_name, id));
            } else {
                parameters.push(value);
                when_clauses.push(format!(
                    "WHEN {} = {} THEN {}",
                    pk_name,
                    id,
                    dialect.placeholder(parameters.len())
                ));
            }

            if seen_ids.insert(id.clone()) {
                ids.push(id);
            }
        }

        if when_clauses.is_empty() {
            continue;
        }

        let column_name = quote_identifier(column.name());
        set_clauses.push(format!(
            "{} = CASE {} ELSE {} END",
            column_name,
            when_clauses.join(" "),
            column_name
        ));
    }

    if ids.is_empty() {
        // Nothing in this batch was tracked as modified.
        return Ok(UpdateStatement { query: String::new(), parameters: Vec::new(), ids });
    }

    let query = format!(
        "UPDATE {} SET {} WHERE {} IN ({})",
        format_table_name(model.table_name()),
        set_clauses.join(", "),
        pk_name,
        ids.join(", ")
    );

    Ok(UpdateStatement { query, parameters, ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dialect::ReturningDialect,
        modification::ModificationSet,
        test_support::{item_model, Item},
        value::SqlValue,
    };

    fn items() -> Vec<Item> {
        (1..=3)
            .map(|i| Item { id: i, name: format!("item-{}", i), quantity: i as i32 * 10 })
            .collect()
    }

    #[test]
    fn test_case_fragment_per_modified_entity() {
        let model = item_model();
        let rows = items();
        let modifications = ModificationSet::all_columns(&model, rows.len());

        let statement = build_update(
            &model,
            &rows,
            &["name", "quantity"],
            modifications.batch(0, rows.len()),
            &ReturningDialect,
        )
        .unwrap();

        assert_eq!(
            statement.query,
            "UPDATE items SET \
             name = CASE WHEN id = 1 THEN $1 WHEN id = 2 THEN $2 WHEN id = 3 THEN $3 ELSE name END, \
             quantity = CASE WHEN id = 1 THEN $4 WHEN id = 2 THEN $5 WHEN id = 3 THEN $6 ELSE quantity END \
             WHERE id IN (1, 2, 3)"
        );
        assert_eq!(statement.parameters.len(), 6);
        assert_eq!(statement.ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unmodified_column_contributes_no_set_clause() {
        let model = item_model();
        let rows = items();

        let mut modifications = ModificationSet::new();
        modifications.push(["name"]);
        modifications.push(["name"]);
        modifications.push(["name"]);

        let statement = build_update(
            &model,
            &rows,
            &["name", "quantity"],
            modifications.batch(0, rows.len()),
            &ReturningDialect,
        )
        .unwrap();

        assert!(statement.query.contains("name = CASE"));
        assert!(!statement.query.contains("quantity = CASE"));
        assert_eq!(statement.parameters.len(), 3);
    }

    #[test]
    fn test_unmodified_entity_is_left_out_of_the_id_list() {
        let model = item_model();
        let rows = items();

        let mut modifications = ModificationSet::new();
        modifications.push(["name"]);
        modifications.push(Vec::<String>::new());
        modifications.push(["name"]);

        let statement = build_update(
            &model,
            &rows,
            &["name"],
            modifications.batch(0, rows.len()),
            &ReturningDialect,
        )
        .unwrap();

        assert_eq!(statement.ids, vec!["1", "3"]);
        assert!(statement.query.ends_with("WHERE id IN (1, 3)"));
        assert!(!statement.query.contains("WHEN id = 2"));
    }

    #[test]
    fn test_nothing_modified_yields_a_noop() {
        let model = item_model();
        let rows = items();
        let modifications = ModificationSet::unmodified(rows.len());

        let statement = build_update(
            &model,
            &rows,
            &["name", "quantity"],
            modifications.batch(0, rows.len()),
            &ReturningDialect,
        )
        .unwrap();

        assert!(statement.is_noop());
        assert!(statement.query.is_empty());
        assert!(statement.parameters.is_empty());
    }

    #[test]
    fn test_null_values_write_null_without_binding() {
        let model = crate::test_support::tagged_item_model();
        let rows = vec![
            crate::test_support::TaggedItem { tag: "a".to_string(), name: Some("x".to_string()) },
            crate::test_support::TaggedItem { tag: "b".to_string(), name: None },
        ];
        let modifications = ModificationSet::all_columns(&model, rows.len());

        let statement = build_update(
            &model,
            &rows,
            &["name"],
            modifications.batch(0, rows.len()),
            &ReturningDialect,
        )
        .unwrap();

        assert!(statement.query.contains("WHEN tag = 'a' THEN $1"));
        assert!(statement.query.contains("WHEN tag = 'b' THEN NULL"));
        assert_eq!(statement.parameters, vec![SqlValue::Text("x".to_string())]);
        assert_eq!(statement.ids, vec!["'a'", "'b'"]);
    }

    #[test]
    fn test_unknown_property_is_rejected() {
        let model = item_model();
        let rows = items();
        let modifications = ModificationSet::all_columns(&model, rows.len());

        let result = build_update(
            &model,
            &rows,
            &["nope"],
            modifications.batch(0, rows.len()),
            &ReturningDialect,
        );
        assert_eq!(
            result.err(),
            Some(StatementBuildError::UnknownColumn {
                property: "nope".to_string(),
                table: "items".to_string()
            })
        );
    }

    #[test]
    fn test_empty_property_list_is_rejected() {
        let model = item_model();
        let rows = items();
        let modifications = ModificationSet::all_columns(&model, rows.len());

        let result =
            build_update(&model, &rows, &[], modifications.batch(0, rows.len()), &ReturningDialect);
        assert_eq!(result.err(), Some(StatementBuildError::NoProperties));
    }

    #[test]
    fn test_misaligned_modification_set_is_rejected() {
        let model = item_model();
        let rows = items();
        let modifications = ModificationSet::all_columns(&model, 2);

        let result =
            build_update(&model, &rows, &["name"], modifications.batch(0, 2), &ReturningDialect);
        assert_eq!(
            result.err(),
            Some(StatementBuildError::ModificationSetMismatch { expected: 3, got: 2 })
        );
    }

    #[test]
    fn test_text_primary_keys_render_quoted() {
        let model = crate::test_support::tagged_item_model();
        let rows = vec![
            crate::test_support::TaggedItem { tag: "a-1".to_string(), name: Some("A".to_string()) },
            crate::test_support::TaggedItem { tag: "b's".to_string(), name: Some("B".to_string()) },
        ];
        let modifications = ModificationSet::all_columns(&model, rows.len());

        let statement = build_update(
            &model,
            &rows,
            &["name"],
            modifications.batch(0, rows.len()),
            &ReturningDialect,
        )
        .unwrap();

        assert!(statement.query.contains("WHEN tag = 'a-1' THEN $1"));
        assert!(statement.query.contains("WHEN tag = 'b''s' THEN $2"));
        assert!(statement.query.ends_with("WHERE tag IN ('a-1', 'b''s')"));
    }

    #[test]
    fn test_values_always_bind_while_keys_inline() {
        let model = item_model();
        let rows = items();
        let modifications = ModificationSet::all_columns(&model, rows.len());

        let statement = build_update(
            &model,
            &rows,
            &["quantity"],
            modifications.batch(0, rows.len()),
            &ReturningDialect,
        )
        .unwrap();

        assert_eq!(
            statement.parameters,
            vec![SqlValue::I32(10), SqlValue::I32(20), SqlValue::I32(30)]
        );
    }
}
