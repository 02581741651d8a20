/// Reserved SQL keywords that need quoting.
pub const RESERVED_KEYWORDS: &[&str] =
    &["group", "user", "order", "table", "index", "primary", "key"];

/// Quotes an identifier if it's a reserved keyword.
#[inline]
pub fn quote_identifier(name: &str) -> String {
    if RESERVED_KEYWORDS.contains(&name) {
        format!("\"{}\"", name)
    } else {
        name.to_string()
    }
}

/// Formats a table name, handling schema.table format.
pub fn format_table_name(table_name: &str) -> String {
    if table_name.contains('.') {
        let parts: Vec<&str> = table_name.split('.').collect();
        if parts.len() == 2 {
            let schema = parts[0].trim_matches('"');
            let table = parts[1].trim_matches('"');
            format!("\"{}\".\"{}\"", schema, table)
        } else {
            table_name.to_string()
        }
    } else {
        table_name.to_string()
    }
}

pub fn column_names_sql<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quote_identifier).collect::<Vec<String>>().join(", ")
}
