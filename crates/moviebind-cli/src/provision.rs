//! Postgres DDL rendered from the catalog.

use moviebind_core::{Catalog, Column, ColumnType, Constraint, Table, creation_order};
use sqlx::PgPool;
use tracing::info;

use crate::CliError;

/// `CREATE TABLE` (and comment) statements, parents first.
pub fn create_statements(catalog: &Catalog) -> Result<Vec<String>, CliError> {
    let mut statements = Vec::new();
    for kind in creation_order(catalog)? {
        let Some(table) = catalog.table(kind) else {
            continue;
        };
        statements.push(create_table(table));
        if let Some(comment) = &table.comment {
            statements.push(format!(
                "COMMENT ON TABLE {} IS '{}'",
                table.name,
                comment.replace('\'', "''")
            ));
        }
    }
    Ok(statements)
}

/// `DROP TABLE` statements, children first.
pub fn drop_statements(catalog: &Catalog) -> Result<Vec<String>, CliError> {
    let mut order = creation_order(catalog)?;
    order.reverse();
    Ok(order
        .into_iter()
        .map(|kind| format!("DROP TABLE IF EXISTS {} CASCADE", kind.table_name()))
        .collect())
}

/// Create the schema, dropping existing tables first when `reset` is set.
///
/// Runs in one transaction and returns the number of statements executed.
pub async fn provision(pool: &PgPool, catalog: &Catalog, reset: bool) -> Result<usize, CliError> {
    let mut statements = if reset {
        drop_statements(catalog)?
    } else {
        Vec::new()
    };
    statements.extend(create_statements(catalog)?);

    let mut tx = pool.begin().await?;
    for statement in &statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!(statements = statements.len(), reset, "schema provisioned");
    Ok(statements.len())
}

fn create_table(table: &Table) -> String {
    let mut lines: Vec<String> = table.columns.iter().map(column_definition).collect();

    for constraint in &table.constraints {
        let columns = constraint.columns().join(", ");
        let body = match constraint {
            Constraint::PrimaryKey(_) => format!("PRIMARY KEY ({columns})"),
            Constraint::Unique(_) => format!("UNIQUE ({columns})"),
            Constraint::Check(check) => {
                format!("CHECK ({columns} {} 0)", check.rule.sql_operator())
            }
            Constraint::ForeignKey(fk) => format!(
                "FOREIGN KEY ({columns}) REFERENCES {} ({})",
                fk.referenced_table,
                fk.referenced_columns.join(", ")
            ),
        };
        lines.push(match constraint.name() {
            Some(name) => format!("CONSTRAINT {name} {body}"),
            None => body,
        });
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        table.name,
        lines.join(",\n    ")
    )
}

fn column_definition(column: &Column) -> String {
    let mut definition = format!("{} {}", column.name, sql_type(&column.column_type));
    if column.identity {
        definition.push_str(" GENERATED ALWAYS AS IDENTITY");
    } else if !column.is_nullable {
        definition.push_str(" NOT NULL");
    }
    definition
}

fn sql_type(column_type: &ColumnType) -> String {
    match column_type {
        ColumnType::BigInt => "BIGINT".to_string(),
        ColumnType::Integer => "INTEGER".to_string(),
        ColumnType::Boolean => "BOOLEAN".to_string(),
        ColumnType::Varchar { max_length } => format!("VARCHAR({max_length})"),
        ColumnType::Text => "TEXT".to_string(),
        ColumnType::Numeric { precision, scale } => format!("NUMERIC({precision}, {scale})"),
        ColumnType::Date => "DATE".to_string(),
        ColumnType::Timestamp => "TIMESTAMP".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement_for<'a>(statements: &'a [String], table: &str) -> &'a str {
        let prefix = format!("CREATE TABLE IF NOT EXISTS {table} (");
        statements
            .iter()
            .find(|statement| statement.starts_with(&prefix))
            .map(String::as_str)
            .expect("table statement")
    }

    #[test]
    fn renders_parents_before_children() {
        let statements = create_statements(&Catalog::moviebind()).expect("render ddl");
        let position = |table: &str| {
            let prefix = format!("CREATE TABLE IF NOT EXISTS {table} (");
            statements
                .iter()
                .position(|statement| statement.starts_with(&prefix))
                .expect("table rendered")
        };
        assert!(position("users") < position("profiles"));
        assert!(position("users") < position("contracts"));
        assert!(position("contracts") < position("viewings"));
        assert!(position("movies") < position("movie_genres"));
        assert!(position("genres") < position("movie_genres"));
        assert!(position("keywords") < position("movie_keywords"));
    }

    #[test]
    fn renders_columns_and_constraints() {
        let statements = create_statements(&Catalog::moviebind()).expect("render ddl");

        let users = statement_for(&statements, "users");
        assert!(users.contains("id BIGINT GENERATED ALWAYS AS IDENTITY"));
        assert!(users.contains("handle VARCHAR(50) NOT NULL"));
        assert!(users.contains("CONSTRAINT pk_users PRIMARY KEY (id)"));
        assert!(users.contains("UNIQUE (email)"));

        let movies = statement_for(&statements, "movies");
        assert!(movies.contains("budget NUMERIC(15, 2)"));
        assert!(movies.contains("CHECK (duration_minutes > 0)"));
        assert!(movies.contains("CHECK (budget >= 0)"));

        let links = statement_for(&statements, "movie_genres");
        assert!(links.contains("PRIMARY KEY (movie_id, genre_id)"));
        assert!(links.contains("REFERENCES genres (id)"));
    }

    #[test]
    fn drops_children_first() {
        let drops = drop_statements(&Catalog::moviebind()).expect("render drops");
        let position = |table: &str| {
            drops
                .iter()
                .position(|statement| statement == &format!("DROP TABLE IF EXISTS {table} CASCADE"))
                .expect("table dropped")
        };
        assert_eq!(drops.len(), 9);
        assert!(position("viewings") < position("contracts"));
        assert!(position("profiles") < position("users"));
    }
}
