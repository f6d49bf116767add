//! Table provisioning for repositories sharing a table.

use monotable_storage::{StorageBackend, TableSchema};
use tracing::debug;

use crate::config::RepositoryConfig;
use crate::error::{ConfigError, CoreResult};

/// Merges the table layouts of `configs`, one schema per table.
///
/// Physical indexes are deduplicated by name.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidIndex`] if two repositories define the
/// same physical index with different key attributes.
pub fn merged_schemas(configs: &[&RepositoryConfig]) -> Result<Vec<TableSchema>, ConfigError> {
    let mut schemas: Vec<TableSchema> = Vec::new();
    for config in configs {
        let schema = config.table_schema();
        let Some(position) = schemas
            .iter()
            .position(|s| s.table_name == schema.table_name)
        else {
            schemas.push(schema);
            continue;
        };
        let existing = &mut schemas[position];
        for index in &schema.indexes {
            if let Some(other) = existing.index(&index.name) {
                if other != index {
                    return Err(ConfigError::invalid_index(
                        index.name.as_str(),
                        format!(
                            "defined differently by `{}` in table `{}`",
                            config.object_name(),
                            schema.table_name
                        ),
                    ));
                }
            }
        }
        existing.merge_indexes(&schema);
    }
    Ok(schemas)
}

/// Creates every table `configs` need, with all their indexes.
///
/// Returns the schemas passed to the backend.
///
/// # Errors
///
/// Returns a [`ConfigError`] for conflicting layouts or the backend's
/// error.
pub async fn ensure_tables(
    backend: &dyn StorageBackend,
    configs: &[&RepositoryConfig],
) -> CoreResult<Vec<TableSchema>> {
    let schemas = merged_schemas(configs)?;
    for schema in &schemas {
        debug!(
            table = %schema.table_name,
            indexes = schema.indexes.len(),
            "ensuring table"
        );
        backend.ensure_table(schema).await?;
    }
    Ok(schemas)
}
