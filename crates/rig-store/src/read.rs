//! Read-only queries over a persisted RIG, for `rig inspect`. Never
//! reconstructs a full in-memory `RigModel` — these are thin row
//! projections for smoke-checking a database without re-running
//! extraction.

use rig_core::{RigError, RigResult};
use rusqlite::params;

use crate::write::Store;

#[derive(Debug)]
pub struct Summary {
    pub repository_name: String,
    pub build_system_name: String,
    pub component_count: i64,
    pub aggregator_count: i64,
    pub runner_count: i64,
    pub utility_count: i64,
    pub test_count: i64,
    pub external_package_count: i64,
}

#[derive(Debug)]
pub struct ComponentDetail {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub language: String,
    pub runtime: String,
    pub output_path: Option<String>,
    pub source_files: Vec<String>,
    pub external_packages: Vec<String>,
    pub linked_test: Option<String>,
}

impl Store {
    pub fn summary(&self) -> RigResult<Summary> {
        let conn = self.connection();
        let (repository_name, build_system_name) = conn
            .query_row(
                "SELECT r.name, b.name FROM repository_info r, build_system_info b
                 WHERE r.rig_id = 1 AND b.rig_id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;

        let count = |table: &str| -> RigResult<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .map_err(|e| RigError::TransactionFailed { message: e.to_string() })
        };

        Ok(Summary {
            repository_name,
            build_system_name,
            component_count: count("components")?,
            aggregator_count: count("aggregators")?,
            runner_count: count("runners")?,
            utility_count: count("utilities")?,
            test_count: count("tests")?,
            external_package_count: count("external_packages")?,
        })
    }

    pub fn component_by_name(&self, name: &str) -> RigResult<Option<ComponentDetail>> {
        let conn = self.connection();
        let found = conn.query_row(
            "SELECT id, name, kind, language, runtime, output_path
             FROM components WHERE name = ?1",
            params![name],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        );

        let (id, name, kind, language, runtime, output_path) = match found {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(RigError::TransactionFailed { message: e.to_string() }),
        };

        let mut stmt = conn
            .prepare("SELECT path FROM component_source_files WHERE component_id = ?1 ORDER BY path")
            .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
        let source_files = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))
            .and_then(Iterator::collect::<Result<Vec<_>, _>>)
            .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;

        let mut stmt = conn
            .prepare(
                "SELECT ep.name FROM external_packages ep
                 JOIN component_external_packages cep ON cep.external_package_id = ep.id
                 WHERE cep.component_id = ?1 ORDER BY ep.name",
            )
            .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
        let external_packages = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))
            .and_then(Iterator::collect::<Result<Vec<_>, _>>)
            .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;

        let linked_test: Option<String> = conn
            .query_row(
                "SELECT name FROM tests WHERE linked_component_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .ok();

        Ok(Some(ComponentDetail {
            id,
            name,
            kind,
            language,
            runtime,
            output_path,
            source_files,
            external_packages,
            linked_test,
        }))
    }
}
