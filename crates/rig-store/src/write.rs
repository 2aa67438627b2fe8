//! Single-transaction persistence of a frozen `RigModel` into the schema in
//! `schema.rs` (§4.8). Every row this module writes uses the model's own
//! entity ids as the table's primary key — they were already assigned in a
//! deterministic global order by `RigModelBuilder`, so reusing them avoids a
//! second id-remapping pass and keeps the polymorphic dependency columns
//! trivially consistent with the in-memory `DepTarget` values.

use std::collections::BTreeMap;
use std::path::Path;

use rig_core::model::{
    Aggregator, Component, ComponentLocation, DepTarget, ExternalPackage, Id, PackageManager,
    Runner, RigModel, Test, Utility,
};
use rig_core::{RigError, RigResult};
use rusqlite::{params, Connection, Transaction};

use crate::config::{StoreConfig, StoreLocation};
use crate::schema::{SCHEMA_SQL, SCHEMA_VERSION};

pub struct Store {
    conn: Connection,
}

impl Store {
    /// The underlying connection, for the read-only query layer in
    /// `read.rs`. Not exposed for writes outside this crate.
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Open the database, creating the schema if absent, and checking the
    /// schema version if present. A mismatch is `SchemaVersionMismatch`
    /// rather than a silent drift (§4.8).
    pub fn open(config: &StoreConfig) -> RigResult<Self> {
        let conn = match &config.location {
            StoreLocation::File(path) => open_file(path)?,
            StoreLocation::Memory => {
                Connection::open_in_memory().map_err(|e| RigError::TransactionFailed {
                    message: e.to_string(),
                })?
            }
        };
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
        check_schema_version(&conn)?;
        Ok(Self { conn })
    }

    /// Write `model` in one transaction. Any row failure rolls the whole
    /// write back; a `RigModel` that reached `freeze()` is assumed to
    /// already satisfy the model's own invariants, so failures here are
    /// schema/storage failures, not data-validity failures.
    pub fn write(&mut self, model: &RigModel) -> RigResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
        write_model(&tx, model)?;
        tx.commit()
            .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
        Ok(())
    }
}

fn open_file(path: &Path) -> RigResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| RigError::TransactionFailed {
                message: format!("creating {}: {e}", parent.display()),
            })?;
        }
    }
    Connection::open(path).map_err(|e| RigError::TransactionFailed { message: e.to_string() })
}

fn check_schema_version(conn: &Connection) -> RigResult<()> {
    let existing: Option<i64> = conn
        .query_row("SELECT schema_version FROM rig_metadata WHERE id = 1", [], |row| row.get(0))
        .ok();
    if let Some(found) = existing {
        if found != SCHEMA_VERSION {
            return Err(RigError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION as u32,
                found: found as u32,
            });
        }
    }
    Ok(())
}

fn sql_err(e: rusqlite::Error) -> RigError {
    RigError::TransactionFailed { message: e.to_string() }
}

fn write_model(tx: &Transaction<'_>, model: &RigModel) -> RigResult<()> {
    write_metadata(tx)?;
    write_repository(tx, model)?;
    write_build_system(tx, model)?;

    let mut manager_ids: BTreeMap<PackageManager, i64> = BTreeMap::new();
    for pkg in &model.external_packages {
        write_external_package(tx, pkg, &mut manager_ids)?;
    }

    for c in &model.components {
        write_component(tx, c)?;
    }
    for a in &model.aggregators {
        write_aggregator(tx, a)?;
    }
    for r in &model.runners {
        write_runner(tx, r)?;
    }
    for u in &model.utilities {
        write_utility(tx, u)?;
    }
    for t in &model.tests {
        write_test(tx, t)?;
    }
    for c in &model.components {
        if let Some(test_id) = c.test_link {
            tx.execute(
                "UPDATE components SET test_link_id = ?1 WHERE id = ?2",
                params![test_id.0, c.id.0],
            )
            .map_err(sql_err)?;
        }
    }

    for c in &model.components {
        for dep in &c.depends_on {
            write_dependency_edge(tx, "component_dependencies", "component_id", c.id, dep)?;
        }
        for loc in &c.locations {
            write_location(tx, loc)?;
        }
    }
    for a in &model.aggregators {
        for dep in &a.depends_on {
            write_dependency_edge(tx, "aggregator_dependencies", "aggregator_id", a.id, dep)?;
        }
    }
    for r in &model.runners {
        for dep in &r.depends_on {
            write_dependency_edge(tx, "runner_dependencies", "runner_id", r.id, dep)?;
        }
    }

    for t in &model.tests {
        for path in &t.source_files {
            tx.execute(
                "INSERT INTO test_source_files (test_id, path) VALUES (?1, ?2)",
                params![t.id.0, path.display().to_string()],
            )
            .map_err(sql_err)?;
        }
        if let Some(component_id) = t.linked_component {
            tx.execute(
                "INSERT INTO test_components (test_id, component_id) VALUES (?1, ?2)",
                params![t.id.0, component_id.0],
            )
            .map_err(sql_err)?;
        }
    }

    Ok(())
}

fn write_metadata(tx: &Transaction<'_>) -> RigResult<()> {
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
    tx.execute(
        "INSERT INTO rig_metadata (id, schema_version, created_at) VALUES (1, ?1, ?2)",
        params![SCHEMA_VERSION, created_at],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn write_repository(tx: &Transaction<'_>, model: &RigModel) -> RigResult<()> {
    let r = &model.repository;
    tx.execute(
        "INSERT INTO repository_info
            (rig_id, name, root_path, build_dir, output_dir, configure_cmd, build_cmd, install_cmd, test_cmd)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            r.name,
            r.root_path.display().to_string(),
            r.build_dir.display().to_string(),
            r.output_dir.display().to_string(),
            r.configure_cmd,
            r.build_cmd,
            r.install_cmd,
            r.test_cmd,
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn write_build_system(tx: &Transaction<'_>, model: &RigModel) -> RigResult<()> {
    let b = &model.build_system;
    tx.execute(
        "INSERT INTO build_system_info (rig_id, name, version, generator, build_type)
         VALUES (1, ?1, ?2, ?3, ?4)",
        params![b.name, b.version, b.generator, b.build_type],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn upsert_package_manager(
    tx: &Transaction<'_>,
    manager: PackageManager,
    cache: &mut BTreeMap<PackageManager, i64>,
) -> RigResult<i64> {
    if let Some(id) = cache.get(&manager) {
        return Ok(*id);
    }
    let name = format!("{manager:?}");
    tx.execute(
        "INSERT OR IGNORE INTO package_managers (name) VALUES (?1)",
        params![name],
    )
    .map_err(sql_err)?;
    let id: i64 = tx
        .query_row(
            "SELECT id FROM package_managers WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .map_err(sql_err)?;
    cache.insert(manager, id);
    Ok(id)
}

fn write_external_package(
    tx: &Transaction<'_>,
    pkg: &ExternalPackage,
    manager_ids: &mut BTreeMap<PackageManager, i64>,
) -> RigResult<()> {
    let manager_id = upsert_package_manager(tx, pkg.package_manager, manager_ids)?;
    tx.execute(
        "INSERT INTO external_packages (id, rig_id, package_manager_id, name, version)
         VALUES (?1, 1, ?2, ?3, ?4)",
        params![pkg.id.0, manager_id, pkg.name, pkg.version],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn insert_evidence(tx: &Transaction<'_>, evidence: &rig_core::model::Evidence) -> RigResult<i64> {
    let frames: Vec<String> = evidence
        .call_stack
        .iter()
        .map(|f| format!("{}:{}", f.file.display(), f.line))
        .collect();
    let call_stack_json = serde_json::to_string(&frames)
        .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
    tx.execute(
        "INSERT INTO evidence (rig_id, call_stack_json) VALUES (1, ?1)",
        params![call_stack_json],
    )
    .map_err(sql_err)?;
    Ok(tx.last_insert_rowid())
}

fn write_component(tx: &Transaction<'_>, c: &Component) -> RigResult<()> {
    let evidence_id = insert_evidence(tx, &c.evidence)?;
    tx.execute(
        "INSERT INTO components
            (id, rig_id, name, kind, language, runtime, output_filename, output_path, evidence_id)
         VALUES (?1, 1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            c.id.0,
            c.name,
            format!("{:?}", c.kind),
            format!("{:?}", c.language),
            format!("{:?}", c.runtime),
            c.output_filename,
            c.output_path.as_ref().map(|p| p.display().to_string()),
            evidence_id,
        ],
    )
    .map_err(sql_err)?;

    for lang in &c.languages {
        tx.execute(
            "INSERT INTO component_languages (component_id, language) VALUES (?1, ?2)",
            params![c.id.0, format!("{lang:?}")],
        )
        .map_err(sql_err)?;
    }
    for path in &c.sources {
        tx.execute(
            "INSERT INTO component_source_files (component_id, path) VALUES (?1, ?2)",
            params![c.id.0, path.display().to_string()],
        )
        .map_err(sql_err)?;
    }
    for external_id in &c.externals {
        tx.execute(
            "INSERT INTO component_external_packages (component_id, external_package_id) VALUES (?1, ?2)",
            params![c.id.0, external_id.0],
        )
        .map_err(sql_err)?;
    }
    Ok(())
}

fn write_aggregator(tx: &Transaction<'_>, a: &Aggregator) -> RigResult<()> {
    let evidence_id = insert_evidence(tx, &a.evidence)?;
    tx.execute(
        "INSERT INTO aggregators (id, rig_id, name, evidence_id) VALUES (?1, 1, ?2, ?3)",
        params![a.id.0, a.name, evidence_id],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn write_runner(tx: &Transaction<'_>, r: &Runner) -> RigResult<()> {
    let evidence_id = insert_evidence(tx, &r.evidence)?;
    let command_json = serde_json::to_string(&r.command)
        .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
    tx.execute(
        "INSERT INTO runners (id, rig_id, name, command_json, evidence_id) VALUES (?1, 1, ?2, ?3, ?4)",
        params![r.id.0, r.name, command_json, evidence_id],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn write_utility(tx: &Transaction<'_>, u: &Utility) -> RigResult<()> {
    let evidence_id = insert_evidence(tx, &u.evidence)?;
    tx.execute(
        "INSERT INTO utilities (id, rig_id, name, evidence_id) VALUES (?1, 1, ?2, ?3)",
        params![u.id.0, u.name, evidence_id],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn write_test(tx: &Transaction<'_>, t: &Test) -> RigResult<()> {
    let evidence_id = insert_evidence(tx, &t.evidence)?;
    let command_json = serde_json::to_string(&t.command)
        .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
    let properties_json = serde_json::to_string(&t.properties)
        .map_err(|e| RigError::TransactionFailed { message: e.to_string() })?;
    tx.execute(
        "INSERT INTO tests
            (id, rig_id, name, framework, test_type, command_json, properties_json, linked_component_id, evidence_id)
         VALUES (?1, 1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            t.id.0,
            t.name,
            format!("{:?}", t.framework),
            t.test_type,
            command_json,
            properties_json,
            t.linked_component.map(|id| id.0),
            evidence_id,
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn write_location(tx: &Transaction<'_>, loc: &ComponentLocation) -> RigResult<()> {
    let evidence_id = insert_evidence(tx, &loc.evidence)?;
    tx.execute(
        "INSERT INTO component_locations (id, component_id, path, action, source_location_id, evidence_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            loc.id.0,
            loc.component.0,
            loc.path.display().to_string(),
            format!("{:?}", loc.action),
            loc.source_location.map(|id| id.0),
            evidence_id,
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn write_dependency_edge(
    tx: &Transaction<'_>,
    table: &str,
    owner_column: &str,
    owner_id: Id,
    dep: &DepTarget,
) -> RigResult<()> {
    let (component, aggregator, runner, utility) = match dep {
        DepTarget::Component(id) => (Some(id.0), None, None, None),
        DepTarget::Aggregator(id) => (None, Some(id.0), None, None),
        DepTarget::Runner(id) => (None, None, Some(id.0), None),
        DepTarget::Utility(id) => (None, None, None, Some(id.0)),
    };
    let sql = format!(
        "INSERT INTO {table}
            ({owner_column}, depends_on_component_id, depends_on_aggregator_id, depends_on_runner_id, depends_on_utility_id)
         VALUES (?1, ?2, ?3, ?4, ?5)"
    );
    tx.execute(&sql, params![owner_id.0, component, aggregator, runner, utility])
        .map_err(sql_err)?;
    Ok(())
}
