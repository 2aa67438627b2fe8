//! The embedded relational schema (§6) and the version gate that protects
//! against writing into a database built by an incompatible schema
//! revision.

pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS rig_metadata (
    id              INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version  INTEGER NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS repository_info (
    rig_id          INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    root_path       TEXT NOT NULL,
    build_dir       TEXT NOT NULL,
    output_dir      TEXT NOT NULL,
    configure_cmd   TEXT,
    build_cmd       TEXT,
    install_cmd     TEXT,
    test_cmd        TEXT
);

CREATE TABLE IF NOT EXISTS build_system_info (
    rig_id          INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    version         TEXT,
    generator       TEXT,
    build_type      TEXT
);

CREATE TABLE IF NOT EXISTS evidence (
    id              INTEGER PRIMARY KEY,
    rig_id          INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    call_stack_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS package_managers (
    id              INTEGER PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS external_packages (
    id                  INTEGER PRIMARY KEY,
    rig_id              INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    package_manager_id  INTEGER NOT NULL REFERENCES package_managers(id),
    name                TEXT NOT NULL,
    version             TEXT
);

CREATE TABLE IF NOT EXISTS components (
    id                  INTEGER PRIMARY KEY,
    rig_id              INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    name                TEXT NOT NULL,
    kind                TEXT NOT NULL,
    language            TEXT NOT NULL,
    runtime             TEXT NOT NULL,
    output_filename     TEXT,
    output_path         TEXT,
    evidence_id         INTEGER NOT NULL REFERENCES evidence(id),
    test_link_id        INTEGER REFERENCES tests(id)
);

CREATE TABLE IF NOT EXISTS component_languages (
    component_id    INTEGER NOT NULL REFERENCES components(id) ON DELETE CASCADE,
    language        TEXT NOT NULL,
    PRIMARY KEY (component_id, language)
);

CREATE TABLE IF NOT EXISTS component_source_files (
    component_id    INTEGER NOT NULL REFERENCES components(id) ON DELETE CASCADE,
    path            TEXT NOT NULL,
    PRIMARY KEY (component_id, path)
);

CREATE TABLE IF NOT EXISTS component_external_packages (
    component_id        INTEGER NOT NULL REFERENCES components(id) ON DELETE CASCADE,
    external_package_id INTEGER NOT NULL REFERENCES external_packages(id) ON DELETE CASCADE,
    PRIMARY KEY (component_id, external_package_id)
);

CREATE TABLE IF NOT EXISTS aggregators (
    id              INTEGER PRIMARY KEY,
    rig_id          INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    evidence_id     INTEGER NOT NULL REFERENCES evidence(id)
);

CREATE TABLE IF NOT EXISTS runners (
    id              INTEGER PRIMARY KEY,
    rig_id          INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    command_json    TEXT NOT NULL,
    evidence_id     INTEGER NOT NULL REFERENCES evidence(id)
);

CREATE TABLE IF NOT EXISTS utilities (
    id              INTEGER PRIMARY KEY,
    rig_id          INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    evidence_id     INTEGER NOT NULL REFERENCES evidence(id)
);

CREATE TABLE IF NOT EXISTS tests (
    id                  INTEGER PRIMARY KEY,
    rig_id              INTEGER NOT NULL REFERENCES rig_metadata(id) ON DELETE CASCADE,
    name                TEXT NOT NULL,
    framework           TEXT NOT NULL,
    test_type           TEXT,
    command_json        TEXT NOT NULL,
    properties_json     TEXT NOT NULL,
    linked_component_id INTEGER REFERENCES components(id),
    evidence_id         INTEGER NOT NULL REFERENCES evidence(id)
);

CREATE TABLE IF NOT EXISTS test_source_files (
    test_id         INTEGER NOT NULL REFERENCES tests(id) ON DELETE CASCADE,
    path            TEXT NOT NULL,
    PRIMARY KEY (test_id, path)
);

CREATE TABLE IF NOT EXISTS test_components (
    test_id         INTEGER NOT NULL REFERENCES tests(id) ON DELETE CASCADE,
    component_id    INTEGER NOT NULL REFERENCES components(id) ON DELETE CASCADE,
    PRIMARY KEY (test_id, component_id)
);

CREATE TABLE IF NOT EXISTS component_dependencies (
    id                          INTEGER PRIMARY KEY,
    component_id                INTEGER NOT NULL REFERENCES components(id) ON DELETE CASCADE,
    depends_on_component_id     INTEGER REFERENCES components(id) ON DELETE CASCADE,
    depends_on_aggregator_id    INTEGER REFERENCES aggregators(id) ON DELETE CASCADE,
    depends_on_runner_id        INTEGER REFERENCES runners(id) ON DELETE CASCADE,
    depends_on_utility_id       INTEGER REFERENCES utilities(id) ON DELETE CASCADE,
    CHECK (
        (depends_on_component_id IS NOT NULL) +
        (depends_on_aggregator_id IS NOT NULL) +
        (depends_on_runner_id IS NOT NULL) +
        (depends_on_utility_id IS NOT NULL) = 1
    )
);

CREATE TABLE IF NOT EXISTS aggregator_dependencies (
    id                          INTEGER PRIMARY KEY,
    aggregator_id               INTEGER NOT NULL REFERENCES aggregators(id) ON DELETE CASCADE,
    depends_on_component_id     INTEGER REFERENCES components(id) ON DELETE CASCADE,
    depends_on_aggregator_id    INTEGER REFERENCES aggregators(id) ON DELETE CASCADE,
    depends_on_runner_id        INTEGER REFERENCES runners(id) ON DELETE CASCADE,
    depends_on_utility_id       INTEGER REFERENCES utilities(id) ON DELETE CASCADE,
    CHECK (
        (depends_on_component_id IS NOT NULL) +
        (depends_on_aggregator_id IS NOT NULL) +
        (depends_on_runner_id IS NOT NULL) +
        (depends_on_utility_id IS NOT NULL) = 1
    )
);

CREATE TABLE IF NOT EXISTS runner_dependencies (
    id                          INTEGER PRIMARY KEY,
    runner_id                   INTEGER NOT NULL REFERENCES runners(id) ON DELETE CASCADE,
    depends_on_component_id     INTEGER REFERENCES components(id) ON DELETE CASCADE,
    depends_on_aggregator_id    INTEGER REFERENCES aggregators(id) ON DELETE CASCADE,
    depends_on_runner_id        INTEGER REFERENCES runners(id) ON DELETE CASCADE,
    depends_on_utility_id       INTEGER REFERENCES utilities(id) ON DELETE CASCADE,
    CHECK (
        (depends_on_component_id IS NOT NULL) +
        (depends_on_aggregator_id IS NOT NULL) +
        (depends_on_runner_id IS NOT NULL) +
        (depends_on_utility_id IS NOT NULL) = 1
    )
);

CREATE TABLE IF NOT EXISTS utility_dependencies (
    id                          INTEGER PRIMARY KEY,
    utility_id                  INTEGER NOT NULL REFERENCES utilities(id) ON DELETE CASCADE,
    depends_on_component_id     INTEGER REFERENCES components(id) ON DELETE CASCADE,
    depends_on_aggregator_id    INTEGER REFERENCES aggregators(id) ON DELETE CASCADE,
    depends_on_runner_id        INTEGER REFERENCES runners(id) ON DELETE CASCADE,
    depends_on_utility_id       INTEGER REFERENCES utilities(id) ON DELETE CASCADE,
    CHECK (
        (depends_on_component_id IS NOT NULL) +
        (depends_on_aggregator_id IS NOT NULL) +
        (depends_on_runner_id IS NOT NULL) +
        (depends_on_utility_id IS NOT NULL) = 1
    )
);

CREATE TABLE IF NOT EXISTS component_locations (
    id                  INTEGER PRIMARY KEY,
    component_id        INTEGER NOT NULL REFERENCES components(id) ON DELETE CASCADE,
    path                TEXT NOT NULL,
    action              TEXT NOT NULL,
    source_location_id  INTEGER REFERENCES component_locations(id),
    evidence_id         INTEGER NOT NULL REFERENCES evidence(id)
);

CREATE INDEX IF NOT EXISTS idx_components_rig ON components(rig_id, name);
CREATE INDEX IF NOT EXISTS idx_aggregators_rig ON aggregators(rig_id, name);
CREATE INDEX IF NOT EXISTS idx_runners_rig ON runners(rig_id, name);
CREATE INDEX IF NOT EXISTS idx_utilities_rig ON utilities(rig_id, name);
CREATE INDEX IF NOT EXISTS idx_tests_rig ON tests(rig_id, name);
"#;
