use std::sync::Arc;

use tableforge::{
    BatchError, MaterializationEngine, MaterializeError, MaterializeOptions, MemoryStore,
    ResolveError, SemanticType, StoreError, TableKey, TableRegistry, TableState, Value,
    WriteMode,
};

use crate::support::{architects, buildings, init_logs, FixtureTable};

fn engine_with(registry: TableRegistry) -> (MaterializationEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = MaterializationEngine::new(Arc::new(registry), store.clone());
    (engine, store)
}

fn architects_and_buildings() -> (TableRegistry, TableKey, TableKey) {
    let mut registry = TableRegistry::new();
    let architects_key = architects().register(&mut registry);
    let buildings_key = buildings().register(&mut registry);
    (registry, architects_key, buildings_key)
}

#[tokio::test]
async fn dependencies_materialize_before_dependents() {
    init_logs();
    let (registry, architects_key, buildings_key) = architects_and_buildings();
    let (engine, store) = engine_with(registry);

    let report = engine
        .materialize(&buildings_key)
        .await
        .expect("materializes");

    assert_eq!(
        report.order,
        vec![architects_key.clone(), buildings_key.clone()]
    );
    assert_eq!(report.written, report.order);
    assert_eq!(store.write_count(), 2);
    assert_eq!(engine.state(&architects_key).await, TableState::Cached);
    assert_eq!(engine.state(&buildings_key).await, TableState::Cached);

    let installed = store.installed_foreign_keys().await;
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].table, buildings_key);
    assert_eq!(installed[0].column, "architect");
    assert_eq!(installed[0].references, architects_key);
    assert_eq!(installed[0].referenced_column, "last_name");
}

#[tokio::test]
async fn cached_tables_issue_no_second_write() {
    let (registry, architects_key, buildings_key) = architects_and_buildings();
    let (engine, store) = engine_with(registry);

    engine
        .materialize(&buildings_key)
        .await
        .expect("first run");
    let second = engine
        .materialize(&buildings_key)
        .await
        .expect("second run");

    assert_eq!(store.write_count(), 2);
    assert!(second.written.is_empty());
    assert_eq!(second.reused, vec![architects_key, buildings_key]);
}

#[tokio::test]
async fn force_rebuild_rewrites_only_the_requested_table() {
    let (registry, architects_key, buildings_key) = architects_and_buildings();
    let (engine, store) = engine_with(registry);

    engine
        .materialize(&buildings_key)
        .await
        .expect("first run");
    let rebuilt = engine
        .materialize_with(
            &buildings_key,
            MaterializeOptions {
                force_rebuild: true,
                ..Default::default()
            },
        )
        .await
        .expect("rebuild");

    assert_eq!(store.write_count(), 3);
    assert_eq!(rebuilt.written, vec![buildings_key]);
    assert_eq!(rebuilt.reused, vec![architects_key]);
}

#[tokio::test]
async fn append_mode_accumulates_rows() {
    let (registry, _, buildings_key) = architects_and_buildings();
    let (engine, store) = engine_with(registry);

    let options = MaterializeOptions {
        force_rebuild: true,
        write_mode: WriteMode::Append,
    };
    engine
        .materialize_with(&buildings_key, options)
        .await
        .expect("first append");
    engine
        .materialize_with(&buildings_key, options)
        .await
        .expect("second append");

    assert_eq!(store.row_count(&buildings_key).await, Some(8));
}

#[tokio::test]
async fn cycles_fail_before_any_write() {
    let mut registry = TableRegistry::new();
    let alpha_key = TableKey::new("test", "alpha");
    let beta_key = TableKey::new("test", "beta");
    FixtureTable::new("test", "alpha")
        .column("id", SemanticType::Integer, "")
        .column("beta_id", SemanticType::Integer, "")
        .foreign_key("beta_id", beta_key.clone(), "id")
        .register(&mut registry);
    FixtureTable::new("test", "beta")
        .column("id", SemanticType::Integer, "")
        .column("alpha_id", SemanticType::Integer, "")
        .foreign_key("alpha_id", alpha_key.clone(), "id")
        .register(&mut registry);
    let (engine, store) = engine_with(registry);

    let err = engine.materialize(&alpha_key).await.unwrap_err();
    match err {
        BatchError::Structural {
            source: ResolveError::CyclicDependency { participants },
        } => {
            assert_eq!(participants, vec![alpha_key, beta_key]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn self_reference_is_rejected_as_single_node_cycle() {
    let mut registry = TableRegistry::new();
    let employees_key = TableKey::new("test", "employees");
    FixtureTable::new("test", "employees")
        .column("employee_id", SemanticType::Integer, "")
        .column("manager", SemanticType::Integer, "")
        .foreign_key("manager", employees_key.clone(), "employee_id")
        .register(&mut registry);
    let (engine, store) = engine_with(registry);

    let err = engine.materialize(&employees_key).await.unwrap_err();
    match err {
        BatchError::Structural {
            source: ResolveError::CyclicDependency { participants },
        } => {
            assert_eq!(participants, vec![employees_key]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn missing_referenced_values_fail_constraint_installation() {
    let mut registry = TableRegistry::new();
    let architects_key = architects().register(&mut registry);
    let buildings_key = FixtureTable::new("test", "buildings")
        .column("building_id", SemanticType::Integer, "")
        .column("architect", SemanticType::String, "")
        .foreign_key(
            "architect",
            architects_key.clone(),
            "last_name",
        )
        .row(vec![
            Value::Integer(61),
            Value::String("Unknown".to_string()),
        ])
        .register(&mut registry);
    let (engine, _store) = engine_with(registry);

    let err = engine.materialize(&buildings_key).await.unwrap_err();
    match err {
        BatchError::Table {
            succeeded,
            failed,
            source: MaterializeError::ConstraintInstall { detail, .. },
            ..
        } => {
            assert_eq!(succeeded, vec![architects_key.clone()]);
            assert_eq!(failed, buildings_key.clone());
            assert!(detail.contains("no match"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The dependency stays persisted and cached.
    assert_eq!(engine.state(&architects_key).await, TableState::Cached);
    assert_eq!(engine.state(&buildings_key).await, TableState::Failed);
}

#[tokio::test]
async fn read_fetches_from_store_without_rebuilding() {
    let (registry, _, buildings_key) = architects_and_buildings();
    let (engine, store) = engine_with(registry);
    engine
        .materialize(&buildings_key)
        .await
        .expect("materializes");
    let writes_before = store.write_count();

    // A second engine over the same store has an empty cache: reads must
    // fetch, never rebuild.
    let (second_registry, _, _) = architects_and_buildings();
    let second_engine =
        MaterializationEngine::new(Arc::new(second_registry), store.clone());
    let fetched = second_engine
        .read(&buildings_key)
        .await
        .expect("fetches from store");

    assert_eq!(fetched.rows.len(), 4);
    assert_eq!(store.write_count(), writes_before);
    // The fetch does not populate the cache.
    assert_eq!(
        second_engine.state(&buildings_key).await,
        TableState::NotStarted
    );
}

#[tokio::test]
async fn read_of_never_written_table_reports_missing() {
    let (registry, _, buildings_key) = architects_and_buildings();
    let (engine, _store) = engine_with(registry);

    let err = engine.read(&buildings_key).await.unwrap_err();
    assert!(matches!(
        err,
        MaterializeError::Store {
            source: StoreError::MissingTable { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn concurrent_requests_for_the_same_table_write_once() {
    let (registry, _, buildings_key) = architects_and_buildings();
    let (engine, store) = engine_with(registry);
    let engine = Arc::new(engine);

    let first = {
        let engine = engine.clone();
        let key = buildings_key.clone();
        tokio::spawn(async move { engine.materialize(&key).await })
    };
    let second = {
        let engine = engine.clone();
        let key = buildings_key.clone();
        tokio::spawn(async move { engine.materialize(&key).await })
    };
    first.await.expect("join").expect("materializes");
    second.await.expect("join").expect("materializes");

    assert_eq!(store.write_count(), 2);
}
