use ahash::AHashSet;
use lineagegraph::{
    Edge, EdgeType, GraphStore, InMemoryLineageStore, LineageDirection, LineageError, Node,
    NodeType, SqliteLineageStore, StoreConfig, UNLIMITED_DEPTH,
};

fn names(items: &[&str]) -> AHashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sample_store() -> SqliteLineageStore {
    let store = SqliteLineageStore::open_in_memory().expect("store");
    for name in ["a", "b", "c", "d"] {
        store
            .insert_node(&Node::new(name, NodeType::Table))
            .expect("insert node");
    }
    store
        .insert_edge(&Edge::new("a", "b", EdgeType::Derives))
        .unwrap();
    store
        .insert_edge(&Edge::new("c", "b", EdgeType::Aggregates))
        .unwrap();
    store
        .insert_edge(&Edge::new("b", "d", EdgeType::Copies))
        .unwrap();
    store
}

#[test]
fn test_node_round_trips_metadata() {
    let store = SqliteLineageStore::open_in_memory().unwrap();
    let node = Node::new("warehouse.orders", NodeType::Dataset)
        .with_owner("alice")
        .with_team("commerce")
        .with_description("order facts")
        .with_tag("pii")
        .with_tag("gold");
    store.insert_node(&node).unwrap();
    let loaded = store.find_node("warehouse.orders").unwrap().expect("node");
    assert_eq!(loaded.node_type, NodeType::Dataset);
    assert_eq!(loaded.owner.as_deref(), Some("alice"));
    assert_eq!(loaded.team.as_deref(), Some("commerce"));
    assert_eq!(loaded.description.as_deref(), Some("order facts"));
    assert_eq!(
        loaded.tags.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["gold", "pii"]
    );
    assert_eq!(loaded.created_at, node.created_at);
    assert!(store.exists_node("warehouse.orders").unwrap());
    assert!(store.find_node("warehouse.missing").unwrap().is_none());
}

#[test]
fn test_duplicate_and_blank_nodes_are_rejected() {
    let store = SqliteLineageStore::open_in_memory().unwrap();
    store.insert_node(&Node::new("a", NodeType::Table)).unwrap();
    let err = store
        .insert_node(&Node::new("a", NodeType::View))
        .expect_err("duplicate");
    assert!(matches!(err, LineageError::InvalidInput(_)));
    assert!(store.insert_node(&Node::new(" ", NodeType::View)).is_err());
}

#[test]
fn test_update_node_changes_metadata_and_timestamp() {
    let store = SqliteLineageStore::open_in_memory().unwrap();
    let node = Node::new("a", NodeType::Table);
    store.insert_node(&node).unwrap();
    let edited = node.clone().with_owner("bob").with_tag("deprecated");
    store.update_node(&edited).unwrap();
    let loaded = store.find_node("a").unwrap().unwrap();
    assert_eq!(loaded.owner.as_deref(), Some("bob"));
    assert!(loaded.tags.contains("deprecated"));
    assert!(loaded.updated_at >= node.updated_at);
    assert_eq!(loaded.created_at, node.created_at);

    let err = store
        .update_node(&Node::new("ghost", NodeType::Table))
        .expect_err("missing");
    assert!(matches!(err, LineageError::NotFound(_)));
}

#[test]
fn test_edges_require_registered_endpoints() {
    let store = sample_store();
    let err = store
        .insert_edge(&Edge::new("a", "zzz", EdgeType::Derives))
        .expect_err("dangling");
    assert!(matches!(err, LineageError::InvalidInput(_)));
}

#[test]
fn test_batched_lookups_by_sources_and_targets() {
    let store = sample_store();
    let by_target = store.find_edges_by_targets(&names(&["b"])).unwrap();
    let mut sources: Vec<&str> = by_target.iter().map(|e| e.source.as_str()).collect();
    sources.sort();
    assert_eq!(sources, vec!["a", "c"]);

    let by_source = store.find_edges_by_sources(&names(&["a", "b", "d"])).unwrap();
    let mut pairs: Vec<(&str, &str)> = by_source
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    pairs.sort();
    assert_eq!(pairs, vec![("a", "b"), ("b", "d")]);

    assert!(store.find_edges_by_sources(&AHashSet::new()).unwrap().is_empty());
}

#[test]
fn test_connected_edges_sorted_by_source_then_target() {
    let store = sample_store();
    let edges = store.find_connected_edges("b").unwrap();
    let pairs: Vec<(&str, &str)> = edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert_eq!(pairs, vec![("a", "b"), ("b", "d"), ("c", "b")]);
}

#[test]
fn test_soft_delete_hides_edge_everywhere() {
    let store = sample_store();
    assert_eq!(store.delete_edge("a", "b", EdgeType::Derives).unwrap(), 1);
    assert!(store.find_edges_by_sources(&names(&["a"])).unwrap().is_empty());
    assert!(
        store
            .find_connected_edges("a")
            .unwrap()
            .iter()
            .all(|e| e.target != "b")
    );
    assert_eq!(store.counts().unwrap(), (4, 2));

    let err = store
        .delete_edge("a", "b", EdgeType::Derives)
        .expect_err("already deleted");
    assert!(matches!(err, LineageError::NotFound(_)));
}

#[test]
fn test_delete_edge_only_matches_its_type() {
    let store = sample_store();
    store
        .insert_edge(&Edge::new("a", "b", EdgeType::References))
        .unwrap();
    store.delete_edge("a", "b", EdgeType::Derives).unwrap();
    let remaining = store.find_edges_by_sources(&names(&["a"])).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].edge_type, EdgeType::References);
}

#[test]
fn test_referenced_node_cannot_be_deleted() {
    let store = sample_store();
    let err = store.delete_node("b").expect_err("referenced");
    assert!(matches!(err, LineageError::InvalidInput(_)));

    store.delete_edge("a", "b", EdgeType::Derives).unwrap();
    store.delete_edge("c", "b", EdgeType::Aggregates).unwrap();
    store.delete_edge("b", "d", EdgeType::Copies).unwrap();
    store.delete_node("b").expect("unreferenced");
    assert!(!store.exists_node("b").unwrap());
    assert!(matches!(
        store.delete_node("b"),
        Err(LineageError::NotFound(_))
    ));
}

#[test]
fn test_find_nodes_skips_unknown_names() {
    let store = sample_store();
    store.reset_metrics();
    let nodes = store
        .find_nodes(&["d".to_string(), "x".to_string(), "a".to_string()])
        .unwrap();
    let found: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(found, vec!["a", "d"]);
    assert_eq!(store.metrics_snapshot().node_lookups, 1);
}

#[test]
fn test_list_node_names_is_sorted() {
    let store = sample_store();
    assert_eq!(store.list_node_names().unwrap(), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_file_backed_store_persists_between_opens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lineage.db");
    {
        let store = SqliteLineageStore::open(&path).unwrap();
        store.insert_node(&Node::new("src", NodeType::Table)).unwrap();
        store.insert_node(&Node::new("dst", NodeType::View)).unwrap();
        store
            .insert_edge(&Edge::new("src", "dst", EdgeType::Transforms))
            .unwrap();
    }
    let config = StoreConfig::file(path.to_string_lossy().to_string());
    let reopened = SqliteLineageStore::from_config(&config).unwrap();
    let graph = reopened
        .lineage()
        .get_lineage_graph("dst", LineageDirection::Upstream, UNLIMITED_DEPTH)
        .unwrap();
    assert_eq!(graph.total_upstream, 1);
    assert_eq!(graph.edges[0].edge_type, EdgeType::Transforms);
}

#[test]
fn test_memory_store_mutation_rules() {
    let store = InMemoryLineageStore::new();
    store.insert_node(&Node::new("a", NodeType::Table)).unwrap();
    store.insert_node(&Node::new("b", NodeType::Table)).unwrap();
    assert!(store.insert_node(&Node::new("a", NodeType::View)).is_err());
    assert!(
        store
            .insert_edge(&Edge::new("a", "missing", EdgeType::Derives))
            .is_err()
    );
    store
        .insert_edge(&Edge::new("a", "b", EdgeType::Derives))
        .unwrap();
    assert!(store.delete_node("a").is_err());
    assert_eq!(store.delete_edge("a", "b", EdgeType::Derives).unwrap(), 1);
    assert!(store.find_connected_edges("a").unwrap().is_empty());
    store.delete_node("a").unwrap();
    assert_eq!(store.list_node_names(), vec!["b".to_string()]);

    let edited = Node::new("b", NodeType::Metric).with_owner("carol");
    store.update_node(&edited).unwrap();
    let loaded = store.find_node("b").unwrap().unwrap();
    assert_eq!(loaded.node_type, NodeType::Metric);
    assert_eq!(loaded.owner.as_deref(), Some("carol"));
}
