// ==========================================
// 批量导入管道 端到端测试
// ==========================================
// 测试目标: 真实 SQLite 上验证分批、重复策略、多值拆分、关系目标、媒体导入
// ==========================================


use bulk_import::config::ImportRunConfig;
use bulk_import::domain::{
    DuplicatePolicy, IdentifierName, RawFieldMapping, ResourceType, RunCounters,
};
use bulk_import::importer::{BatchImporter, BulkImporter, Entry, VecEntrySource};
use bulk_import::logging;
use bulk_import::repository::{
    IdentifierRepositoryImpl, MetadataRepositoryImpl, ResourceWriteRepository,
    ResourceWriteRepositoryImpl,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use test_helpers::{
    create_test_db, insert_resource_with_identifier, literal_values, open_shared, TEST_USER_ID,
};

fn base_config(batch: usize, policy: DuplicatePolicy) -> ImportRunConfig {
    ImportRunConfig {
        entries_by_batch: batch,
        duplicate_policy: policy,
        current_user_id: Some(TEST_USER_ID),
        separator: Some(";".to_string()),
        mapping: vec![
            RawFieldMapping::new("Title", &["dcterms:title"]),
            RawFieldMapping::new("Identifier", &["dcterms:identifier"]),
            RawFieldMapping::new("Subject", &["dcterms:subject"]),
        ],
        ..Default::default()
    }
}

fn create_importer(conn: &Arc<Mutex<Connection>>, config: ImportRunConfig) -> BatchImporter {
    BatchImporter::new(
        config,
        Arc::new(MetadataRepositoryImpl::from_connection(conn.clone())),
        Arc::new(IdentifierRepositoryImpl::from_connection(conn.clone())),
        Arc::new(ResourceWriteRepositoryImpl::from_connection(conn.clone())),
    )
}

fn book(title: &str, identifier: &str) -> Entry {
    Entry::from_pairs([("Title", title), ("Identifier", identifier)])
}

#[tokio::test]
async fn test_seven_entries_in_batches_of_three() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);

    let entries = (1..=7)
        .map(|i| book(&format!("Book {}", i), &format!("N-{}", i)))
        .collect();
    let importer = create_importer(&conn, base_config(3, DuplicatePolicy::Reject));

    let summary = importer
        .run(&mut VecEntrySource::new(entries, None))
        .await
        .unwrap();

    assert_eq!(
        summary.counters,
        RunCounters {
            seen: 7,
            skipped: 0,
            processed: 7,
            errors: 0
        }
    );
    assert_eq!(summary.created_ids.len(), 7);
    assert!(summary.created_ids.windows(2).all(|w| w[0] < w[1]));

    let sink = ResourceWriteRepositoryImpl::from_connection(conn.clone());
    assert_eq!(sink.count_resources(Some(ResourceType::Items)).await.unwrap(), 7);
}

#[tokio::test]
async fn test_duplicate_policy_reject_and_allow() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let existing = insert_resource_with_identifier(conn.clone(), ResourceType::Items, "B-1").await;

    // 大小写不同的标识符同样视为重复
    let entries = || vec![book("Dup", "b-1"), book("Fresh", "B-2")];

    let summary = create_importer(&conn, base_config(20, DuplicatePolicy::Reject))
        .run(&mut VecEntrySource::new(entries(), None))
        .await
        .unwrap();
    assert_eq!(summary.counters.processed, 1);
    assert_eq!(summary.counters.errors, 1);
    assert!(!summary.created_ids.contains(&existing));

    let summary = create_importer(&conn, base_config(20, DuplicatePolicy::Allow))
        .run(&mut VecEntrySource::new(entries(), None))
        .await
        .unwrap();
    assert_eq!(summary.counters.processed, 2);
    assert_eq!(summary.counters.errors, 0);

    // allow 仍创建新资源，不更新已有资源
    assert_eq!(literal_values(&conn, existing, 1), Vec::<String>::new());
    let sink = ResourceWriteRepositoryImpl::from_connection(conn.clone());
    assert_eq!(sink.count_resources(None).await.unwrap(), 4);
}

#[tokio::test]
async fn test_multi_value_split_and_trimmed_title() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);

    let entries = vec![
        Entry::from_pairs([
            ("Title", "  Moby Dick \u{00a0}"),
            ("Identifier", "M-1"),
            ("Subject", "a;b; b"),
        ]),
        Entry::from_pairs([("Title", ""), ("Identifier", "M-2"), ("Subject", "")]),
    ];
    let summary = create_importer(&conn, base_config(20, DuplicatePolicy::Reject))
        .run(&mut VecEntrySource::new(entries, Some(";".to_string())))
        .await
        .unwrap();

    assert_eq!(summary.counters.processed, 2);
    let first = summary.created_ids[0];
    let second = summary.created_ids[1];

    assert_eq!(literal_values(&conn, first, 1), vec!["Moby Dick"]);
    assert_eq!(literal_values(&conn, first, 3), vec!["a", "b", "b"]);
    assert!(literal_values(&conn, second, 1).is_empty());
    assert_eq!(literal_values(&conn, second, 10), vec!["M-2"]);
}

#[tokio::test]
async fn test_empty_entries_are_counted_as_skipped() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);

    let entries = vec![
        book("One", "E-1"),
        Entry::from_pairs([("Title", "   "), ("Identifier", "")]),
        Entry::new(),
        book("Two", "E-2"),
    ];
    let summary = create_importer(&conn, base_config(20, DuplicatePolicy::Reject))
        .run(&mut VecEntrySource::new(entries, None))
        .await
        .unwrap();

    assert_eq!(
        summary.counters,
        RunCounters {
            seen: 4,
            skipped: 2,
            processed: 2,
            errors: 0
        }
    );
}

#[tokio::test]
async fn test_item_set_relation_and_unresolved_relation() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let item_set = insert_resource_with_identifier(conn.clone(), ResourceType::ItemSets, "S-1").await;

    let mut config = base_config(20, DuplicatePolicy::Reject);
    config
        .mapping
        .push(RawFieldMapping::new("Collection", &["o:item_set {dcterms:identifier}"]));

    let entries = vec![
        Entry::from_pairs([("Title", "In set"), ("Identifier", "R-1"), ("Collection", "S-1")]),
        Entry::from_pairs([("Title", "Lost"), ("Identifier", "R-2"), ("Collection", "S-404")]),
    ];
    let summary = create_importer(&conn, config)
        .run(&mut VecEntrySource::new(entries, None))
        .await
        .unwrap();

    assert_eq!(summary.counters.processed, 1);
    assert_eq!(summary.counters.errors, 1);

    let guard = conn.lock().unwrap();
    let set_id: i64 = guard
        .query_row(
            "SELECT item_set_id FROM item_item_set WHERE item_id = ?1",
            [summary.created_ids[0]],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(set_id, item_set);
}

#[tokio::test]
async fn test_missing_current_user_aborts_run() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);

    let mut config = base_config(20, DuplicatePolicy::Reject);
    config.current_user_id = None;
    let result = create_importer(&conn, config)
        .run(&mut VecEntrySource::new(vec![book("A", "X-1")], None))
        .await;

    assert!(result.is_err());
    let sink = ResourceWriteRepositoryImpl::from_connection(conn.clone());
    assert_eq!(sink.count_resources(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_media_run_with_parent_item_and_source_duplicates() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let parent = insert_resource_with_identifier(conn.clone(), ResourceType::Items, "I-1").await;
    insert_resource_with_identifier(conn.clone(), ResourceType::Media, "http://x/a.jpg").await;

    let config = ImportRunConfig {
        resource_type: ResourceType::Media,
        identifier_names: vec![IdentifierName::Name("url".to_string())],
        current_user_id: Some(TEST_USER_ID),
        mapping: vec![
            RawFieldMapping::new("Ingester", &["o:ingester"]),
            RawFieldMapping::new("Source", &["o:source"]),
            RawFieldMapping::new("Item", &["o:item {dcterms:identifier}"]),
        ],
        ..Default::default()
    };
    let media = |source: &str, item: &str| {
        Entry::from_pairs([("Ingester", "url"), ("Source", source), ("Item", item)])
    };
    let entries = vec![
        media("http://x/b.jpg", "I-1"),
        // 大小写不同的已有来源
        media("HTTP://X/A.JPG", "I-1"),
        media("http://x/c.jpg", "nope"),
    ];

    let summary = create_importer(&conn, config)
        .run(&mut VecEntrySource::new(entries, None))
        .await
        .unwrap();

    assert_eq!(
        summary.counters,
        RunCounters {
            seen: 3,
            skipped: 0,
            processed: 1,
            errors: 2
        }
    );

    let guard = conn.lock().unwrap();
    let (item_id, ingester, source): (Option<i64>, String, String) = guard
        .query_row(
            "SELECT item_id, ingester, source FROM media WHERE id = ?1",
            [summary.created_ids[0]],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(item_id, Some(parent));
    assert_eq!(ingester, "url");
    assert_eq!(source, "http://x/b.jpg");
}

#[tokio::test]
async fn test_unusable_identifier_names_skip_duplicate_check() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    insert_resource_with_identifier(conn.clone(), ResourceType::Items, "B-1").await;

    let mut config = base_config(20, DuplicatePolicy::Reject);
    config.identifier_names = vec![IdentifierName::Name("bogus".to_string())];

    let summary = create_importer(&conn, config)
        .run(&mut VecEntrySource::new(vec![book("Dup", "B-1")], None))
        .await
        .unwrap();

    assert_eq!(summary.counters.processed, 1);
    assert_eq!(summary.counters.errors, 0);
    let sink = ResourceWriteRepositoryImpl::from_connection(conn.clone());
    assert_eq!(sink.count_resources(Some(ResourceType::Items)).await.unwrap(), 2);
}
