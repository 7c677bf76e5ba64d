// ==========================================
// 标识符解析 集成测试
// ==========================================
// 测试目标: 真实 SQLite 上的平局裁决、类型过滤、媒体来源定位
// ==========================================


use bulk_import::domain::{IdentifierKind, IdentifierQuery, ResourceType};
use bulk_import::engine::IdentifierResolver;
use bulk_import::repository::IdentifierRepositoryImpl;
use std::sync::Arc;
use test_helpers::{create_test_db, insert_resource_with_identifier, open_shared};

const IDENTIFIER_PROPERTY: i64 = 10;

#[tokio::test]
async fn test_exact_match_beats_lower_case_insensitive_match() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);

    let lower = insert_resource_with_identifier(conn.clone(), ResourceType::Items, "foo").await;
    let upper_a = insert_resource_with_identifier(conn.clone(), ResourceType::Items, "Foo").await;
    let _upper_b = insert_resource_with_identifier(conn.clone(), ResourceType::Items, "Foo").await;

    let resolver = IdentifierResolver::new(Arc::new(IdentifierRepositoryImpl::from_connection(conn)));
    let query = IdentifierQuery::new(
        ["Foo", "foo", "FOO", "bar"],
        IdentifierKind::Property(IDENTIFIER_PROPERTY),
        Some(ResourceType::Items),
    );
    let resolution = resolver.resolve(&query).await.unwrap();

    assert_eq!(resolution.len(), 4);
    // 精确匹配中 id 最小者
    assert_eq!(resolution.get("Foo"), Some(upper_a));
    assert_eq!(resolution.get("foo"), Some(lower));
    // 无精确匹配时取大小写无关匹配中 id 最小者
    assert_eq!(resolution.get("FOO"), Some(lower));
    assert_eq!(resolution.get("bar"), None);
}

#[tokio::test]
async fn test_resource_type_filter_excludes_other_types() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);

    let set_id = insert_resource_with_identifier(conn.clone(), ResourceType::ItemSets, "K-1").await;
    let item_id = insert_resource_with_identifier(conn.clone(), ResourceType::Items, "K-1").await;
    assert!(set_id < item_id);

    let resolver = IdentifierResolver::new(Arc::new(IdentifierRepositoryImpl::from_connection(conn)));
    let kind = IdentifierKind::Property(IDENTIFIER_PROPERTY);

    let as_item = resolver
        .resolve_one("K-1", kind.clone(), Some(ResourceType::Items))
        .await
        .unwrap();
    assert_eq!(as_item, Some(item_id));

    // 抽象类型不过滤
    let any = resolver
        .resolve_one("K-1", kind, Some(ResourceType::Resources))
        .await
        .unwrap();
    assert_eq!(any, Some(set_id));
}

#[tokio::test]
async fn test_internal_ids_and_unknown_type_name() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let item_id = insert_resource_with_identifier(conn.clone(), ResourceType::Items, "I-1").await;

    let resolver = IdentifierResolver::new(Arc::new(IdentifierRepositoryImpl::from_connection(conn)));
    let item_key = item_id.to_string();

    let resolution = resolver
        .resolve(&IdentifierQuery::new(
            [item_key.as_str(), "999", "abc"],
            IdentifierKind::InternalId,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resolution.get(&item_key), Some(item_id));
    assert_eq!(resolution.get("999"), None);
    assert_eq!(resolution.get("abc"), None);

    let unknown = resolver
        .resolve_with_type_name([item_key.as_str()], IdentifierKind::InternalId, Some("widgets"))
        .await
        .unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn test_media_source_resolution_forces_media_type() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let media_id = insert_resource_with_identifier(
        conn.clone(),
        ResourceType::Media,
        "http://example.org/a.jpg",
    )
    .await;

    let resolver = IdentifierResolver::new(Arc::new(IdentifierRepositoryImpl::from_connection(conn)));
    let kind = IdentifierKind::MediaSource {
        ingester: "url".to_string(),
        item_id: None,
    };

    let found = resolver
        .resolve_one("HTTP://EXAMPLE.ORG/A.JPG", kind.clone(), None)
        .await
        .unwrap();
    assert_eq!(found, Some(media_id));

    // 媒体来源固定定位媒体，忽略条目类型过滤
    let forced = resolver
        .resolve(&IdentifierQuery::new(
            ["http://example.org/a.jpg"],
            kind,
            Some(ResourceType::Items),
        ))
        .await
        .unwrap();
    assert_eq!(forced.get("http://example.org/a.jpg"), Some(media_id));

    let html = resolver
        .resolve_one(
            "http://example.org/a.jpg",
            IdentifierKind::MediaSource {
                ingester: "html".to_string(),
                item_id: None,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(html, None);
}
