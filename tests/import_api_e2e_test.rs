// ==========================================
// ImportApi 端到端测试
// ==========================================
// 测试目标: 文件导入、导入方案保存与复用、资源统计
// ==========================================


use bulk_import::api::{ApiError, ImportApi};
use bulk_import::config::ImportRunConfig;
use bulk_import::domain::RawFieldMapping;
use test_helpers::{create_test_db, literal_values, open_shared, write_csv, TEST_USER_ID};

fn csv_config() -> ImportRunConfig {
    ImportRunConfig {
        current_user_id: Some(TEST_USER_ID),
        separator: Some("|".to_string()),
        mapping: vec![
            RawFieldMapping::new("Title", &["dcterms:title"]),
            RawFieldMapping::new("Identifier", &["dcterms:identifier"]),
            RawFieldMapping::new("Creator", &["dcterms:creator"]),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_import_csv_file_skips_blank_rows() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let api = ImportApi::from_connection(conn.clone());

    let csv = write_csv(&[
        "Title,Identifier,Creator",
        "Walden,W-1,Thoreau",
        ",,",
        "Emma,E-1,Austen|Anon",
    ]);
    let summary = api
        .import_file(csv_config(), csv.path().to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(summary.counters.seen, 3);
    assert_eq!(summary.counters.skipped, 1);
    assert_eq!(summary.counters.processed, 2);
    assert_eq!(summary.counters.errors, 0);

    let emma = summary.created_ids[1];
    assert_eq!(literal_values(&conn, emma, 2), vec!["Austen", "Anon"]);
    assert_eq!(api.count_resources(Some("items")).await.unwrap(), 2);
    assert_eq!(api.count_resources(Some("media")).await.unwrap(), 0);
}

#[tokio::test]
async fn test_import_file_rejects_missing_path() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let api = ImportApi::from_connection(open_shared(&db_path));

    let result = api.import_file(csv_config(), "/no/such/file.csv").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let result = api.import_file(csv_config(), "   ").await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_profile_roundtrip_and_import_with_profile() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let api = ImportApi::from_connection(open_shared(&db_path));

    let mut profile = csv_config();
    profile.current_user_id = None;
    api.save_profile("books", &profile).unwrap();
    api.save_profile("archive", &profile).unwrap();
    assert!(api.save_profile("  ", &profile).is_err());

    let mut names = api.list_profiles().unwrap();
    names.sort();
    assert_eq!(names, vec!["archive", "books"]);

    let csv = write_csv(&["Title,Identifier", "Dune,D-1"]);
    let path = csv.path().to_str().unwrap();

    let summary = api
        .import_with_profile("books", path, Some(TEST_USER_ID))
        .await
        .unwrap();
    assert_eq!(summary.counters.processed, 1);

    let missing = api.import_with_profile("nope", path, Some(TEST_USER_ID)).await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_import_files_continues_after_failure() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let api = ImportApi::from_connection(open_shared(&db_path));

    let first = write_csv(&["Title,Identifier", "A,F-1"]);
    let second = write_csv(&["Title,Identifier", "B,F-2", "C,F-3"]);
    let files = vec![
        first.path().to_str().unwrap().to_string(),
        "/no/such/file.csv".to_string(),
        second.path().to_str().unwrap().to_string(),
    ];

    let results = api.import_files(csv_config(), &files).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().counters.processed, 1);
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().counters.processed, 2);

    assert_eq!(api.count_resources(None).await.unwrap(), 3);
    assert!(api.count_resources(Some("widgets")).await.is_err());
}
