//! Integration tests for TOML plan import.

use chrono::FixedOffset;

use gmao_core::import::{PlanImportError, import_plans, parse_plan_file};
use gmao_db::models::FrequencyUnit;
use gmao_db::queries::plans;
use gmao_test_utils::fixtures::{seed_asset, utc_date};
use gmao_test_utils::{create_test_db, drop_test_db};

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

#[tokio::test]
async fn imports_plans_with_resolved_assets() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "CMP-01").await;

    let drafts = parse_plan_file(
        r#"
[[plan]]
code = "PM-001"
name = "Compressor oil change"
asset = "CMP-01"
frequency = 30
unit = "days"
next_due = "2025-10-01"
auto_generate = true

[[plan]]
code = "PM-002"
name = "Unscheduled draft"
"#,
        utc(),
    )
    .expect("file should parse");

    let created = import_plans(&pool, &drafts).await.expect("import should succeed");
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].asset_id, Some(asset.id));
    assert_eq!(created[0].frequency_unit, Some(FrequencyUnit::Days));
    assert_eq!(created[0].next_due, Some(utc_date(2025, 10, 1)));
    assert!(created[0].auto_generate);
    assert_eq!(created[1].asset_id, None);

    let stored = plans::list_plans(&pool).await.unwrap();
    assert_eq!(stored, created);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unknown_asset_rolls_back_the_whole_import() {
    let (pool, db_name) = create_test_db().await;
    seed_asset(&pool, "CMP-01").await;

    let drafts = parse_plan_file(
        r#"
[[plan]]
code = "PM-001"
name = "Known"
asset = "CMP-01"

[[plan]]
code = "PM-002"
name = "Unknown"
asset = "GHOST-9"
"#,
        utc(),
    )
    .unwrap();

    let err = import_plans(&pool, &drafts).await.unwrap_err();
    let import_err = err
        .downcast_ref::<PlanImportError>()
        .expect("should be an import error");
    assert!(
        matches!(import_err, PlanImportError::UnknownAssets(codes) if codes == &["GHOST-9"])
    );
    assert!(plans::list_plans(&pool).await.unwrap().is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn duplicate_code_in_database_rolls_back() {
    let (pool, db_name) = create_test_db().await;
    seed_asset(&pool, "CMP-01").await;
    let content = "[[plan]]\ncode = \"PM-001\"\nname = \"A\"\nasset = \"CMP-01\"\n";
    let drafts = parse_plan_file(content, utc()).unwrap();
    import_plans(&pool, &drafts).await.unwrap();

    let content = "[[plan]]\ncode = \"PM-002\"\nname = \"B\"\n\n[[plan]]\ncode = \"PM-001\"\nname = \"A again\"\n";
    let drafts = parse_plan_file(content, utc()).unwrap();
    assert!(import_plans(&pool, &drafts).await.is_err());

    let codes: Vec<String> = plans::list_plans(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.code)
        .collect();
    assert_eq!(codes, vec!["PM-001"]);

    pool.close().await;
    drop_test_db(&db_name).await;
}
