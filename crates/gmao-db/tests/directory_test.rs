//! Integration tests for the asset and technician directories.

use gmao_db::models::UserRole;
use gmao_db::queries::{assets, users};
use gmao_test_utils::fixtures::seed_asset;
use gmao_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn assets_by_id_and_code() {
    let (pool, db_name) = create_test_db().await;
    let pump = seed_asset(&pool, "PMP-02").await;
    let compressor = seed_asset(&pool, "CMP-01").await;

    let by_id = assets::get_asset(&pool, pump.id).await.unwrap();
    assert_eq!(by_id, Some(pump.clone()));

    let by_code = assets::get_asset_by_code(&pool, "CMP-01").await.unwrap();
    assert_eq!(by_code.map(|a| a.id), Some(compressor.id));
    assert_eq!(assets::get_asset_by_code(&pool, "NOPE").await.unwrap(), None);

    let codes: Vec<String> = assets::list_assets(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.code)
        .collect();
    assert_eq!(codes, vec!["CMP-01", "PMP-02"]);

    let duplicate = assets::insert_asset(&pool, "CMP-01", "Again", None).await;
    assert!(duplicate.is_err());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn technician_directory_filters_roles() {
    let (pool, db_name) = create_test_db().await;
    let admin = users::insert_user(&pool, "Root", None, UserRole::Admin, true)
        .await
        .unwrap();
    let tech = users::insert_user(&pool, "Ana", Some("ana@example.com"), UserRole::Technician, true)
        .await
        .unwrap();
    let lead = users::insert_user(&pool, "Lea", None, UserRole::LeadTechnician, false)
        .await
        .unwrap();

    let directory = users::list_technicians(&pool).await.unwrap();
    let ids: Vec<i64> = directory.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![tech.id, lead.id]);
    assert!(directory[0].is_assignable());
    assert!(!directory[1].is_assignable());

    let fetched = users::get_user(&pool, admin.id).await.unwrap().unwrap();
    assert_eq!(fetched.role, UserRole::Admin);
    assert!(!fetched.is_assignable());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn toggling_technician_activity() {
    let (pool, db_name) = create_test_db().await;
    let tech = users::insert_user(&pool, "Ana", None, UserRole::Technician, true)
        .await
        .unwrap();

    let off = users::set_user_active(&pool, tech.id, false).await.unwrap();
    assert!(!off.active);
    let on = users::set_user_active(&pool, tech.id, true).await.unwrap();
    assert!(on.active);

    let missing = users::set_user_active(&pool, tech.id + 999, true).await;
    assert!(missing.unwrap_err().to_string().contains("not found"));

    pool.close().await;
    drop_test_db(&db_name).await;
}
