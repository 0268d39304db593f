//! Integration tests for the catalog service against an on-disk database
//!
//! Walks the create / read / patch / list flow for every entity kind and
//! checks that the relation tables track plan writes.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;
use video_catalog::db::entities::UpsertOutcome;
use video_catalog::db::plan_query::PlanFilter;
use video_catalog::db::relations;
use video_catalog::model::{ChapterRangePlan, DirectPlan, DiscSource, MovieWork, Plan, Source, Work};
use video_catalog::views::{
    ChapterRangePlanInputView, DirectPlanInputView, DiscSourceInputView, FileSourceInputView,
    MovieEditionInputView, MovieWorkInputView,
};
use video_catalog::{CatalogDb, CatalogError, CatalogService};

/// Helper to create a service over a temporary database file
fn create_service() -> (CatalogService, Arc<CatalogDb>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Arc::new(CatalogDb::open(&temp_dir.path().join("catalog.db")).unwrap());
    (CatalogService::new(db.clone()), db, temp_dir)
}

fn input<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).unwrap()
}

fn put_file(service: &CatalogService, path: &str) -> Uuid {
    let id = Uuid::new_v4();
    let source = input::<FileSourceInputView>(json!({ "path": path }))
        .into_source()
        .unwrap();
    service.put_source(id, source).unwrap();
    id
}

fn put_movie(service: &CatalogService, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    let work = input::<MovieWorkInputView>(json!({ "title": title }))
        .into_work()
        .unwrap();
    service.put_work(id, work).unwrap();
    id
}

fn put_direct(service: &CatalogService, id: Uuid, source: Uuid, work: Uuid) -> UpsertOutcome {
    let plan = input::<DirectPlanInputView>(json!({ "sourceUuid": source, "workUuid": work }))
        .into_plan()
        .unwrap();
    service.put_plan(id, plan).unwrap()
}

#[test]
fn test_work_lifecycle() {
    let (service, _db, _temp) = create_service();
    let id = Uuid::new_v4();

    let work = input::<MovieWorkInputView>(json!({"title": "Alien", "releaseYear": 1979, "tmdbId": 348}))
        .into_work()
        .unwrap();
    assert_eq!(service.put_work(id, work).unwrap(), UpsertOutcome::Created);

    let patch = input::<MovieWorkInputView>(json!({"title": "Alien (1979)", "tmdbId": null}))
        .into_patch()
        .unwrap();
    service.patch_work(id, patch).unwrap();

    assert_eq!(
        service.get_work(id).unwrap(),
        Work::Movie(MovieWork {
            title: "Alien (1979)".into(),
            release_year: Some(1979),
            tmdb_id: None,
        })
    );

    // The kind cannot change afterwards, by PUT or by PATCH
    let edition = input::<MovieEditionInputView>(json!({"editionType": "Director's Cut"}));
    assert!(matches!(
        service.put_work(id, edition.clone().into_work().unwrap()),
        Err(CatalogError::KindConflict { .. })
    ));
    assert!(matches!(
        service.patch_work(id, edition.into_patch().unwrap()),
        Err(CatalogError::KindConflict { .. })
    ));
    assert!(matches!(service.get_work(id).unwrap(), Work::Movie(_)));
}

#[test]
fn test_disc_source_lifecycle() {
    let (service, _db, _temp) = create_service();
    let id = Uuid::new_v4();

    let source = input::<DiscSourceInputView>(json!({"origDirName": "ALIEN_D1", "path": "/rips/alien"}))
        .into_source()
        .unwrap();
    assert_eq!(service.put_source(id, source).unwrap(), UpsertOutcome::Created);

    let patch = input::<DiscSourceInputView>(json!({"allFilesAdded": true}))
        .into_patch()
        .unwrap();
    service.patch_source(id, patch).unwrap();

    assert_eq!(
        service.get_source(id).unwrap(),
        Source::Disc(DiscSource {
            orig_dir_name: "ALIEN_D1".into(),
            path: "/rips/alien".into(),
            all_files_added: true,
        })
    );
}

#[test]
fn test_plan_relations_follow_writes() {
    let (service, db, _temp) = create_service();
    let source_a = put_file(&service, "/a.mkv");
    let source_b = put_file(&service, "/b.mkv");
    let work_a = put_movie(&service, "A");
    let work_b = put_movie(&service, "B");
    let plan_id = Uuid::new_v4();

    let plan = input::<ChapterRangePlanInputView>(json!({
        "sourceUuid": source_a,
        "workUuid": work_a,
        "startChapter": 1,
        "endChapter": 12,
    }))
    .into_plan()
    .unwrap();
    assert_eq!(service.put_plan(plan_id, plan).unwrap(), UpsertOutcome::Created);

    // Patching only the work replaces plan_outputs and leaves plan_inputs alone
    let patch = input::<ChapterRangePlanInputView>(json!({"workUuid": work_b, "startChapter": null}))
        .into_patch()
        .unwrap();
    service.patch_plan(plan_id, patch).unwrap();

    let (inputs, outputs) = db
        .with_conn(|conn| {
            Ok((
                relations::plan_input_ids(conn, plan_id)?,
                relations::plan_output_ids(conn, plan_id)?,
            ))
        })
        .unwrap();
    assert_eq!(inputs, vec![source_a]);
    assert_eq!(outputs, vec![work_b]);

    assert_eq!(
        service.get_plan(plan_id).unwrap(),
        Plan::ChapterRange(ChapterRangePlan {
            source_uuid: source_a,
            work_uuid: work_b,
            start_chapter: None,
            end_chapter: Some(12),
        })
    );

    // Listing by the old work no longer finds the plan; the new one does
    let by_old = PlanFilter { source_id: None, work_id: Some(work_a) };
    assert!(service.list_plans(&by_old, None, 50).unwrap().plans.is_empty());
    let by_new = PlanFilter { source_id: Some(source_a), work_id: Some(work_b) };
    assert_eq!(service.list_plans(&by_new, None, 50).unwrap().plans.len(), 1);

    // Wrong-kind patch on a plan conflicts and changes nothing
    let patch = input::<DirectPlanInputView>(json!({"sourceUuid": source_b}))
        .into_patch()
        .unwrap();
    assert!(matches!(
        service.patch_plan(plan_id, patch),
        Err(CatalogError::KindConflict { table: "plans", .. })
    ));
    let inputs = db.with_conn(|conn| relations::plan_input_ids(conn, plan_id)).unwrap();
    assert_eq!(inputs, vec![source_a]);
}

#[test]
fn test_failed_plan_write_leaves_nothing_behind() {
    let (service, db, _temp) = create_service();
    let source = put_file(&service, "/a.mkv");
    let plan_id = Uuid::new_v4();

    let plan = Plan::Direct(DirectPlan {
        source_uuid: source,
        work_uuid: Uuid::new_v4(),
    });
    let err = service.put_plan(plan_id, plan).unwrap_err();
    assert!(err.is_storage());

    assert!(matches!(service.get_plan(plan_id), Err(CatalogError::NotFound { .. })));
    let inputs = db.with_conn(|conn| relations::plan_input_ids(conn, plan_id)).unwrap();
    assert!(inputs.is_empty());
}

#[test]
fn test_paging_through_filtered_plans() {
    let (service, _db, _temp) = create_service();
    let source = put_file(&service, "/a.mkv");
    let other_source = put_file(&service, "/b.mkv");
    let work = put_movie(&service, "A");

    let mut expected: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();
    for id in &expected {
        assert_eq!(put_direct(&service, *id, source, work), UpsertOutcome::Created);
    }
    put_direct(&service, Uuid::new_v4(), other_source, work);
    expected.sort();

    let filter = PlanFilter { source_id: Some(source), work_id: None };
    let mut seen = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0;
    loop {
        let page = service.list_plans(&filter, token.as_deref(), 3).unwrap();
        pages += 1;
        seen.extend(page.plans.into_iter().map(|p| p.uuid));
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen, expected);
}

#[test]
fn test_reopen_keeps_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.db");
    let work_id;

    {
        let service = CatalogService::new(Arc::new(CatalogDb::open(&path).unwrap()));
        work_id = put_movie(&service, "Persisted");
    }

    let service = CatalogService::new(Arc::new(CatalogDb::open(&path).unwrap()));
    assert!(matches!(service.get_work(work_id).unwrap(), Work::Movie(m) if m.title == "Persisted"));
    assert_eq!(service.stats().unwrap().work_count, 1);
}

#[test]
fn test_concurrent_upserts_create_once() {
    let (service, _db, _temp) = create_service();
    let service = Arc::new(service);
    let id = Uuid::new_v4();

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let service = service.clone();
            std::thread::spawn(move || {
                let work = input::<MovieWorkInputView>(json!({ "title": format!("Take {}", n) }))
                    .into_work()
                    .unwrap();
                service.put_work(id, work).unwrap()
            })
        })
        .collect();

    let outcomes: Vec<UpsertOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let created = outcomes.iter().filter(|o| **o == UpsertOutcome::Created).count();
    assert_eq!(created, 1);
    assert_eq!(outcomes.len() - created, 15);
    assert_eq!(service.stats().unwrap().work_count, 1);
}
