//! Integration tests for the repository layer over in-memory SQLite.
//!
//! ```bash
//! cargo test --test repo_integration_tests
//! ```

use chrono::NaiveDate;
use od_core::db::{
    create_audit_repository, create_category_repository, create_cert_letter_repository,
    create_curatorship_repository, create_external_letter_repository,
    create_org_employee_repository, create_org_unit_repository, create_organization_repository,
    create_staff_profile_repository, run_migrations, AuditFilter, DbError, DbPool, Pagination,
};
use od_core::letters::{
    CertLetter, CertLetterFilter, CertLetterReply, ExternalLetter, ExternalLettersCategory,
};
use od_core::org::{Category, Organization, OrganizationFilter, OrganizationUpdate};
use od_core::org_structure::{OrgEmployee, OrgEmployeeUpdate, OrgUnit, UnitType};
use od_core::staff::{Position, StaffProfile, StaffProfileUpdate};
use od_core::{
    aggregate_reply_stats, AuditAction, AuditEntry, AuditTarget, StaffCuratorship,
};
use uuid::Uuid;

/// Creates a migrated in-memory SQLite pool.
async fn test_pool() -> DbPool {
    let url = format!(
        "sqlite:file:test_repo_{}?mode=memory&cache=shared",
        Uuid::new_v4()
    );
    let pool = od_core::db::create_pool(&url)
        .await
        .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to migrate");
    pool
}

async fn seed_category(pool: &DbPool, name: &str, slug: &str) -> Category {
    create_category_repository(pool)
        .create(&Category::new(name, slug))
        .await
        .expect("Failed to create category")
}

async fn seed_org(pool: &DbPool, name: &str, slug: &str, category_id: Uuid) -> Organization {
    create_organization_repository(pool)
        .create(&Organization::new(name, slug, category_id))
        .await
        .expect("Failed to create organization")
}

async fn seed_staff(pool: &DbPool) -> StaffProfile {
    let mut profile = StaffProfile::new(Uuid::new_v4());
    // Records clerk is valid without a management unit or department
    // placement.
    profile.position = Position::RecordsClerk;
    create_staff_profile_repository(pool)
        .create(&profile)
        .await
        .expect("Failed to create staff profile")
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[tokio::test]
async fn organization_crud_keeps_slug() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    let org = seed_org(&pool, "Alpha", "alpha", cat.id).await;

    let repo = create_organization_repository(&pool);
    let update = OrganizationUpdate {
        name: Some("Alpha Renamed".to_string()),
        ..Default::default()
    };
    let updated = repo.update(org.id, &update).await.expect("update failed");
    assert_eq!(updated.name, "Alpha Renamed");
    assert_eq!(updated.slug, "alpha");

    let by_slug = repo
        .get_by_slug("alpha")
        .await
        .expect("lookup failed")
        .expect("missing org");
    assert_eq!(by_slug.id, org.id);
}

#[tokio::test]
async fn organization_list_filters_by_search() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    seed_org(&pool, "Alpha Bank", "alpha-bank", cat.id).await;
    seed_org(&pool, "Beta Fund", "beta-fund", cat.id).await;

    let repo = create_organization_repository(&pool);
    let filter = OrganizationFilter {
        search: Some("alpha".to_string()),
        ..Default::default()
    };
    let page = repo
        .list(&filter, &Pagination::default())
        .await
        .expect("list failed");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Alpha Bank");
}

#[tokio::test]
async fn category_counts_track_members() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    seed_org(&pool, "Alpha", "alpha", cat.id).await;
    seed_org(&pool, "Beta", "beta", cat.id).await;

    let listed = create_category_repository(&pool)
        .list()
        .await
        .expect("list failed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].objects_count, 2);
}

#[tokio::test]
async fn curatorship_create_updates_cached_counts() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    let org = seed_org(&pool, "Alpha", "alpha", cat.id).await;
    let staff = seed_staff(&pool).await;

    let links = create_curatorship_repository(&pool);
    let link = StaffCuratorship::new(staff.id, Some(org.id), None, true).expect("invalid link");
    let created = links.create(&link).await.expect("create failed");

    let profile = create_staff_profile_repository(&pool)
        .get(staff.id)
        .await
        .expect("get failed")
        .expect("missing profile");
    assert_eq!(profile.curated_orgs_count, 1);
    assert_eq!(profile.curated_cats_count, 0);

    assert!(links.delete(created.id).await.expect("delete failed"));
    let profile = create_staff_profile_repository(&pool)
        .get(staff.id)
        .await
        .expect("get failed")
        .expect("missing profile");
    assert_eq!(profile.curated_orgs_count, 0);
}

#[tokio::test]
async fn curatorship_rejects_ambiguous_target() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    let org = seed_org(&pool, "Alpha", "alpha", cat.id).await;
    let staff = seed_staff(&pool).await;

    // Bypass the constructor so the repository validation is exercised.
    let mut link = StaffCuratorship::new(staff.id, Some(org.id), None, false).expect("invalid");
    link.category_id = Some(cat.id);

    let result = create_curatorship_repository(&pool).create(&link).await;
    assert!(matches!(result, Err(DbError::Validation { .. })));
}

#[tokio::test]
async fn curatorship_duplicate_target_is_rejected() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    let org = seed_org(&pool, "Alpha", "alpha", cat.id).await;
    let staff = seed_staff(&pool).await;

    let links = create_curatorship_repository(&pool);
    let org_link = StaffCuratorship::new(staff.id, Some(org.id), None, true).expect("invalid");
    links.create(&org_link).await.expect("create failed");

    // A second link to the same organization for the same staff member.
    let dup = StaffCuratorship::new(staff.id, Some(org.id), None, false).expect("invalid");
    let result = links.create(&dup).await;
    assert!(matches!(result, Err(DbError::Constraint(_))));

    let cat_link = StaffCuratorship::new(staff.id, None, Some(cat.id), true).expect("invalid");
    links.create(&cat_link).await.expect("create failed");

    let dup = StaffCuratorship::new(staff.id, None, Some(cat.id), true).expect("invalid");
    let result = links.create(&dup).await;
    assert!(matches!(result, Err(DbError::Constraint(_))));

    // The failed inserts must not have disturbed the cached counts.
    let profile = create_staff_profile_repository(&pool)
        .get(staff.id)
        .await
        .expect("get failed")
        .expect("missing profile");
    assert_eq!(profile.curated_orgs_count, 1);
    assert_eq!(profile.curated_cats_count, 1);
}

#[tokio::test]
async fn org_employee_placement_is_optional() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    let org = seed_org(&pool, "Alpha", "alpha", cat.id).await;

    let units = create_org_unit_repository(&pool);
    let unit = units
        .create(&OrgUnit::new(org.id, "Board", UnitType::Board))
        .await
        .expect("unit failed");

    let repo = create_org_employee_repository(&pool);
    let hired = repo
        .create(&OrgEmployee::new(org.id, "Belov Ivan"))
        .await
        .expect("create failed");
    assert_eq!(hired.unit_id, None);

    // Unplaced employees are still part of the organization listing.
    let listed = repo
        .list_for_organization(org.id)
        .await
        .expect("list failed");
    assert_eq!(listed.len(), 1);

    // Place into a unit, then detach again.
    let update = OrgEmployeeUpdate {
        unit_id: Some(Some(unit.id)),
        ..Default::default()
    };
    let placed = repo.update(hired.id, &update).await.expect("update failed");
    assert_eq!(placed.unit_id, Some(unit.id));

    let members = repo.list_for_unit(unit.id).await.expect("list failed");
    assert_eq!(members.len(), 1);

    let update = OrgEmployeeUpdate {
        unit_id: Some(None),
        ..Default::default()
    };
    let detached = repo.update(hired.id, &update).await.expect("update failed");
    assert_eq!(detached.unit_id, None);
}

#[tokio::test]
async fn staff_placement_is_validated_on_update() {
    let pool = test_pool().await;
    let staff = seed_staff(&pool).await;

    // A director is placed outside any management or department.
    let update = StaffProfileUpdate {
        position: Some(Position::Director),
        management_id: Some(Some(Uuid::new_v4())),
        ..Default::default()
    };
    let result = create_staff_profile_repository(&pool)
        .update(staff.id, &update)
        .await;
    assert!(matches!(result, Err(DbError::Validation { .. })));
}

#[tokio::test]
async fn cert_letter_destinations_replaced_on_update() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    let a = seed_org(&pool, "Alpha", "alpha", cat.id).await;
    let b = seed_org(&pool, "Beta", "beta", cat.id).await;

    let repo = create_cert_letter_repository(&pool);
    let letter = repo
        .create(&CertLetter::new("01/100", d(2025, 3, 1)), &[a.id])
        .await
        .expect("create failed");

    let dests = repo.destinations(letter.id).await.expect("dests failed");
    assert_eq!(dests.len(), 1);
    assert_eq!(dests[0].id, a.id);

    let update = od_core::letters::CertLetterUpdate {
        dest_organization_ids: Some(vec![b.id]),
        ..Default::default()
    };
    repo.update(letter.id, &update).await.expect("update failed");

    let dests = repo.destinations(letter.id).await.expect("dests failed");
    assert_eq!(dests.len(), 1);
    assert_eq!(dests[0].id, b.id);
}

#[tokio::test]
async fn cert_letter_list_filters_by_organization() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    let a = seed_org(&pool, "Alpha", "alpha", cat.id).await;
    let b = seed_org(&pool, "Beta", "beta", cat.id).await;

    let repo = create_cert_letter_repository(&pool);
    repo.create(&CertLetter::new("01/1", d(2025, 3, 1)), &[a.id])
        .await
        .expect("create failed");
    repo.create(&CertLetter::new("01/2", d(2025, 3, 2)), &[b.id])
        .await
        .expect("create failed");

    let filter = CertLetterFilter {
        organization_id: Some(a.id),
        ..Default::default()
    };
    let page = repo
        .list(&filter, &Pagination::default())
        .await
        .expect("list failed");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].number, "01/1");
}

#[tokio::test]
async fn stats_load_excludes_letters_not_needing_replies() {
    let pool = test_pool().await;
    let cat = seed_category(&pool, "Banks", "banks").await;
    let org = seed_org(&pool, "Alpha", "alpha", cat.id).await;

    let repo = create_cert_letter_repository(&pool);
    let mut tracked = CertLetter::new("01/1", d(2025, 3, 1));
    tracked.has_deadline = true;
    tracked.deadline = Some(d(2025, 3, 10));
    let tracked = repo.create(&tracked, &[org.id]).await.expect("create failed");

    let mut untracked = CertLetter::new("01/2", d(2025, 3, 2));
    untracked.need_replies = false;
    repo.create(&untracked, &[org.id]).await.expect("create failed");

    repo.add_reply(&CertLetterReply::new(
        tracked.id,
        Some(org.id),
        d(2025, 3, 9),
    ))
    .await
    .expect("reply failed");

    let letters = repo
        .list_for_stats(None, None)
        .await
        .expect("stats load failed");
    assert_eq!(letters.len(), 1);

    let stats = aggregate_reply_stats(&letters);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total, 1);
    assert_eq!(stats[0].on_time, 1);
}

#[tokio::test]
async fn external_letter_slug_lookup() {
    let pool = test_pool().await;
    let repo = create_external_letter_repository(&pool);
    let cat = repo
        .create_category(&ExternalLettersCategory::new("Regulator", "regulator"))
        .await
        .expect("category failed");

    let slug = od_core::slugs::letter_slug("Quarterly report request", "deadbeef");
    let letter = repo
        .create(&ExternalLetter::new("Quarterly report request", &slug, cat.id))
        .await
        .expect("create failed");

    let found = repo
        .get_by_slug(&slug)
        .await
        .expect("lookup failed")
        .expect("missing letter");
    assert_eq!(found.id, letter.id);
}

#[tokio::test]
async fn audit_trail_filters_by_target() {
    let pool = test_pool().await;
    let repo = create_audit_repository(&pool);

    let target_id = Uuid::new_v4();
    let entry = AuditEntry::new(
        None,
        AuditAction::Create,
        AuditTarget {
            kind: "organization".to_string(),
            id: target_id,
            label: "Alpha".to_string(),
        },
    );
    repo.append(&entry).await.expect("append failed");

    let other = AuditEntry::new(
        None,
        AuditAction::Delete,
        AuditTarget {
            kind: "category".to_string(),
            id: Uuid::new_v4(),
            label: "Banks".to_string(),
        },
    );
    repo.append(&other).await.expect("append failed");

    let filter = AuditFilter {
        target_kind: Some("organization".to_string()),
        ..Default::default()
    };
    let page = repo
        .list(&filter, &Pagination::default())
        .await
        .expect("list failed");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].target.id, target_id);
}
