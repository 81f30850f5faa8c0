//! Database layer.
//!
//! SQLite and PostgreSQL backends behind repository traits, selected at
//! runtime from the connection URL.

mod audit_repo;
mod cert_letter_repo;
mod convert;
mod curatorship_repo;
mod error;
mod external_letter_repo;
mod org_repo;
mod pagination;
mod pool;
mod schema;
mod seed;
mod staff_repo;
mod structure_repo;

pub use audit_repo::{create_audit_repository, AuditFilter, AuditRepository};
pub use cert_letter_repo::{create_cert_letter_repository, CertLetterRepository};
pub use curatorship_repo::{create_curatorship_repository, CuratorshipRepository};
pub use error::DbError;
pub use external_letter_repo::{create_external_letter_repository, ExternalLetterRepository};
pub use org_repo::{
    create_category_repository, create_organization_repository, CategoryRepository,
    OrganizationRepository,
};
pub use pagination::{PaginatedResult, Pagination, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use pool::{
    create_pool, create_pool_with_options, escape_like_pattern, make_like_pattern, DbPool,
    PoolOptions,
};
pub use schema::run_migrations;
pub use seed::ensure_admin_staff;
pub use staff_repo::{
    create_department_repository, create_management_unit_repository,
    create_staff_profile_repository, DepartmentRepository, ManagementUnitRepository,
    StaffFilter, StaffProfileRepository,
};
pub use structure_repo::{
    create_org_employee_repository, create_org_unit_repository, OrgEmployeeRepository,
    OrgUnitRepository,
};
