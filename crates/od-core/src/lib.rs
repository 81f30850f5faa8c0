//! # od-core
//!
//! Core domain models and persistence for orgdesk, the internal office
//! administration backend.
//!
//! This crate holds the organization/category directory, org-structure trees,
//! the staff directory with curatorship links, the correspondence registries,
//! and the pure decision logic on top of them: the curatorship permission
//! resolver and the letter-reply statistics aggregator.

pub mod audit;
pub mod curatorship;
pub mod db;
pub mod letters;
pub mod org;
pub mod org_structure;
pub mod permissions;
pub mod slugs;
pub mod staff;
pub mod stats;

pub use audit::{changed_fields, AuditAction, AuditEntry, AuditTarget};
pub use curatorship::{validate_curatorship_target, CuratorshipError, StaffCuratorship};
pub use letters::{
    CertLetter, CertLetterFile, CertLetterReply, ExternalLetter, ExternalLetterReply,
    ExternalLettersCategory,
};
pub use org::{Category, Organization};
pub use org_structure::{build_unit_tree, OrgEmployee, OrgUnit, UnitTreeNode, UnitType};
pub use permissions::{can_edit, CuratorLink, StaffView, WriteTarget};
pub use staff::{
    validate_placement, Department, ManagementUnit, PlacementError, Position, Role, StaffProfile,
};
pub use stats::{aggregate_reply_stats, count_letters_by_month, MonthBucket, OrgReplyStats};
