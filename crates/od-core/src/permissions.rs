//! Write-permission resolution for organizations and categories.
//!
//! This is a pure predicate over already-loaded data: the caller fetches the
//! staff profile and its curatorship links once and passes them in. Read
//! operations never go through the resolver.

use crate::staff::{Position, Role};
use uuid::Uuid;

/// The curatorship data the resolver needs from one link.
#[derive(Debug, Clone, Copy)]
pub struct CuratorLink {
    pub organization_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub can_edit: bool,
}

/// The slice of a staff profile relevant to permission checks.
#[derive(Debug, Clone)]
pub struct StaffView {
    pub role: Role,
    pub position: Position,
    pub links: Vec<CuratorLink>,
}

impl StaffView {
    pub fn new(role: Role, position: Position) -> Self {
        Self {
            role,
            position,
            links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<CuratorLink>) -> Self {
        self.links = links;
        self
    }

    /// True for roles and positions that bypass curatorship checks.
    pub fn is_admin_like(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager) || self.position == Position::Director
    }

    fn has_any_edit_link(&self) -> bool {
        self.links.iter().any(|l| l.can_edit)
    }

    fn has_edit_link_for(&self, organization_id: Option<Uuid>, category_id: Uuid) -> bool {
        self.links.iter().any(|l| {
            l.can_edit
                && (l.category_id == Some(category_id)
                    || (organization_id.is_some() && l.organization_id == organization_id))
        })
    }
}

/// A write target: an organization (with its category) or a bare category.
#[derive(Debug, Clone, Copy)]
pub enum WriteTarget {
    Organization { id: Uuid, category_id: Uuid },
    Category { id: Uuid },
}

impl WriteTarget {
    pub fn organization(org: &crate::Organization) -> Self {
        WriteTarget::Organization {
            id: org.id,
            category_id: org.category_id,
        }
    }

    pub fn category(cat: &crate::Category) -> Self {
        WriteTarget::Category { id: cat.id }
    }
}

/// Decides whether `staff` may write to `target`.
///
/// Rule precedence, first match wins:
/// 1. admin or manager role, or director position, is always allowed;
/// 2. a deputy director is allowed if any editable curatorship exists (their
///    management scope is expressed purely through assigned curatorships);
/// 3. everyone else needs an editable link to the organization itself or to
///    the organization's category (for a category target: to that category).
///
/// A caller without a staff profile is denied all writes.
pub fn can_edit(staff: Option<&StaffView>, target: &WriteTarget) -> bool {
    let Some(staff) = staff else {
        return false;
    };

    if staff.is_admin_like() {
        return true;
    }

    if staff.position == Position::DeputyDirector {
        return staff.has_any_edit_link();
    }

    match *target {
        WriteTarget::Organization { id, category_id } => {
            staff.has_edit_link_for(Some(id), category_id)
        }
        WriteTarget::Category { id } => staff.has_edit_link_for(None, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org_target() -> (Uuid, Uuid, WriteTarget) {
        let org = Uuid::new_v4();
        let cat = Uuid::new_v4();
        (
            org,
            cat,
            WriteTarget::Organization {
                id: org,
                category_id: cat,
            },
        )
    }

    fn org_link(org: Uuid, can_edit: bool) -> CuratorLink {
        CuratorLink {
            organization_id: Some(org),
            category_id: None,
            can_edit,
        }
    }

    fn cat_link(cat: Uuid, can_edit: bool) -> CuratorLink {
        CuratorLink {
            organization_id: None,
            category_id: Some(cat),
            can_edit,
        }
    }

    #[test]
    fn missing_profile_is_denied() {
        let (_, _, target) = org_target();
        assert!(!can_edit(None, &target));
    }

    #[test]
    fn admin_and_manager_always_allowed() {
        let (_, _, target) = org_target();
        let admin = StaffView::new(Role::Admin, Position::Employee);
        let manager = StaffView::new(Role::Manager, Position::RecordsClerk);
        assert!(can_edit(Some(&admin), &target));
        assert!(can_edit(Some(&manager), &target));
    }

    #[test]
    fn director_position_always_allowed() {
        let (_, _, target) = org_target();
        let director = StaffView::new(Role::Viewer, Position::Director);
        assert!(can_edit(Some(&director), &target));
    }

    #[test]
    fn deputy_needs_any_editable_link() {
        let (_, _, target) = org_target();
        let bare = StaffView::new(Role::Curator, Position::DeputyDirector);
        assert!(!can_edit(Some(&bare), &target));

        // Any can_edit link unlocks writes, even to an unrelated category.
        let linked = StaffView::new(Role::Curator, Position::DeputyDirector)
            .with_links(vec![cat_link(Uuid::new_v4(), true)]);
        assert!(can_edit(Some(&linked), &target));

        let read_only = StaffView::new(Role::Curator, Position::DeputyDirector)
            .with_links(vec![cat_link(Uuid::new_v4(), false)]);
        assert!(!can_edit(Some(&read_only), &target));
    }

    #[test]
    fn head_of_department_matches_org_or_category() {
        let (org, cat, target) = org_target();

        let by_org = StaffView::new(Role::Curator, Position::HeadOfDepartment)
            .with_links(vec![org_link(org, true)]);
        assert!(can_edit(Some(&by_org), &target));

        let by_cat = StaffView::new(Role::Curator, Position::HeadOfDepartment)
            .with_links(vec![cat_link(cat, true)]);
        assert!(can_edit(Some(&by_cat), &target));

        let unrelated = StaffView::new(Role::Curator, Position::HeadOfDepartment)
            .with_links(vec![org_link(Uuid::new_v4(), true)]);
        assert!(!can_edit(Some(&unrelated), &target));
    }

    #[test]
    fn viewer_without_links_denied_everywhere() {
        let (_, cat, target) = org_target();
        let viewer = StaffView::new(Role::Viewer, Position::Employee);
        assert!(!can_edit(Some(&viewer), &target));
        assert!(!can_edit(Some(&viewer), &WriteTarget::Category { id: cat }));
    }

    #[test]
    fn explicit_link_without_can_edit_denied() {
        let (org, _, target) = org_target();
        let staff = StaffView::new(Role::Curator, Position::Employee)
            .with_links(vec![org_link(org, false)]);
        assert!(!can_edit(Some(&staff), &target));
    }

    #[test]
    fn category_target_ignores_org_links() {
        let cat = Uuid::new_v4();
        let target = WriteTarget::Category { id: cat };

        let org_only = StaffView::new(Role::Curator, Position::Employee)
            .with_links(vec![org_link(Uuid::new_v4(), true)]);
        assert!(!can_edit(Some(&org_only), &target));

        let with_cat = StaffView::new(Role::Curator, Position::Employee)
            .with_links(vec![cat_link(cat, true)]);
        assert!(can_edit(Some(&with_cat), &target));
    }
}
