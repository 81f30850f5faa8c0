//! Internal structure of tracked organizations: units and their employees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum nesting of the unit tree; deeper links are cut off rather than
/// followed, which also makes cyclic parent data harmless.
pub const MAX_TREE_DEPTH: usize = 20;

/// Kind of a structural unit inside a tracked organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Board,
    Management,
    Department,
    Division,
    Branch,
    Other,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Board => "board",
            UnitType::Management => "management",
            UnitType::Department => "department",
            UnitType::Division => "division",
            UnitType::Branch => "branch",
            UnitType::Other => "other",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "board" => Ok(UnitType::Board),
            "management" => Ok(UnitType::Management),
            "department" => Ok(UnitType::Department),
            "division" => Ok(UnitType::Division),
            "branch" => Ok(UnitType::Branch),
            "other" => Ok(UnitType::Other),
            other => Err(format!("unknown unit type: {other}")),
        }
    }
}

/// A structural unit of one tracked organization. Units form a tree via
/// `parent_id`; a unit without a parent is a root of that organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgUnit {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub unit_type: UnitType,
    /// Siblings are ordered by this first, then by name.
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl OrgUnit {
    pub fn new(organization_id: Uuid, name: impl Into<String>, unit_type: UnitType) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            parent_id: None,
            name: name.into(),
            unit_type,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }
}

/// Partial update for an org unit.
#[derive(Debug, Clone, Default)]
pub struct OrgUnitUpdate {
    pub parent_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    pub unit_type: Option<UnitType>,
    pub sort_order: Option<i32>,
}

/// A person inside a tracked organization. This is contact-book data about
/// outside counterparts, unrelated to the office's own staff. An employee
/// belongs to an organization and may additionally be placed in one of its
/// units; without a unit they stay off the unit tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgEmployee {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub full_name: String,
    pub position_title: String,
    pub work_phone: String,
    pub email: String,
    pub lotus: String,
    /// Heads are listed before other employees of the same unit.
    pub is_head: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl OrgEmployee {
    pub fn new(organization_id: Uuid, full_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            unit_id: None,
            full_name: full_name.into(),
            position_title: String::new(),
            work_phone: String::new(),
            email: String::new(),
            lotus: String::new(),
            is_head: false,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }
}

/// Partial update for an org employee.
#[derive(Debug, Clone, Default)]
pub struct OrgEmployeeUpdate {
    /// An explicit `None` inside detaches the employee from their unit.
    pub unit_id: Option<Option<Uuid>>,
    pub full_name: Option<String>,
    pub position_title: Option<String>,
    pub work_phone: Option<String>,
    pub email: Option<String>,
    pub lotus: Option<String>,
    pub is_head: Option<bool>,
    pub sort_order: Option<i32>,
}

/// One node of the rendered unit tree.
#[derive(Debug, Clone, Serialize)]
pub struct UnitTreeNode {
    pub id: Uuid,
    pub name: String,
    pub unit_type: UnitType,
    pub employees: Vec<OrgEmployee>,
    pub children: Vec<UnitTreeNode>,
}

/// Assembles the unit tree for one organization.
///
/// Roots are units without a parent, plus units whose parent is not in the
/// input set (orphans surface at the top instead of silently vanishing).
/// Children are ordered by `sort_order` then name; employees are attached to
/// their unit with heads first, then by full name. Nesting stops at
/// [`MAX_TREE_DEPTH`].
pub fn build_unit_tree(units: &[OrgUnit], employees: &[OrgEmployee]) -> Vec<UnitTreeNode> {
    let known: HashSet<Uuid> = units.iter().map(|u| u.id).collect();

    let mut children_of: HashMap<Option<Uuid>, Vec<&OrgUnit>> = HashMap::new();
    for unit in units {
        let key = match unit.parent_id {
            Some(p) if known.contains(&p) => Some(p),
            _ => None,
        };
        children_of.entry(key).or_default().push(unit);
    }
    for siblings in children_of.values_mut() {
        siblings.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
    }

    let mut staff_of: HashMap<Uuid, Vec<OrgEmployee>> = HashMap::new();
    for emp in employees {
        // Employees not placed in any unit are absent from the tree.
        if let Some(unit_id) = emp.unit_id {
            staff_of.entry(unit_id).or_default().push(emp.clone());
        }
    }
    for members in staff_of.values_mut() {
        members.sort_by(|a, b| {
            b.is_head
                .cmp(&a.is_head)
                .then(a.sort_order.cmp(&b.sort_order))
                .then(a.full_name.cmp(&b.full_name))
        });
    }

    let mut visited = HashSet::new();
    build_level(None, &children_of, &mut staff_of, &mut visited, 0)
}

fn build_level(
    parent: Option<Uuid>,
    children_of: &HashMap<Option<Uuid>, Vec<&OrgUnit>>,
    staff_of: &mut HashMap<Uuid, Vec<OrgEmployee>>,
    visited: &mut HashSet<Uuid>,
    depth: usize,
) -> Vec<UnitTreeNode> {
    if depth >= MAX_TREE_DEPTH {
        return Vec::new();
    }
    let Some(siblings) = children_of.get(&parent) else {
        return Vec::new();
    };
    let mut nodes = Vec::with_capacity(siblings.len());
    for unit in siblings {
        if !visited.insert(unit.id) {
            continue;
        }
        nodes.push(UnitTreeNode {
            id: unit.id,
            name: unit.name.clone(),
            unit_type: unit.unit_type,
            employees: staff_of.remove(&unit.id).unwrap_or_default(),
            children: build_level(Some(unit.id), children_of, staff_of, visited, depth + 1),
        });
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(org: Uuid, name: &str, parent: Option<Uuid>, sort: i32) -> OrgUnit {
        let mut u = OrgUnit::new(org, name, UnitType::Department);
        u.parent_id = parent;
        u.sort_order = sort;
        u
    }

    #[test]
    fn unit_type_round_trip() {
        for t in [
            UnitType::Board,
            UnitType::Management,
            UnitType::Department,
            UnitType::Division,
            UnitType::Branch,
            UnitType::Other,
        ] {
            assert_eq!(t.as_str().parse::<UnitType>().unwrap(), t);
        }
    }

    #[test]
    fn tree_nests_and_orders_siblings() {
        let org = Uuid::new_v4();
        let root = unit(org, "Board", None, 0);
        let second = unit(org, "Audit", Some(root.id), 2);
        let first = unit(org, "Credit", Some(root.id), 1);
        let leaf = unit(org, "Retail", Some(first.id), 0);

        let tree = build_unit_tree(&[root.clone(), second, first.clone(), leaf], &[]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "Board");
        let names: Vec<_> = tree[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Credit", "Audit"]);
        assert_eq!(tree[0].children[0].children[0].name, "Retail");
    }

    #[test]
    fn orphan_units_surface_as_roots() {
        let org = Uuid::new_v4();
        let orphan = unit(org, "Lost", Some(Uuid::new_v4()), 0);
        let tree = build_unit_tree(&[orphan], &[]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "Lost");
    }

    fn placed(org: Uuid, unit: Uuid, name: &str) -> OrgEmployee {
        let mut e = OrgEmployee::new(org, name);
        e.unit_id = Some(unit);
        e
    }

    #[test]
    fn employees_attach_heads_first() {
        let org = Uuid::new_v4();
        let u = unit(org, "Board", None, 0);
        let mut head = placed(org, u.id, "Zorina Anna");
        head.is_head = true;
        let other = placed(org, u.id, "Belov Ivan");

        let tree = build_unit_tree(&[u], &[other, head]);
        let staff = &tree[0].employees;
        assert_eq!(staff.len(), 2);
        assert!(staff[0].is_head);
        assert_eq!(staff[0].full_name, "Zorina Anna");
        assert_eq!(staff[1].full_name, "Belov Ivan");
    }

    #[test]
    fn unplaced_employees_stay_off_the_tree() {
        let org = Uuid::new_v4();
        let u = unit(org, "Board", None, 0);
        let unplaced = OrgEmployee::new(org, "Gulyamov Timur");
        let member = placed(org, u.id, "Belov Ivan");

        let tree = build_unit_tree(&[u], &[unplaced, member]);
        assert_eq!(tree[0].employees.len(), 1);
        assert_eq!(tree[0].employees[0].full_name, "Belov Ivan");
    }

    #[test]
    fn cyclic_parents_do_not_hang() {
        let org = Uuid::new_v4();
        let mut a = unit(org, "A", None, 0);
        let mut b = unit(org, "B", None, 0);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);

        // Both parents exist, so neither unit keys under the root; the tree
        // is empty but the call must terminate.
        let tree = build_unit_tree(&[a, b], &[]);
        assert!(tree.is_empty());
    }

    #[test]
    fn depth_is_capped() {
        let org = Uuid::new_v4();
        let mut units = Vec::new();
        let mut parent = None;
        for i in 0..(MAX_TREE_DEPTH + 5) {
            let u = unit(org, &format!("U{i}"), parent, 0);
            parent = Some(u.id);
            units.push(u);
        }
        let tree = build_unit_tree(&units, &[]);
        let mut depth = 0;
        let mut level = &tree;
        while let Some(node) = level.first() {
            depth += 1;
            level = &node.children;
        }
        assert_eq!(depth, MAX_TREE_DEPTH);
    }
}
