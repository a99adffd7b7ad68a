//! Users, their administrative designations, and the roles derived from them.

mod family;
mod router;
mod service;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::academics::{AcademicProgramId, CampusId, CollegeId};
use crate::store::{record, record_id, Database, StoreError};

pub use family::{FamilyMember, FamilyMemberId, FamilyMemberInput, Relationship};
pub use router::router;
pub use service::DesignationService;

record_id!(UserId);
record_id!(DesignationId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

record!(User, UserId, "user");

#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// What a designation grants authority over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DesignationScope {
    Campus(CampusId),
    College(CollegeId),
    AcademicProgram(AcademicProgramId),
}

impl DesignationScope {
    pub const fn role(self) -> Role {
        match self {
            DesignationScope::Campus(_) => Role::CampusRegistrar,
            DesignationScope::College(_) => Role::CollegeDean,
            DesignationScope::AcademicProgram(_) => Role::ProgramChair,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Designation {
    pub id: DesignationId,
    pub user_id: UserId,
    pub scope: DesignationScope,
    pub is_active: bool,
}

record!(Designation, DesignationId, "designation");

#[derive(Debug, Clone, Deserialize)]
pub struct DesignationInput {
    pub scope: DesignationScope,
    #[serde(default = "crate::academics::default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    Faculty,
    CampusRegistrar,
    CollegeDean,
    ProgramChair,
    Student,
    Guest,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Faculty => "faculty",
            Role::CampusRegistrar => "campus-registrar",
            Role::CollegeDean => "college-dean",
            Role::ProgramChair => "program-chair",
            Role::Student => "student",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Database {
    /// Sorted, de-duplicated roles; `guest` only when nothing else applies.
    pub(crate) fn roles(&self, user: &User) -> Vec<Role> {
        let mut roles = Vec::new();
        if user.is_admin {
            roles.push(Role::Admin);
        }
        if self.section_teachers.any(|row| row.user_id == user.id) {
            roles.push(Role::Faculty);
        }
        roles.extend(
            self.designations
                .filter(|row| row.user_id == user.id && row.is_active)
                .map(|row| row.scope.role()),
        );
        if self.is_student(user.id) {
            roles.push(Role::Student);
        }
        if roles.is_empty() {
            roles.push(Role::Guest);
        }
        roles.sort();
        roles.dedup();
        roles
    }

    pub(crate) fn ensure_scope_exists(&self, scope: DesignationScope) -> Result<(), StoreError> {
        match scope {
            DesignationScope::Campus(id) => self.campuses.require(id).map(|_| ()),
            DesignationScope::College(id) => self.colleges.require(id).map(|_| ()),
            DesignationScope::AcademicProgram(id) => self.programs.require(id).map(|_| ()),
        }
    }

    /// Active program-chair designations held by `user`.
    pub(crate) fn chaired_programs(&self, user: UserId) -> Vec<AcademicProgramId> {
        self.designations
            .filter(|row| row.user_id == user && row.is_active)
            .filter_map(|row| match row.scope {
                DesignationScope::AcademicProgram(program) => Some(program),
                _ => None,
            })
            .collect()
    }
}
