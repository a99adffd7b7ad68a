use tracing::info;

use super::{
    Designation, DesignationId, DesignationInput, FamilyMember, FamilyMemberId, FamilyMemberInput,
    Role, User, UserId, UserInput,
};
use crate::academics::AcademicProgramId;
use crate::service::{ensure_named, RuleViolation, ServiceContext, ServiceResult};
use crate::store::Store;

pub struct DesignationService<S> {
    ctx: ServiceContext<S>,
}

impl<S> DesignationService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }

    pub fn create_user(&self, input: UserInput) -> ServiceResult<User> {
        ensure_named("name", &input.name)?;
        let email = input.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(RuleViolation::invalid("email", "must be an email address").into());
        }
        let user = self.ctx.write(|db| {
            db.users
                .ensure_unique("email already registered", |row| row.email == email)?;
            Ok(db.users.insert_with(|id| User {
                id,
                name: input.name.trim().to_string(),
                email,
                is_admin: input.is_admin,
            }))
        })?;

        info!(user = %user.id, "user registered");
        Ok(user)
    }

    pub fn user(&self, id: UserId) -> ServiceResult<User> {
        self.ctx.read(|db| Ok(db.users.require(id)?.clone()))
    }

    pub fn users(&self) -> ServiceResult<Vec<User>> {
        self.ctx.read(|db| Ok(db.users.iter().cloned().collect()))
    }

    pub fn roles(&self, id: UserId) -> ServiceResult<Vec<Role>> {
        self.ctx.read(|db| {
            let user = db.users.require(id)?;
            Ok(db.roles(user))
        })
    }

    pub fn designate(&self, user: UserId, input: DesignationInput) -> ServiceResult<Designation> {
        let designation = self.ctx.write(|db| {
            db.users.require(user)?;
            db.ensure_scope_exists(input.scope)?;
            db.designations
                .ensure_unique("user already holds this designation", |row| {
                    row.user_id == user && row.scope == input.scope
                })?;
            Ok(db.designations.insert_with(|id| Designation {
                id,
                user_id: user,
                scope: input.scope,
                is_active: input.is_active,
            }))
        })?;

        info!(
            user = %user,
            role = %designation.scope.role(),
            "designation granted"
        );
        Ok(designation)
    }

    pub fn designations(&self, user: UserId) -> ServiceResult<Vec<Designation>> {
        self.ctx.read(|db| {
            db.users.require(user)?;
            Ok(db
                .designations
                .filter(|row| row.user_id == user)
                .cloned()
                .collect())
        })
    }

    pub fn set_active(&self, id: DesignationId, is_active: bool) -> ServiceResult<Designation> {
        self.ctx.write(|db| {
            let row = db.designations.require_mut(id)?;
            row.is_active = is_active;
            Ok(row.clone())
        })
    }

    pub fn revoke(&self, id: DesignationId) -> ServiceResult<()> {
        self.ctx.write(|db| {
            db.designations.remove(id)?;
            Ok(())
        })
    }

    pub fn chaired_programs(&self, user: UserId) -> ServiceResult<Vec<AcademicProgramId>> {
        self.ctx.read(|db| {
            db.users.require(user)?;
            Ok(db.chaired_programs(user))
        })
    }

    pub fn family_background(&self, user: UserId) -> ServiceResult<Vec<FamilyMember>> {
        self.ctx.read(|db| {
            db.users.require(user)?;
            Ok(db
                .family_members
                .filter(|row| row.user_id == user)
                .cloned()
                .collect())
        })
    }

    pub fn add_family_member(
        &self,
        user: UserId,
        input: FamilyMemberInput,
    ) -> ServiceResult<FamilyMember> {
        let input = input.normalized();
        ensure_named("fullname", &input.fullname)?;
        let member = self.ctx.write(|db| {
            db.users.require(user)?;
            Ok(db.family_members.insert_with(|id| FamilyMember {
                id,
                user_id: user,
                fullname: input.fullname,
                relationship: input.relationship,
                occupation: input.occupation,
                birthdate: input.birthdate,
            }))
        })?;

        info!(user = %user, member = %member.id, "family background recorded");
        Ok(member)
    }

    pub fn update_family_member(
        &self,
        id: FamilyMemberId,
        input: FamilyMemberInput,
    ) -> ServiceResult<FamilyMember> {
        let input = input.normalized();
        ensure_named("fullname", &input.fullname)?;
        self.ctx.write(|db| {
            let row = db.family_members.require_mut(id)?;
            row.fullname = input.fullname;
            row.relationship = input.relationship;
            row.occupation = input.occupation;
            row.birthdate = input.birthdate;
            Ok(row.clone())
        })
    }

    pub fn remove_family_member(&self, id: FamilyMemberId) -> ServiceResult<()> {
        self.ctx.write(|db| {
            db.family_members.remove(id)?;
            Ok(())
        })
    }
}
