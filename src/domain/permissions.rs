//! Role checks for user and resource management.

use uuid::Uuid;

use crate::error::AppError;

/// The role flags of whoever performs or receives an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl Principal {
    pub fn has_admin_privileges(&self) -> bool {
        self.is_admin || self.is_super_admin
    }
}

pub fn require_admin(actor: &Principal) -> Result<(), AppError> {
    if actor.has_admin_privileges() {
        Ok(())
    } else {
        Err(AppError::AdminRequired)
    }
}

pub fn require_super_admin(actor: &Principal) -> Result<(), AppError> {
    if actor.is_super_admin {
        Ok(())
    } else {
        Err(AppError::SuperAdminRequired)
    }
}

/// Admins act on any player; everyone else only on their own.
pub fn require_admin_or_owner(
    actor: &Principal,
    actor_player: Option<Uuid>,
    player_id: Uuid,
) -> Result<(), AppError> {
    if actor.has_admin_privileges() || actor_player == Some(player_id) {
        Ok(())
    } else {
        Err(AppError::AdminRequired)
    }
}

pub fn check_user_update(
    actor: &Principal,
    target: &Principal,
    changes_password: bool,
) -> Result<(), AppError> {
    if actor.is_super_admin || actor.id == target.id {
        return Ok(());
    }
    if !actor.has_admin_privileges() {
        return Err(AppError::AdminRequired);
    }
    if target.has_admin_privileges() {
        return Err(AppError::CantUpdateAdminUser);
    }
    // Admins manage other users' profiles and players, never their passwords.
    if changes_password {
        return Err(AppError::AdminRequired);
    }
    Ok(())
}

pub fn check_user_delete(actor: &Principal, target: &Principal) -> Result<(), AppError> {
    if actor.id == target.id {
        return Err(AppError::CantDeleteYourself);
    }
    if actor.is_super_admin {
        return Ok(());
    }
    if !actor.has_admin_privileges() {
        return Err(AppError::AdminRequired);
    }
    if target.has_admin_privileges() {
        return Err(AppError::CantUpdateAdminUser);
    }
    Ok(())
}
