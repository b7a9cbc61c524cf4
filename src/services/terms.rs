//! Terms-of-use versions and their acceptance.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::settings;
use crate::db::models::{TermsOfUse, User};
use crate::db::{terms_repo, user_repo};
use crate::domain::permissions::require_super_admin;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptTerms {
    pub user_id: Uuid,
    pub terms_version: i32,
    #[serde(default)]
    pub is_demo_user: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TermsCreate {
    pub content: String,
}

pub async fn get_active(db: &PgPool) -> AppResult<TermsOfUse> {
    terms_repo::get_active(db)
        .await?
        .ok_or(AppError::TermsNotFound)
}

pub async fn publish(db: &PgPool, actor: &User, input: TermsCreate) -> AppResult<TermsOfUse> {
    require_super_admin(&actor.principal())?;
    if input.content.trim().is_empty() {
        return Err(AppError::Validation("Content must not be empty.".into()));
    }
    let mut tx = db.begin().await?;
    let terms = terms_repo::publish(&mut tx, &input.content).await?;
    tx.commit().await?;
    log::info!("terms of use version {} published by {}", terms.version, actor.id);
    Ok(terms)
}

/// The shared demo account never records acceptances.
pub async fn accept(db: &PgPool, actor: &User, input: AcceptTerms) -> AppResult<()> {
    if input.user_id != actor.id {
        return Err(AppError::AdminRequired);
    }
    if terms_repo::get_by_version(db, input.terms_version).await?.is_none() {
        return Err(AppError::TermsNotFound);
    }
    if input.is_demo_user || actor.email == settings().demo_user_email {
        return Ok(());
    }

    let user = user_repo::get_by_id(db, input.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let mut tx = db.begin().await?;
    terms_repo::record_acceptance(&mut *tx, user.id, input.terms_version).await?;
    user_repo::set_terms_version(&mut *tx, user.id, input.terms_version).await?;
    tx.commit().await?;
    Ok(())
}
