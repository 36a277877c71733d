use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, SignupRequest},
    password::{hash_password, verify_password},
};
use crate::{
    error::{AppError, AppResult},
    random::{choose, RandomSource},
    users::{NewUser, StoreError, UniqueField, User, UserStore},
};

pub const PROFILE_PICS: [&str; 3] = ["/avatar1.png", "/avatar2.png", "/avatar3.png"];
pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn conflict(field: UniqueField) -> AppError {
    match field {
        UniqueField::Email => AppError::Conflict("Email already exists".into()),
        UniqueField::Username => AppError::Conflict("Username already exists".into()),
    }
}

/// Validates, checks uniqueness (email first), hashes and persists a new account.
pub async fn signup(
    store: &dyn UserStore,
    random: &dyn RandomSource,
    req: SignupRequest,
) -> AppResult<User> {
    let email = normalize_email(&req.email);
    let username = req.username.trim().to_string();

    if email.is_empty() || req.password.is_empty() || username.is_empty() {
        return Err(AppError::Validation("All fields are required".into()));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if store.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(conflict(UniqueField::Email));
    }
    if store.find_by_username(&username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(conflict(UniqueField::Username));
    }

    let password_hash = hash_password(&req.password)?;
    let image = choose(random, &PROFILE_PICS)
        .copied()
        .unwrap_or(PROFILE_PICS[0])
        .to_string();

    let user = store
        .create(NewUser {
            email,
            username,
            password_hash,
            image,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent signup after the pre-checks.
            StoreError::Duplicate(field) => conflict(field),
            other => other.into(),
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Looks the account up by email and checks the password.
pub async fn login(store: &dyn UserStore, req: LoginRequest) -> AppResult<User> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("All fields are required".into()));
    }

    let user = match store.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(%email, "login unknown email");
            return Err(AppError::NotFound("Invalid credentials".into()));
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(user)
}
