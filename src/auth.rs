//! Local-only account handling.
//!
//! There is no backend: a "login" validates the input shape and writes a user
//! record to the [`LocalStore`] under [`keys::USER`]. The record is the only
//! thing the rest of the crate needs, as proof that someone is signed in.

use std::sync::{Arc, OnceLock, RwLock};

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::{keys, LocalStore};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const DEMO_EMAIL: &str = "demo@aarogyaai.com";
const DEMO_PASSWORD: &str = "demo123";
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Basic,
    Premium,
    Enterprise,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub subscription: SubscriptionTier,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl User {
    fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.email.is_empty() && !self.name.is_empty()
    }
}

/// Partial update applied by [`AuthService::update_user`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub subscription: Option<SubscriptionTier>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("All fields are required")]
    MissingFields,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters long")]
    WeakPassword,
    #[error("Please login to continue.")]
    NotSignedIn,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct AuthService {
    store: Arc<LocalStore>,
    current: RwLock<Option<User>>,
}

impl AuthService {
    /// Restores the persisted user, discarding a record that is unreadable
    /// or missing its id, email or name.
    pub fn new(store: Arc<LocalStore>) -> anyhow::Result<Self> {
        let restored = match store.get::<User>(keys::USER) {
            Some(user) if user.is_complete() => Some(user),
            Some(_) => {
                log_warn!("Discarding incomplete stored user record");
                store.remove(keys::USER)?;
                None
            }
            None => {
                if store.get_raw(keys::USER).is_some() {
                    log_warn!("Discarding unreadable stored user record");
                    store.remove(keys::USER)?;
                }
                None
            }
        };

        Ok(Self {
            store,
            current: RwLock::new(restored),
        })
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.read().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().unwrap().is_some()
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = if email == DEMO_EMAIL && password == DEMO_PASSWORD {
            User {
                id: "demo_user_1".into(),
                email: email.into(),
                name: "Demo User".into(),
                subscription: SubscriptionTier::Premium,
                created_at: Utc::now(),
                phone: None,
                city: None,
                language: None,
            }
        } else {
            if !is_valid_email(email) {
                return Err(AuthError::InvalidEmail);
            }
            let name = email.split('@').next().unwrap_or(email);
            new_user(email, name)
        };

        self.sign_in(user)
    }

    pub fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        self.sign_in(new_user(email, name))
    }

    pub fn logout(&self) -> anyhow::Result<()> {
        *self.current.write().unwrap() = None;
        self.store.remove(keys::USER)?;
        log_info!("User signed out");
        Ok(())
    }

    pub fn update_user(&self, update: UserUpdate) -> Result<User, AuthError> {
        let mut guard = self.current.write().unwrap();
        let mut user = guard.clone().ok_or(AuthError::NotSignedIn)?;

        if let Some(name) = update.name.filter(|n| !n.is_empty()) {
            user.name = name;
        }
        if let Some(tier) = update.subscription {
            user.subscription = tier;
        }
        if update.phone.is_some() {
            user.phone = update.phone;
        }
        if update.city.is_some() {
            user.city = update.city;
        }
        if update.language.is_some() {
            user.language = update.language;
        }

        self.store.set(keys::USER, &user)?;
        *guard = Some(user.clone());
        Ok(user)
    }

    fn sign_in(&self, user: User) -> Result<User, AuthError> {
        self.store.set(keys::USER, &user)?;
        *self.current.write().unwrap() = Some(user.clone());
        log_info!("User {} signed in", user.id);
        Ok(user)
    }
}

fn new_user(email: &str, name: &str) -> User {
    User {
        id: format!("user_{}", random_suffix()),
        email: email.into(),
        name: name.into(),
        subscription: SubscriptionTier::Basic,
        created_at: Utc::now(),
        phone: None,
        city: None,
        language: None,
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
        .is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service() -> (TempDir, Arc<LocalStore>, AuthService) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::new(dir.path().join("store.json")).unwrap());
        let auth = AuthService::new(store.clone()).unwrap();
        (dir, store, auth)
    }

    #[test]
    fn demo_account_is_premium() {
        let (_dir, _store, auth) = service();
        let user = auth.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
        assert_eq!(user.id, "demo_user_1");
        assert_eq!(user.subscription, SubscriptionTier::Premium);
        assert!(auth.is_authenticated());
    }

    #[test]
    fn any_valid_email_signs_in_as_basic() {
        let (_dir, _store, auth) = service();
        let user = auth.login("asha@example.in", "whatever").unwrap();
        assert_eq!(user.name, "asha");
        assert_eq!(user.subscription, SubscriptionTier::Basic);
        assert!(user.id.starts_with("user_"));
        assert_eq!(user.id.len(), "user_".len() + 9);
    }

    #[test]
    fn login_validates_input() {
        let (_dir, _store, auth) = service();
        assert!(matches!(auth.login("", "x"), Err(AuthError::MissingCredentials)));
        assert!(matches!(auth.login("not-an-email", "x"), Err(AuthError::InvalidEmail)));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn register_enforces_password_length() {
        let (_dir, _store, auth) = service();
        assert!(matches!(
            auth.register("a@b.co", "12345", "A"),
            Err(AuthError::WeakPassword)
        ));
        assert!(matches!(auth.register("a@b.co", "123456", ""), Err(AuthError::MissingFields)));
        let user = auth.register("a@b.co", "123456", "Asha").unwrap();
        assert_eq!(user.name, "Asha");
    }

    #[test]
    fn session_survives_restart_until_logout() {
        let (_dir, store, auth) = service();
        let user = auth.login("ravi@example.com", "pw").unwrap();

        let restored = AuthService::new(store.clone()).unwrap();
        assert_eq!(restored.current_user(), Some(user));

        restored.logout().unwrap();
        let after = AuthService::new(store).unwrap();
        assert!(after.current_user().is_none());
    }

    #[test]
    fn incomplete_record_is_discarded() {
        let (_dir, store, _auth) = service();
        store
            .set(
                keys::USER,
                &serde_json::json!({
                    "id": "",
                    "email": "x@y.z",
                    "name": "X",
                    "createdAt": "2024-01-01T00:00:00Z"
                }),
            )
            .unwrap();

        let auth = AuthService::new(store.clone()).unwrap();
        assert!(auth.current_user().is_none());
        assert!(store.get_raw(keys::USER).is_none());
    }

    #[test]
    fn failed_update_keeps_memory_and_disk_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("profile");
        let store = Arc::new(LocalStore::new(parent.join("store.json")).unwrap());
        let auth = AuthService::new(store.clone()).unwrap();
        auth.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();

        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, "not a directory").unwrap();

        let result = auth.update_user(UserUpdate {
            city: Some("Pune".into()),
            ..UserUpdate::default()
        });
        assert!(matches!(result, Err(AuthError::Storage(_))));
        assert!(auth.current_user().unwrap().city.is_none());
        assert!(store.get::<User>(keys::USER).unwrap().city.is_none());
    }

    #[test]
    fn update_requires_sign_in_and_persists() {
        let (_dir, store, auth) = service();
        assert!(matches!(
            auth.update_user(UserUpdate::default()),
            Err(AuthError::NotSignedIn)
        ));

        auth.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
        let updated = auth
            .update_user(UserUpdate {
                city: Some("Pune".into()),
                ..UserUpdate::default()
            })
            .unwrap();
        assert_eq!(updated.city.as_deref(), Some("Pune"));
        assert_eq!(store.get::<User>(keys::USER).unwrap().city.as_deref(), Some("Pune"));
    }
}
