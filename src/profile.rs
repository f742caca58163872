//! Profile boundary - the identity backend as seen by the rest of the crate
//!
//! Authentication itself lives outside this crate; `ProfileBackend` only exposes the
//! signed-in user and a partial profile update.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::ProfileError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub preferred_language: String,
    /// cm
    pub height: Option<f64>,
    /// kg
    pub weight_goal: Option<f64>,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub preferred_language: Option<String>,
    pub height: Option<f64>,
    pub weight_goal: Option<f64>,
}

impl ProfileFields {
    fn validate(&self) -> Result<(), ProfileError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ProfileError::InvalidField {
                field: "name",
                reason: "must not be empty".into(),
            });
        }
        if self
            .preferred_language
            .as_deref()
            .is_some_and(|l| l.trim().is_empty())
        {
            return Err(ProfileError::InvalidField {
                field: "preferred_language",
                reason: "must not be empty".into(),
            });
        }
        check_positive("height", self.height)?;
        check_positive("weight_goal", self.weight_goal)?;
        Ok(())
    }
}

fn check_positive(field: &'static str, value: Option<f64>) -> Result<(), ProfileError> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(ProfileError::InvalidField {
            field,
            reason: format!("expected a positive number, got {}", v),
        }),
        _ => Ok(()),
    }
}

pub trait ProfileBackend: Send + Sync {
    fn current_user(&self) -> Option<User>;
    fn update_profile(&self, user_id: &str, fields: ProfileFields) -> Result<(), ProfileError>;
}

/// Process-local backend for the terminal front-end and tests
#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    inner: Mutex<Profiles>,
}

#[derive(Debug, Default)]
struct Profiles {
    users: HashMap<String, User>,
    signed_in: Option<String>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with `user` registered and signed in
    pub fn with_user(user: User) -> Self {
        let profiles = Self::new();
        profiles.insert(user);
        profiles
    }

    pub fn insert(&self, user: User) {
        let mut inner = self.lock();
        inner.signed_in = Some(user.id.clone());
        inner.users.insert(user.id.clone(), user);
    }

    pub fn sign_out(&self) {
        self.lock().signed_in = None;
    }

    fn lock(&self) -> MutexGuard<'_, Profiles> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProfileBackend for InMemoryProfiles {
    fn current_user(&self) -> Option<User> {
        let inner = self.lock();
        inner
            .signed_in
            .as_ref()
            .and_then(|id| inner.users.get(id))
            .cloned()
    }

    fn update_profile(&self, user_id: &str, fields: ProfileFields) -> Result<(), ProfileError> {
        fields.validate()?;

        let mut inner = self.lock();
        if inner.signed_in.is_none() {
            return Err(ProfileError::NotSignedIn);
        }
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| ProfileError::UnknownUser(user_id.to_string()))?;

        if let Some(name) = fields.name {
            user.name = name;
        }
        if let Some(language) = fields.preferred_language {
            user.preferred_language = language;
        }
        if fields.height.is_some() {
            user.height = fields.height;
        }
        if fields.weight_goal.is_some() {
            user.weight_goal = fields.weight_goal;
        }
        tracing::info!(user = user_id, "profile updated");
        Ok(())
    }
}
