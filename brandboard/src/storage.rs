//! Project persistence boundary.
//!
//! Saving a finished brandboard requires an authenticated identity; the
//! store itself is an async trait so backends can range from the in-memory
//! store used by the CLI and tests to a real database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::WizardError;
use crate::wizard::types::{BrandboardData, ValidationData};

/// Authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
}

/// Everything a finished wizard run hands to the store.
#[derive(Debug, Clone)]
pub struct ProjectDraft {
    pub company_name: String,
    pub validation_data: ValidationData,
    pub brandboard_data: BrandboardData,
    pub generated_logo: Option<Vec<u8>>,
    pub photography_images: Vec<Vec<u8>>,
}

/// A persisted project as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProject {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub company_name: String,
    pub validation_data: ValidationData,
    pub brandboard_data: Value,
    #[serde(skip)]
    pub generated_logo: Option<Vec<u8>>,
    #[serde(skip)]
    pub photography_images: Vec<Vec<u8>>,
}

/// Authentication boundary. Consumed only to gate persistence; the wizard
/// itself never touches it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Identity, WizardError>;

    async fn register(&self, email: &str, password: &str) -> Result<Identity, WizardError>;

    async fn login_with_oauth(&self, provider: &str) -> Result<Identity, WizardError>;

    async fn sign_out(&self);

    async fn current_identity(&self) -> Option<Identity>;

    /// Watch channel that tracks sign-in and sign-out.
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>>;
}

/// Project persistence. Every operation is scoped to an identity.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn save(&self, identity: &Identity, draft: ProjectDraft)
        -> Result<StoredProject, WizardError>;

    /// Projects owned by the identity, newest first.
    async fn list(&self, identity: &Identity) -> Result<Vec<StoredProject>, WizardError>;

    async fn load(&self, identity: &Identity, id: Uuid)
        -> Result<Option<StoredProject>, WizardError>;

    async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), WizardError>;
}

/// Resolves the save-time identity and forwards the draft to the store.
pub async fn save_project(
    identity: &dyn IdentityProvider,
    store: &dyn ProjectStore,
    draft: ProjectDraft,
) -> Result<StoredProject, WizardError> {
    let identity = identity
        .current_identity()
        .await
        .ok_or(WizardError::AuthFailed)?;
    store.save(&identity, draft).await
}

/// In-memory store keyed by user id.
#[derive(Default)]
pub struct MemoryStore {
    projects: Mutex<HashMap<String, Vec<StoredProject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn save(
        &self,
        identity: &Identity,
        draft: ProjectDraft,
    ) -> Result<StoredProject, WizardError> {
        let brandboard_data = serde_json::to_value(&draft.brandboard_data)
            .map_err(|e| WizardError::PersistenceFailed(e.to_string()))?;
        let project = StoredProject {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            company_name: draft.company_name,
            validation_data: draft.validation_data,
            brandboard_data,
            generated_logo: draft.generated_logo,
            photography_images: draft.photography_images,
        };
        let mut projects = self.projects.lock().unwrap();
        projects
            .entry(identity.user_id.clone())
            .or_default()
            .push(project.clone());
        Ok(project)
    }

    async fn list(&self, identity: &Identity) -> Result<Vec<StoredProject>, WizardError> {
        let projects = self.projects.lock().unwrap();
        let mut owned = projects
            .get(&identity.user_id)
            .cloned()
            .unwrap_or_default();
        owned.reverse();
        Ok(owned)
    }

    async fn load(
        &self,
        identity: &Identity,
        id: Uuid,
    ) -> Result<Option<StoredProject>, WizardError> {
        let projects = self.projects.lock().unwrap();
        Ok(projects
            .get(&identity.user_id)
            .and_then(|owned| owned.iter().find(|p| p.id == id).cloned()))
    }

    async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), WizardError> {
        let mut projects = self.projects.lock().unwrap();
        if let Some(owned) = projects.get_mut(&identity.user_id) {
            owned.retain(|p| p.id != id);
        }
        Ok(())
    }
}

/// In-memory identity provider. Accepts any credentials and remembers the
/// signed-in user; `None` models a signed-out session.
pub struct MemoryIdentity {
    current: watch::Sender<Option<Identity>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    pub fn signed_in(identity: Identity) -> Self {
        let (current, _) = watch::channel(Some(identity));
        Self { current }
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn login(&self, email: &str, _password: &str) -> Result<Identity, WizardError> {
        let identity = Identity {
            user_id: email.to_string(),
            display_name: email.to_string(),
        };
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn register(&self, email: &str, password: &str) -> Result<Identity, WizardError> {
        self.login(email, password).await
    }

    async fn login_with_oauth(&self, provider: &str) -> Result<Identity, WizardError> {
        let identity = Identity {
            user_id: format!("{}-user", provider),
            display_name: provider.to_string(),
        };
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) {
        self.current.send_replace(None);
    }

    async fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}
