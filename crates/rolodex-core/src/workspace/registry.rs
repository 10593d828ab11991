// ── Workspace registry ──
//
// Closed kind → factory table. Wiring validates it once so that a
// missing variant fails at startup, not on first navigation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use strum::IntoEnumIterator;

use super::{DetailWorkspace, FriendWorkspace, LanguagesWorkspace};
use crate::bus::EventBus;
use crate::config::WorkspaceConfig;
use crate::dialog::ConfirmationDialog;
use crate::error::CoreError;
use crate::model::{EntityKind, Friend, ProgrammingLanguage};
use crate::repository::LookupService;
use crate::store::{Database, TrackedRepository};

pub type WorkspaceFactory = Box<dyn Fn() -> Box<dyn DetailWorkspace> + Send + Sync>;

/// Everything the shipped workspace variants need.
#[derive(Clone)]
pub struct WorkspaceServices {
    pub db: Arc<Database>,
    pub lookup: Arc<dyn LookupService>,
    pub bus: Arc<EventBus>,
    pub dialog: Arc<dyn ConfirmationDialog>,
    pub config: WorkspaceConfig,
}

impl WorkspaceServices {
    /// Services where the database doubles as the lookup service.
    pub fn new(
        db: Arc<Database>,
        bus: Arc<EventBus>,
        dialog: Arc<dyn ConfirmationDialog>,
        config: WorkspaceConfig,
    ) -> Self {
        let lookup: Arc<dyn LookupService> = Arc::clone(&db) as Arc<dyn LookupService>;
        Self {
            db,
            lookup,
            bus,
            dialog,
            config,
        }
    }
}

#[derive(Default)]
pub struct WorkspaceRegistry {
    factories: HashMap<EntityKind, WorkspaceFactory>,
}

impl WorkspaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the friend and programming-language workspaces.
    /// Every created workspace gets its own change-tracking session.
    pub fn standard(services: &WorkspaceServices) -> Self {
        let mut registry = Self::new();

        let friend = services.clone();
        registry.register(EntityKind::Friend, move || {
            Box::new(FriendWorkspace::new(
                Arc::new(TrackedRepository::<Friend>::new(Arc::clone(&friend.db))),
                Arc::clone(&friend.lookup),
                Arc::clone(&friend.bus),
                Arc::clone(&friend.dialog),
                friend.config.clone(),
            ))
        });

        let languages = services.clone();
        registry.register(EntityKind::ProgrammingLanguage, move || {
            Box::new(LanguagesWorkspace::new(
                Arc::new(TrackedRepository::<ProgrammingLanguage>::new(Arc::clone(&languages.db))),
                Arc::clone(&languages.bus),
            ))
        });

        registry
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register<F>(&mut self, kind: EntityKind, factory: F)
    where
        F: Fn() -> Box<dyn DetailWorkspace> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Fail when any entity kind has no factory.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<&'static str> = EntityKind::iter()
            .filter(|kind| !self.contains(*kind))
            .map(EntityKind::tag)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::configuration(format!(
                "no workspace registered for: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn create(&self, kind: EntityKind) -> Result<Box<dyn DetailWorkspace>, CoreError> {
        self.factories
            .get(&kind)
            .map(|factory| factory())
            .ok_or_else(|| {
                CoreError::configuration(format!("no workspace registered for {}", kind.tag()))
            })
    }
}

impl fmt::Debug for WorkspaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().map(|k| k.tag()).collect();
        kinds.sort_unstable();
        f.debug_struct("WorkspaceRegistry").field("kinds", &kinds).finish()
    }
}
