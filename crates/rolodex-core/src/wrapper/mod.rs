// ── Entity wrappers ──
//
// Validating, notifying proxies around one shared record. Every write
// goes straight to the record; validation runs on the stored value and
// listeners hear about it synchronously afterwards.

pub mod rules;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLockReadGuard;
use strum::IntoEnumIterator;
use tracing::trace;

use crate::error::CoreError;
use crate::model::{EntityKind, FieldValue, Shared};

pub use rules::Rule;

/// A record whose fields can be edited through an [`EntityWrapper`].
pub trait Editable: Send + Sync + 'static {
    /// Closed set of editable fields.
    type Field: Copy
        + Eq
        + Hash
        + fmt::Debug
        + FromStr
        + IntoEnumIterator
        + Into<&'static str>
        + Send
        + Sync
        + 'static;

    const KIND: EntityKind;

    fn get(&self, field: Self::Field) -> FieldValue;

    /// Store `value`. Fails only when the value cannot be represented
    /// in the field's type; validity is not checked here.
    fn set(&mut self, field: Self::Field, value: FieldValue) -> Result<(), CoreError>;

    /// Validation rules for `field`.
    fn rules(field: Self::Field) -> &'static [Rule];

    /// Label used in validation messages.
    fn field_label(field: Self::Field) -> &'static str {
        field.into()
    }
}

/// Parse a field name, accepting both `first-name` and `first_name`.
pub fn parse_field<R: Editable>(name: &str) -> Result<R::Field, CoreError> {
    let normalized = name.trim().replace('-', "_").to_ascii_lowercase();
    normalized
        .parse::<R::Field>()
        .map_err(|_| CoreError::UnknownField {
            kind: R::KIND,
            field: name.to_owned(),
        })
}

// ── Notifications ────────────────────────────────────────────────────

/// What changed on a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyChanged {
    /// A field was assigned (possibly to the same value).
    Value(&'static str),
    /// The field's error set went from empty to non-empty or back.
    Errors(&'static str),
    /// The wrapper-level `has_errors` flag flipped.
    HasErrors,
}

pub type Listener = Arc<dyn Fn(&PropertyChanged) + Send + Sync>;

/// Handle returned by [`EntityWrapper::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

// ── EntityWrapper ────────────────────────────────────────────────────

/// Change-tracking, validating proxy around one record.
pub struct EntityWrapper<R: Editable> {
    model: Shared<R>,
    /// Only fields with at least one error are present.
    errors: HashMap<R::Field, Vec<String>>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl<R: Editable> EntityWrapper<R> {
    /// Wrap `model`. No validation runs until a field is set or
    /// [`validate_all`](Self::validate_all) is called.
    pub fn new(model: Shared<R>) -> Self {
        Self {
            model,
            errors: HashMap::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn model(&self) -> &Shared<R> {
        &self.model
    }

    /// Read access to the underlying record.
    pub fn read(&self) -> RwLockReadGuard<'_, R> {
        self.model.read()
    }

    pub fn get(&self, field: R::Field) -> FieldValue {
        self.model.read().get(field)
    }

    /// Assign `value`, validate it and notify listeners.
    ///
    /// Invalid values are stored anyway so the user can see and fix
    /// them; only unrepresentable values are rejected.
    pub fn set(&mut self, field: R::Field, value: impl Into<FieldValue>) -> Result<(), CoreError> {
        self.model.write().set(field, value.into())?;

        let had_errors = self.has_errors();
        let field_flipped = self.validate_field(field);
        let name: &'static str = field.into();
        trace!(kind = %R::KIND, field = name, "field assigned");

        self.notify(PropertyChanged::Value(name));
        if field_flipped {
            self.notify(PropertyChanged::Errors(name));
        }
        if had_errors != self.has_errors() {
            self.notify(PropertyChanged::HasErrors);
        }
        Ok(())
    }

    /// Validate every field against its current value.
    ///
    /// Used for freshly created records so that required-field errors
    /// show up before the user touches anything.
    pub fn validate_all(&mut self) {
        let had_errors = self.has_errors();
        let mut flipped: Vec<&'static str> = Vec::new();
        for field in R::Field::iter() {
            if self.validate_field(field) {
                flipped.push(field.into());
            }
        }
        for name in flipped {
            self.notify(PropertyChanged::Errors(name));
        }
        if had_errors != self.has_errors() {
            self.notify(PropertyChanged::HasErrors);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self, field: R::Field) -> &[String] {
        self.errors.get(&field).map_or(&[], Vec::as_slice)
    }

    /// All current error messages in field declaration order.
    pub fn all_errors(&self) -> Vec<(&'static str, String)> {
        R::Field::iter()
            .flat_map(|field| {
                let name: &'static str = field.into();
                self.errors(field).iter().map(move |msg| (name, msg.clone()))
            })
            .collect()
    }

    // ── Listeners ────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Detach a listener. Returns `false` if it was not attached.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Recompute the error set of `field`. Returns `true` when the set
    /// flipped between empty and non-empty.
    fn validate_field(&mut self, field: R::Field) -> bool {
        let value = self.model.read().get(field);
        let messages = rules::check_all(R::rules(field), R::field_label(field), &value);
        let was_invalid = self.errors.contains_key(&field);
        let is_invalid = !messages.is_empty();
        if is_invalid {
            self.errors.insert(field, messages);
        } else {
            self.errors.remove(&field);
        }
        was_invalid != is_invalid
    }

    fn notify(&self, change: PropertyChanged) {
        for (_, listener) in &self.listeners {
            listener(&change);
        }
    }
}

impl<R: Editable> fmt::Debug for EntityWrapper<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityWrapper")
            .field("kind", &R::KIND)
            .field("errors", &self.errors.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
