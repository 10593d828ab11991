// ── Friend aggregate ──
//
// A friend owns its phone numbers. The live record shares each phone
// number with the wrapper editing it; the persisted row holds them by
// value so that snapshot comparison sees child edits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use super::{Entity, EntityKind, FieldValue, RecordId, Shared, shared};
use crate::error::CoreError;
use crate::store::Dataset;
use crate::wrapper::{Editable, Rule};

const FIRST_NAME_RULES: &[Rule] = &[
    Rule::Required,
    Rule::MaxLength(50),
    Rule::Forbidden {
        value: "Robot",
        message: "Robots are not valid friends",
    },
];
const LAST_NAME_RULES: &[Rule] = &[Rule::MaxLength(50)];
const EMAIL_RULES: &[Rule] = &[Rule::Email, Rule::MaxLength(50)];
const PHONE_NUMBER_RULES: &[Rule] = &[Rule::Required, Rule::PhoneNumber];

// ── Friend ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Friend {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub favorite_language_id: Option<RecordId>,
    pub phone_numbers: Vec<Shared<PhoneNumber>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FriendField {
    FirstName,
    LastName,
    Email,
    FavoriteLanguageId,
}

impl Editable for Friend {
    type Field = FriendField;

    const KIND: EntityKind = EntityKind::Friend;

    fn get(&self, field: FriendField) -> FieldValue {
        match field {
            FriendField::FirstName => FieldValue::text(self.first_name.as_str()),
            FriendField::LastName => self.last_name.clone().into(),
            FriendField::Email => self.email.clone().into(),
            FriendField::FavoriteLanguageId => self.favorite_language_id.into(),
        }
    }

    fn set(&mut self, field: FriendField, value: FieldValue) -> Result<(), CoreError> {
        let name: &'static str = field.into();
        match field {
            FriendField::FirstName => self.first_name = value.into_string(name)?,
            FriendField::LastName => self.last_name = value.into_optional_string(name)?,
            FriendField::Email => self.email = value.into_optional_string(name)?,
            FriendField::FavoriteLanguageId => {
                self.favorite_language_id = value.into_reference(name)?;
            }
        }
        Ok(())
    }

    fn rules(field: FriendField) -> &'static [Rule] {
        match field {
            FriendField::FirstName => FIRST_NAME_RULES,
            FriendField::LastName => LAST_NAME_RULES,
            FriendField::Email => EMAIL_RULES,
            FriendField::FavoriteLanguageId => &[],
        }
    }

    fn field_label(field: FriendField) -> &'static str {
        match field {
            FriendField::FirstName => "First name",
            FriendField::LastName => "Last name",
            FriendField::Email => "Email",
            FriendField::FavoriteLanguageId => "Favorite language",
        }
    }
}

/// Persisted shape of a friend, phone numbers included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRow {
    pub id: RecordId,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_language_id: Option<RecordId>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
}

impl Entity for Friend {
    const KIND: EntityKind = EntityKind::Friend;

    type Row = FriendRow;

    fn id(&self) -> RecordId {
        self.id
    }

    fn display_label(&self) -> String {
        let last = self.last_name.as_deref().unwrap_or_default();
        format!("{} {last}", self.first_name).trim().to_owned()
    }

    fn to_row(&self) -> FriendRow {
        FriendRow {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            favorite_language_id: self.favorite_language_id,
            phone_numbers: self.phone_numbers.iter().map(|p| p.read().clone()).collect(),
        }
    }

    fn from_row(row: FriendRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            favorite_language_id: row.favorite_language_id,
            phone_numbers: row.phone_numbers.into_iter().map(shared).collect(),
        }
    }

    fn row_id(row: &FriendRow) -> RecordId {
        row.id
    }

    fn assign_ids(
        row: &mut FriendRow,
        next_id: &mut dyn FnMut() -> Result<RecordId, CoreError>,
    ) -> Result<(), CoreError> {
        if row.id.is_new() {
            row.id = next_id()?;
        }
        for phone in &mut row.phone_numbers {
            if phone.id.is_new() {
                phone.id = next_id()?;
            }
        }
        Ok(())
    }

    fn accept_ids(&mut self, row: &FriendRow) {
        self.id = row.id;
        for (live, saved) in self.phone_numbers.iter().zip(&row.phone_numbers) {
            live.write().id = saved.id;
        }
    }

    fn table(data: &Dataset) -> &BTreeMap<RecordId, FriendRow> {
        &data.friends
    }

    fn table_mut(data: &mut Dataset) -> &mut BTreeMap<RecordId, FriendRow> {
        &mut data.friends
    }
}

// ── PhoneNumber ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub id: RecordId,
    pub number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PhoneNumberField {
    Number,
}

impl Editable for PhoneNumber {
    type Field = PhoneNumberField;

    const KIND: EntityKind = EntityKind::Friend;

    fn get(&self, field: PhoneNumberField) -> FieldValue {
        match field {
            PhoneNumberField::Number => FieldValue::text(self.number.as_str()),
        }
    }

    fn set(&mut self, field: PhoneNumberField, value: FieldValue) -> Result<(), CoreError> {
        match field {
            PhoneNumberField::Number => self.number = value.into_string("number")?,
        }
        Ok(())
    }

    fn rules(field: PhoneNumberField) -> &'static [Rule] {
        match field {
            PhoneNumberField::Number => PHONE_NUMBER_RULES,
        }
    }

    fn field_label(field: PhoneNumberField) -> &'static str {
        match field {
            PhoneNumberField::Number => "Phone number",
        }
    }
}
