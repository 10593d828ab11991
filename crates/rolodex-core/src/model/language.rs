use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use super::{Entity, EntityKind, FieldValue, RecordId};
use crate::error::CoreError;
use crate::store::Dataset;
use crate::wrapper::{Editable, Rule};

const NAME_RULES: &[Rule] = &[Rule::Required, Rule::MaxLength(50)];

/// A programming language friends can pick as their favorite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammingLanguage {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ProgrammingLanguageField {
    Name,
}

impl Editable for ProgrammingLanguage {
    type Field = ProgrammingLanguageField;

    const KIND: EntityKind = EntityKind::ProgrammingLanguage;

    fn get(&self, field: ProgrammingLanguageField) -> FieldValue {
        match field {
            ProgrammingLanguageField::Name => FieldValue::text(self.name.as_str()),
        }
    }

    fn set(&mut self, field: ProgrammingLanguageField, value: FieldValue) -> Result<(), CoreError> {
        match field {
            ProgrammingLanguageField::Name => self.name = value.into_string("name")?,
        }
        Ok(())
    }

    fn rules(field: ProgrammingLanguageField) -> &'static [Rule] {
        match field {
            ProgrammingLanguageField::Name => NAME_RULES,
        }
    }

    fn field_label(field: ProgrammingLanguageField) -> &'static str {
        match field {
            ProgrammingLanguageField::Name => "Name",
        }
    }
}

impl Entity for ProgrammingLanguage {
    const KIND: EntityKind = EntityKind::ProgrammingLanguage;

    type Row = Self;

    fn id(&self) -> RecordId {
        self.id
    }

    fn display_label(&self) -> String {
        self.name.clone()
    }

    fn to_row(&self) -> Self {
        self.clone()
    }

    fn from_row(row: Self) -> Self {
        row
    }

    fn row_id(row: &Self) -> RecordId {
        row.id
    }

    fn assign_ids(
        row: &mut Self,
        next_id: &mut dyn FnMut() -> Result<RecordId, CoreError>,
    ) -> Result<(), CoreError> {
        if row.id.is_new() {
            row.id = next_id()?;
        }
        Ok(())
    }

    fn accept_ids(&mut self, row: &Self) {
        self.id = row.id;
    }

    fn table(data: &Dataset) -> &BTreeMap<RecordId, Self> {
        &data.programming_languages
    }

    fn table_mut(data: &mut Dataset) -> &mut BTreeMap<RecordId, Self> {
        &mut data.programming_languages
    }
}
