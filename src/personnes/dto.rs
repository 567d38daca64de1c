use std::collections::BTreeMap;

use serde::Deserialize;

use crate::personnes::repo_types::{Person, PersonDraft, NAME_MAX_LEN};

/// Raw submitted fields. Kept as text so bad input can be echoed back in the form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonForm {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub age: String,
}

/// Field name -> message.
pub type FormErrors = BTreeMap<&'static str, String>;

impl From<&Person> for PersonForm {
    fn from(p: &Person) -> Self {
        Self {
            firstname: p.firstname.clone(),
            lastname: p.lastname.clone(),
            age: p.age.to_string(),
        }
    }
}

impl PersonForm {
    pub fn validate(&self) -> Result<PersonDraft, FormErrors> {
        let mut errors = FormErrors::new();

        let firstname = self.firstname.trim();
        let lastname = self.lastname.trim();
        check_name(&mut errors, "firstname", firstname);
        check_name(&mut errors, "lastname", lastname);

        let age = match self.age.trim().parse::<i32>() {
            Ok(age) => Some(age),
            Err(_) => {
                errors.insert("age", "L'âge doit être un nombre entier.".into());
                None
            }
        };

        match age {
            Some(age) if errors.is_empty() => Ok(PersonDraft::new(firstname, lastname, age)),
            _ => Err(errors),
        }
    }
}

fn check_name(errors: &mut FormErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.insert(field, "Cette valeur ne doit pas être vide.".into());
    } else if value.chars().count() > NAME_MAX_LEN {
        errors.insert(
            field,
            format!("Cette valeur est trop longue ({NAME_MAX_LEN} caractères maximum)."),
        );
    }
}

/// `/page/{page}/{nb}` parameters. Missing segments fall back to the first page.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "first_page")]
    pub page: i64,
    pub nb: Option<i64>,
}

fn first_page() -> i64 {
    1
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: first_page(),
            nb: None,
        }
    }
}
