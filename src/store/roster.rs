//! Person roster: credential lookup over a TOML-backed directory

use crate::domain::types::{parse_wall_time, Person, Pin, Schedule};
use crate::store::ledger::StoreError;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Lookup seam resolving credentials to active persons.
///
/// Unknown and inactive credentials are indistinguishable to callers: both
/// come back `None`, so kiosk feedback cannot be used to probe the roster.
pub trait PersonDirectory: Send + Sync {
    fn lookup_active(&self, pin: &Pin) -> Result<Option<Person>, StoreError>;
}

/// Raw roster file structure
#[derive(Debug, Deserialize)]
struct TomlRoster {
    #[serde(default)]
    person: Vec<TomlPerson>,
}

#[derive(Debug, Deserialize)]
struct TomlPerson {
    pin: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    national_id: String,
    scheduled_entry: String,
    scheduled_exit: String,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl TomlPerson {
    fn into_person(self) -> Result<Person> {
        let pin = Pin::new(self.pin);
        if !pin.is_well_formed() {
            bail!("malformed pin '{pin}' (expected 1-8 digits)");
        }
        let entry = parse_wall_time(&self.scheduled_entry)
            .with_context(|| format!("pin {pin}: bad scheduled_entry"))?;
        let exit = parse_wall_time(&self.scheduled_exit)
            .with_context(|| format!("pin {pin}: bad scheduled_exit"))?;
        Ok(Person {
            pin,
            first_name: self.first_name,
            last_name: self.last_name,
            national_id: self.national_id,
            schedule: Schedule::new(entry, exit),
            active: self.active,
        })
    }
}

/// In-memory [`PersonDirectory`] loaded from a TOML roster file.
///
/// The roster is read once at startup and treated as immutable; roster
/// edits take effect on restart.
#[derive(Debug)]
pub struct RosterDirectory {
    persons: HashMap<Pin, Person>,
}

impl RosterDirectory {
    /// Load and validate a roster file. Malformed PINs, duplicate PINs and
    /// unparseable schedule times are load errors naming the entry.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read roster file: {}", path.display()))?;
        let roster: TomlRoster = toml::from_str(&raw)
            .with_context(|| format!("failed to parse roster file: {}", path.display()))?;

        let persons: Result<Vec<Person>> =
            roster.person.into_iter().map(TomlPerson::into_person).collect();
        Self::from_persons(persons?)
    }

    /// Build a directory from already-constructed persons, rejecting
    /// duplicate PINs.
    pub fn from_persons(persons: impl IntoIterator<Item = Person>) -> Result<Self> {
        let mut map = HashMap::new();
        for person in persons {
            let pin = person.pin.clone();
            if map.insert(pin.clone(), person).is_some() {
                bail!("duplicate pin in roster: {pin}");
            }
        }
        Ok(Self { persons: map })
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}

impl PersonDirectory for RosterDirectory {
    fn lookup_active(&self, pin: &Pin) -> Result<Option<Person>, StoreError> {
        Ok(self.persons.get(pin).filter(|p| p.active).cloned())
    }
}
