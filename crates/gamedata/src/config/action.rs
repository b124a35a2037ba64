//! Address actions.
//!
//! An address entry is parsed into an [`AddressActions`] list and then walked
//! against a cursor. Platform branches become [`Action::Platform`] nodes that
//! keep their member value unparsed: only the branch matching the platform
//! being resolved is ever parsed, so other platforms' contents cannot fail an
//! entry.

use serde_json::Value;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::document::{expect_object, kind_of, number_as_offset};
use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::platform::Platform;

const SIGNATURE_KEY: &str = "signature";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `offset`: add to the cursor.
    Offset(i64),
    /// `read`: load a pointer from `cursor + value`.
    Read(i64),
    /// `read_offs32`: follow the 32-bit relative displacement at `cursor + value`.
    ReadOffs32(i64),
    /// A platform key and its raw branch. When it matches, the branch is parsed
    /// and the rest of the walk continues inside it.
    Platform(Platform, Value),
    /// Member name the resolver does not know; reported and skipped.
    Unrecognized(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionList {
    actions: Vec<Action>,
}

/// Parsed form of one `Addresses` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressActions {
    /// Name of the previously resolved address the cursor starts from.
    pub signature: Option<String>,
    pub actions: ActionList,
}

impl AddressActions {
    pub fn parse(entry: &str, value: &Value) -> Result<Self> {
        let members = expect_object(entry, value)?;

        let signature = match members.get(SIGNATURE_KEY) {
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => {
                return Err(Error::InvalidValue {
                    entry: entry.to_string(),
                    message: format!("\"signature\" must be a string, got {}", kind_of(other)),
                });
            }
            None => None,
        };

        let actions = ActionList::parse_members(
            entry,
            members
                .iter()
                .filter(|(name, _)| name.as_str() != SIGNATURE_KEY),
        )?;

        Ok(Self { signature, actions })
    }
}

impl ActionList {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn parse(entry: &str, value: &Value) -> Result<Self> {
        Self::parse_members(entry, expect_object(entry, value)?.iter())
    }

    fn parse_members<'a, I>(entry: &str, members: I) -> Result<Self>
    where
        I: Iterator<Item = (&'a String, &'a Value)>,
    {
        let mut actions = Vec::new();
        for (name, value) in members {
            let action = match name.as_str() {
                "offset" => Action::Offset(action_value(entry, name, value)?),
                "read" => Action::Read(action_value(entry, name, value)?),
                "read_offs32" => Action::ReadOffs32(action_value(entry, name, value)?),
                other => match Platform::from_key(other) {
                    Some(platform) => Action::Platform(platform, value.clone()),
                    None => Action::Unrecognized(other.to_string()),
                },
            };
            actions.push(action);
        }
        Ok(Self { actions })
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Walk the actions from `cursor` for `platform`.
    ///
    /// Branches for other platforms are skipped without being inspected.
    /// Unrecognized actions add a line to `notes` and the walk continues. A
    /// malformed matching branch or a failed memory read aborts the walk.
    pub fn resolve(
        &self,
        entry: &str,
        cursor: u64,
        platform: Platform,
        memory: &dyn ReadMemory,
        notes: &mut Diagnostics,
    ) -> Result<u64> {
        let mut cursor = cursor;

        for (index, action) in self.actions.iter().enumerate() {
            match action {
                Action::Offset(value) => {
                    cursor = wrap(cursor.wrapping_add_signed(*value), platform);
                }
                Action::Read(value) => {
                    let location = wrap(cursor.wrapping_add_signed(*value), platform);
                    cursor = memory.read_pointer(location, platform.pointer_width())?;
                }
                Action::ReadOffs32(value) => {
                    let location = wrap(cursor.wrapping_add_signed(*value), platform);
                    let displacement = memory.read_i32(location)?;
                    cursor = wrap(
                        location
                            .wrapping_add(4)
                            .wrapping_add_signed(i64::from(displacement)),
                        platform,
                    );
                }
                Action::Platform(branch, value) if *branch == platform => {
                    let ignored = self.actions.len() - index - 1;
                    if ignored > 0 {
                        debug!(
                            "\"{}\": {} action(s) after the \"{}\" branch are not applied",
                            entry, ignored, branch
                        );
                    }
                    let nested = Self::parse(entry, value)?;
                    return nested.resolve(entry, cursor, platform, memory, notes);
                }
                Action::Platform(..) => {}
                Action::Unrecognized(name) => {
                    notes.push(
                        Error::UnknownAction {
                            action: name.clone(),
                            entry: entry.to_string(),
                        }
                        .to_string(),
                    );
                }
            }
        }

        Ok(cursor)
    }
}

fn action_value(entry: &str, name: &str, value: &Value) -> Result<i64> {
    number_as_offset(value).ok_or_else(|| Error::InvalidValue {
        entry: entry.to_string(),
        message: format!("\"{}\" expects an integer, got {}", name, value),
    })
}

fn wrap(cursor: u64, platform: Platform) -> u64 {
    if platform.is_64bit() {
        cursor
    } else {
        cursor & u64::from(u32::MAX)
    }
}
