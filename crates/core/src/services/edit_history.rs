//! Field-level diffing for admin edits.

use talentshow_db::entities::{act, notification::EditEntry};

/// Fields of an act an admin may edit, in the order changes are reported.
pub const EDITABLE_ACT_FIELDS: &[&str] = &["name", "grade", "description"];

/// Read access to named fields for diffing.
pub trait TrackedFields {
    /// Current value of `name`, or `None` if the field is unknown.
    fn field(&self, name: &str) -> Option<String>;
}

impl TrackedFields for act::Model {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name.clone()),
            "grade" => Some(self.grade.clone()),
            "description" => Some(self.description.clone()),
            _ => None,
        }
    }
}

/// One entry per tracked field whose value differs between `old` and `new`.
///
/// Unknown names are skipped. A field known on only one side is reported
/// with an empty string for the missing side.
pub fn diff_fields<T: TrackedFields + ?Sized>(
    old: &T,
    new: &T,
    tracked: &[&str],
) -> Vec<EditEntry> {
    tracked
        .iter()
        .filter_map(|&name| {
            let before = old.field(name);
            let after = new.field(name);
            if before == after {
                return None;
            }
            Some(EditEntry {
                field: name.to_string(),
                old_value: before.unwrap_or_default(),
                new_value: after.unwrap_or_default(),
            })
        })
        .collect()
}
