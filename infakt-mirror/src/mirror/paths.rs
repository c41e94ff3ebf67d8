use thiserror::Error;

use super::category::RemoteId;

pub const TOMBSTONE_MARKER: &str = "(DELETED)";
pub const SLOT_EXTENSION: &str = ".json";
pub const LIST_FILE_NAME: &str = "list.json";
pub const DETAILS_DIR_NAME: &str = "details";
pub const ATTACHMENTS_SUFFIX: &str = ".attachments";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("name is empty")]
    Empty,
    #[error("name contains unsupported character: {0:?}")]
    UnsupportedCharacter(String),
    #[error("display name uses the reserved tombstone marker: {0:?}")]
    ReservedMarker(String),
}

pub fn slot_file_name(display_name: &str) -> Result<String, SlotError> {
    // Display names come from remote fields; they must stay a single path
    // component and must not shadow a tombstone.
    let name = single_component(display_name)?;
    if name.starts_with(TOMBSTONE_MARKER) {
        return Err(SlotError::ReservedMarker(name.to_string()));
    }
    Ok(format!("{name}{SLOT_EXTENSION}"))
}

pub fn attachment_file_name(name: &str) -> Result<&str, SlotError> {
    single_component(name)
}

pub fn attachments_dir_name(slot_file_name: &str) -> String {
    let stem = slot_file_name
        .strip_suffix(SLOT_EXTENSION)
        .unwrap_or(slot_file_name);
    format!("{stem}{ATTACHMENTS_SUFFIX}")
}

fn single_component(name: &str) -> Result<&str, SlotError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SlotError::Empty);
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(SlotError::UnsupportedCharacter(name.to_string()));
    }
    Ok(name)
}

pub fn tombstone_file_name(id: &RemoteId) -> String {
    format!("{TOMBSTONE_MARKER} {id}{SLOT_EXTENSION}")
}

pub fn is_tombstone(file_name: &str) -> bool {
    file_name.starts_with(TOMBSTONE_MARKER)
}
