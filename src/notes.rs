//! Notes and their share entries

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::ids::Id;
use crate::users::User;

/// Access granted by a share entry
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Can view the note
    ReadOnly,
    /// Can view and change the note
    Edit,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ReadOnly => "readonly",
            Permission::Edit => "edit",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ShareError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "readonly" => Ok(Permission::ReadOnly),
            "edit" => Ok(Permission::Edit),
            _ => Err(ShareError::InvalidPermission),
        }
    }
}

/// Grants a single user access to a note
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub user_id: Id,
    pub permission: Permission,
}

/// Reasons a note can not be shared
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("User not found")]
    UnknownUser,

    #[error("You can not share a note with yourself")]
    WithSelf,

    #[error(r#"Invalid permission, use "readonly" or "edit""#)]
    InvalidPermission,
}

/// What sharing did to the share list
#[derive(Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    Added,
    Updated,
}

/// A note as stored in the backend
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Id>,
    /// URL or inlined `data:` URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub shared_with: Vec<Share>,
    /// Visible to every user, used by the crudnotas app
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub shared: bool,
    /// Fields this app does not know about, kept as-is on updates
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.owner_id.as_ref() == Some(&user.id)
    }

    /// Image to show, empty strings count as no image
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|image| !image.is_empty())
    }

    /// Permission the user got through a share entry
    pub fn permission_for(&self, user_id: &Id) -> Option<Permission> {
        self.shared_with
            .iter()
            .find(|share| &share.user_id == user_id)
            .map(|share| share.permission)
    }

    /// Owner, admins and `edit` sharees can change a note
    pub fn can_edit(&self, user: &User) -> bool {
        self.is_owned_by(user)
            || user.is_admin()
            || self.permission_for(&user.id) == Some(Permission::Edit)
    }

    /// Can the user see the note at all
    pub fn can_view(&self, user: &User) -> bool {
        self.can_edit(user) || self.permission_for(&user.id).is_some() || self.shared
    }

    /// Share the note with a user
    ///
    /// Sharing twice with the same user replaces the permission
    pub fn share_with(&mut self, user_id: Id, permission: Permission) -> ShareOutcome {
        if let Some(share) = self
            .shared_with
            .iter_mut()
            .find(|share| share.user_id == user_id)
        {
            share.permission = permission;
            ShareOutcome::Updated
        } else {
            self.shared_with.push(Share {
                user_id,
                permission,
            });
            ShareOutcome::Added
        }
    }

    /// First characters of the content, with an ellipsis when cut
    pub fn excerpt(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let excerpt: String = chars.by_ref().take(max_chars).collect();

        if chars.next().is_some() {
            format!("{excerpt}...")
        } else {
            excerpt
        }
    }
}

/// Check a share request before touching the note
pub fn check_share_target(owner: &User, target: Option<&User>) -> Result<Id, ShareError> {
    let target = target.ok_or(ShareError::UnknownUser)?;

    if target.id == owner.id {
        return Err(ShareError::WithSelf);
    }

    Ok(target.id.clone())
}

/// A note shared with the current user
#[derive(Clone, Debug)]
pub struct SharedNote {
    pub note: Note,
    pub permission: Permission,
}

/// The notes of a user, split by ownership
#[derive(Debug, Default)]
pub struct NoteBoard {
    pub personal: Vec<Note>,
    pub shared: Vec<SharedNote>,
}

impl NoteBoard {
    /// Split notes into owned notes and notes shared through a share entry
    pub fn from_share_entries(notes: Vec<Note>, user: &User) -> Self {
        let mut board = Self::default();

        for note in notes {
            if note.is_owned_by(user) {
                board.personal.push(note);
            } else if let Some(permission) = note.permission_for(&user.id) {
                board.shared.push(SharedNote { note, permission });
            }
        }

        board
    }

    /// Split notes into owned notes and notes flagged as shared by others
    pub fn from_shared_flag(notes: Vec<Note>, user: &User) -> Self {
        let mut board = Self::default();

        for note in notes {
            if note.is_owned_by(user) {
                board.personal.push(note);
            } else if note.shared {
                board.shared.push(SharedNote {
                    note,
                    permission: Permission::ReadOnly,
                });
            }
        }

        board
    }
}

/// Values to create a Note
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteValues<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub owner_id: &'a Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<&'a str>,
    pub shared_with: &'a [Share],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub shared: bool,
}

/// Values of a note in the shape of the crudnotas app, the owner goes in `userId`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedNoteValues<'a> {
    pub user_id: &'a Id,
    pub title: &'a str,
    pub content: &'a str,
    pub shared: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user(id: u64, role: &str) -> User {
        serde_json::from_value(json!({
            "id": id,
            "username": format!("user{id}"),
            "password": "secret",
            "role": role,
        }))
        .unwrap()
    }

    fn note(owner: u64) -> Note {
        serde_json::from_value(json!({
            "id": 1,
            "title": "A",
            "content": "B",
            "ownerId": owner,
            "imageUrl": "https://example.com/a.png",
        }))
        .unwrap()
    }

    #[test]
    fn test_share_twice_updates_permission() {
        let mut note = note(1);

        assert_eq!(
            ShareOutcome::Added,
            note.share_with(Id::Number(2), Permission::ReadOnly)
        );
        assert_eq!(
            ShareOutcome::Updated,
            note.share_with(Id::Number(2), Permission::Edit)
        );

        assert_eq!(1, note.shared_with.len());
        assert_eq!(Some(Permission::Edit), note.permission_for(&Id::Number(2)));
    }

    #[test]
    fn test_share_target_checks() {
        let owner = user(1, "user");
        let other = user(2, "user");

        assert_eq!(Err(ShareError::UnknownUser), check_share_target(&owner, None));
        assert_eq!(Err(ShareError::WithSelf), check_share_target(&owner, Some(&owner)));
        assert_eq!(Ok(Id::Number(2)), check_share_target(&owner, Some(&other)));
    }

    #[test]
    fn test_permission_parsing() {
        assert_eq!(Ok(Permission::ReadOnly), "readonly".parse());
        assert_eq!(Ok(Permission::Edit), "edit".parse());
        assert_eq!(Err(ShareError::InvalidPermission), "write".parse::<Permission>());
        assert_eq!(Err(ShareError::InvalidPermission), "Edit".parse::<Permission>());
    }

    #[test]
    fn test_edit_rights() {
        let owner = user(1, "user");
        let admin = user(9, "admin");
        let reader = user(2, "user");
        let editor = user(3, "user");

        let mut note = note(1);
        note.share_with(reader.id.clone(), Permission::ReadOnly);
        note.share_with(editor.id.clone(), Permission::Edit);

        assert!(note.can_edit(&owner));
        assert!(note.can_edit(&admin));
        assert!(note.can_edit(&editor));
        assert!(!note.can_edit(&reader));
        assert!(note.can_view(&reader));
        assert!(!note.can_view(&user(4, "user")));
    }

    #[test]
    fn test_board_split() {
        let me = user(2, "user");

        let mut shared = note(1);
        shared.share_with(me.id.clone(), Permission::Edit);

        let board = NoteBoard::from_share_entries(vec![note(2), shared, note(3)], &me);

        assert_eq!(1, board.personal.len());
        assert_eq!(1, board.shared.len());
        assert_eq!(Permission::Edit, board.shared[0].permission);
    }

    #[test]
    fn test_excerpt() {
        let mut note = note(1);
        note.content = "abcdef".to_string();

        assert_eq!("abc...", note.excerpt(3));
        assert_eq!("abcdef", note.excerpt(6));
    }
}
