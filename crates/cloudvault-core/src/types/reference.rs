//! References that cross the API boundary: the directory sentinel and the
//! polymorphic share item.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{DirectoryId, FileId};
use crate::error::AppError;

/// The literal accepted in place of a directory id to mean "my root".
pub const ROOT_SENTINEL: &str = "root";

/// A directory addressed either as the caller's root or by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DirectoryRef {
    /// The calling user's root directory, created on first use.
    #[default]
    Root,
    /// A concrete directory.
    Id(DirectoryId),
}

impl DirectoryRef {
    /// Return the concrete id, if any.
    pub fn id(&self) -> Option<DirectoryId> {
        match self {
            Self::Root => None,
            Self::Id(id) => Some(*id),
        }
    }

    /// Whether this is the root sentinel.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl From<DirectoryId> for DirectoryRef {
    fn from(id: DirectoryId) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for DirectoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str(ROOT_SENTINEL),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for DirectoryRef {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ROOT_SENTINEL) {
            return Ok(Self::Root);
        }
        trimmed
            .parse::<DirectoryId>()
            .map(Self::Id)
            .map_err(|_| AppError::validation(format!("Invalid directory reference: '{s}'")))
    }
}

impl TryFrom<String> for DirectoryRef {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DirectoryRef> for String {
    fn from(value: DirectoryRef) -> Self {
        value.to_string()
    }
}

/// Kind of item a share grant refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// A directory.
    Directory,
    /// A file.
    File,
}

impl ItemType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "directory" => Ok(Self::Directory),
            "file" => Ok(Self::File),
            _ => Err(AppError::validation(format!("Invalid item type: '{s}'"))),
        }
    }
}

/// A shareable item, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ItemRef {
    /// A directory.
    Directory(DirectoryId),
    /// A file.
    File(FileId),
}

impl ItemRef {
    /// The kind of item.
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Directory(_) => ItemType::Directory,
            Self::File(_) => ItemType::File,
        }
    }

    /// The untyped id as stored in `shared_items.item_id`.
    pub fn raw_id(&self) -> Uuid {
        match self {
            Self::Directory(id) => id.into_uuid(),
            Self::File(id) => id.into_uuid(),
        }
    }

    /// Rebuild a typed reference from a stored `(item_type, item_id)` pair.
    pub fn from_parts(item_type: ItemType, item_id: Uuid) -> Self {
        match item_type {
            ItemType::Directory => Self::Directory(DirectoryId::from_uuid(item_id)),
            ItemType::File => Self::File(FileId::from_uuid(item_id)),
        }
    }
}

impl From<DirectoryId> for ItemRef {
    fn from(id: DirectoryId) -> Self {
        Self::Directory(id)
    }
}

impl From<FileId> for ItemRef {
    fn from(id: FileId) -> Self {
        Self::File(id)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item_type(), self.raw_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_ref_parsing() {
        assert_eq!("root".parse::<DirectoryRef>().unwrap(), DirectoryRef::Root);
        assert_eq!("ROOT".parse::<DirectoryRef>().unwrap(), DirectoryRef::Root);
        assert_eq!("".parse::<DirectoryRef>().unwrap(), DirectoryRef::Root);

        let id = DirectoryId::new();
        assert_eq!(
            id.to_string().parse::<DirectoryRef>().unwrap(),
            DirectoryRef::Id(id)
        );
        assert!("42".parse::<DirectoryRef>().is_err());
    }

    #[test]
    fn test_directory_ref_serde() {
        let id = DirectoryId::new();
        let json = serde_json::to_string(&DirectoryRef::Id(id)).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let root: DirectoryRef = serde_json::from_str("\"root\"").unwrap();
        assert!(root.is_root());
        assert!(serde_json::from_str::<DirectoryRef>("\"nope\"").is_err());
    }

    #[test]
    fn test_item_ref_parts() {
        let id = FileId::new();
        let item = ItemRef::from(id);
        assert_eq!(item.item_type(), ItemType::File);
        assert_eq!(ItemRef::from_parts(ItemType::File, item.raw_id()), item);
        assert_eq!("Directory".parse::<ItemType>().unwrap(), ItemType::Directory);
    }
}
