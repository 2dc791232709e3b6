//! # Entities
//!
//! Plain value types shared by the capability interfaces.

use std::path::{Path, PathBuf};

/// Location of one database's files below a storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseLayout {
    root: PathBuf,
    database_name: String,
}

impl DatabaseLayout {
    /// Layout for `database_name` stored below `root`.
    pub fn of(root: impl Into<PathBuf>, database_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            database_name: database_name.into(),
        }
    }

    /// Storage root shared by all databases.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Directory holding this database's store files.
    pub fn database_directory(&self) -> PathBuf {
        self.root.join(&self.database_name)
    }

    pub fn transaction_logs_directory(&self) -> PathBuf {
        self.database_directory().join("tx-logs")
    }

    /// Id file backing the generator for `id_type`.
    pub fn id_file(&self, id_type: IdType) -> PathBuf {
        self.database_directory()
            .join(format!("{}.id", id_type.file_stem()))
    }
}

/// Edition and operational mode the runtime reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseInfo {
    Community,
    Enterprise,
    Tool,
    Unknown,
}

impl DatabaseInfo {
    #[must_use]
    pub fn edition(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Enterprise => "enterprise",
            Self::Tool | Self::Unknown => "unknown",
        }
    }
}

/// Whether the runtime accepts write transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCapability {
    CanWrite,
    ReadOnly,
}

impl AccessCapability {
    #[must_use]
    pub fn allows_writes(&self) -> bool {
        matches!(self, Self::CanWrite)
    }
}

/// Throttle applied to background flushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoLimiter {
    Unlimited,
    Limited { max_iops: u64 },
}

impl IoLimiter {
    #[must_use]
    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Limited { .. })
    }
}

/// Where transaction state collections are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionsFactorySupplier {
    #[default]
    OnHeap,
    OffHeap,
}

/// Header written in front of every committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHeaderInformation {
    pub master_id: i32,
    pub author_id: i32,
    pub additional_header: Vec<u8>,
}

/// Produces transaction headers for the commit process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHeaderInformationFactory {
    master_id: i32,
    author_id: i32,
}

impl TransactionHeaderInformationFactory {
    /// Single-instance header: no master, no author.
    pub const DEFAULT: Self = Self {
        master_id: -1,
        author_id: -1,
    };

    pub fn create(&self) -> TransactionHeaderInformation {
        TransactionHeaderInformation {
            master_id: self.master_id,
            author_id: self.author_id,
            additional_header: Vec::new(),
        }
    }
}

impl Default for TransactionHeaderInformationFactory {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Record families that draw ids from their own generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdType {
    Node,
    Relationship,
    Property,
    LabelToken,
    RelationshipTypeToken,
    PropertyKeyToken,
    Schema,
}

impl IdType {
    /// Get all id types.
    #[must_use]
    pub fn all() -> [IdType; 7] {
        [
            Self::Node,
            Self::Relationship,
            Self::Property,
            Self::LabelToken,
            Self::RelationshipTypeToken,
            Self::PropertyKeyToken,
            Self::Schema,
        ]
    }

    fn file_stem(&self) -> &'static str {
        match self {
            Self::Node => "nodestore",
            Self::Relationship => "relationshipstore",
            Self::Property => "propertystore",
            Self::LabelToken => "labeltokenstore",
            Self::RelationshipTypeToken => "relationshiptypestore",
            Self::PropertyKeyToken => "propertykeytokenstore",
            Self::Schema => "schemastore",
        }
    }
}

/// Whether freed ids may be handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdReuseEligibility {
    Always,
    Never,
}

impl IdReuseEligibility {
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Always)
    }
}

/// Per-type id generator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdTypeConfiguration {
    /// Reuse freed ids as soon as they are released.
    pub allow_aggressive_reuse: bool,
    /// Number of ids grabbed from the generator at a time.
    pub grab_size: u32,
}

/// Kind of token a token holder manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Label,
    RelationshipType,
    PropertyKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = DatabaseLayout::of("/data", "default");

        assert_eq!(layout.database_directory(), PathBuf::from("/data/default"));
        assert_eq!(
            layout.id_file(IdType::Node),
            PathBuf::from("/data/default/nodestore.id")
        );
        assert_eq!(layout.database_name(), "default");
    }

    #[test]
    fn test_default_header_has_no_master() {
        let header = TransactionHeaderInformationFactory::DEFAULT.create();

        assert_eq!(header.master_id, -1);
        assert_eq!(header.author_id, -1);
        assert!(header.additional_header.is_empty());
    }
}
