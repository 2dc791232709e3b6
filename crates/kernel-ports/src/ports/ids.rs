//! Id allocation capabilities.

use std::sync::Arc;

use crate::entities::{DatabaseLayout, IdType, IdTypeConfiguration};
use crate::errors::PortError;

/// Hands out record ids for a single id type.
pub trait IdGenerator: Send + Sync {
    fn id_type(&self) -> IdType;

    /// Allocate the next id, preferring previously freed ones.
    fn next_id(&self) -> u64;

    /// Return an id for later reuse.
    fn free_id(&self, id: u64);

    /// One past the highest id ever allocated.
    fn high_id(&self) -> u64;
}

/// Opens id generators per id type.
pub trait IdGeneratorFactory: Send + Sync {
    fn open(
        &self,
        layout: &DatabaseLayout,
        id_type: IdType,
        configuration: IdTypeConfiguration,
    ) -> Result<Arc<dyn IdGenerator>, PortError>;

    /// Generator previously opened for `id_type`.
    fn get(&self, id_type: IdType) -> Option<Arc<dyn IdGenerator>>;
}

/// Tuning per id type.
pub trait IdTypeConfigurationProvider: Send + Sync {
    fn configuration(&self, id_type: IdType) -> IdTypeConfiguration;
}
