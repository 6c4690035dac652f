//! Creation of the destination table before a load.

use std::sync::Arc;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::destination::Destination;
use crate::error::EtlResult;
use crate::schema::DestinationTableSchema;

/// Creates the destination table with its fixed schema and expiration.
///
/// The table is created unconditionally. An existing table is reported by the destination as an
/// error, and provisioning fails with it.
#[derive(Debug, Clone)]
pub struct TableProvisioner {
    clock: Arc<dyn Clock>,
}

impl TableProvisioner {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Creates the destination table and returns the schema it was created with.
    pub async fn provision<D>(&self, destination: &D) -> EtlResult<DestinationTableSchema>
    where
        D: Destination,
    {
        let schema = DestinationTableSchema::provisioned_at(self.clock.now())?;

        info!(
            destination = D::name(),
            expires_at = %schema.expires_at(),
            "creating destination table"
        );
        destination.create_table(&schema).await?;

        Ok(schema)
    }
}

impl Default for TableProvisioner {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
