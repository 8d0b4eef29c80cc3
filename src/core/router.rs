//! Integration router
//!
//! Pure lookup from (change type, integration) to the handler registered for
//! the pair. The table is total over registrations and fails closed:
//! unregistered combinations surface `UnsupportedOperation`, recorded as a
//! record-level error without halting the rest of the job.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::errors::{EngineError, Result};
use crate::core::handlers::ChangeHandler;
use crate::core::types::{ChangeType, Integration};

/// Registry mapping (change type, integration) pairs to handlers.
#[derive(Default)]
pub struct IntegrationRouter {
    table: HashMap<(ChangeType, Integration), Arc<dyn ChangeHandler>>,
}

impl IntegrationRouter {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        change_type: ChangeType,
        integration: Integration,
        handler: Arc<dyn ChangeHandler>,
    ) {
        self.table.insert((change_type, integration), handler);
    }

    pub fn resolve(
        &self,
        change_type: ChangeType,
        integration: Integration,
    ) -> Result<Arc<dyn ChangeHandler>> {
        self.table
            .get(&(change_type, integration))
            .cloned()
            .ok_or(EngineError::UnsupportedOperation {
                change_type,
                integration,
            })
    }

    pub fn contains(&self, change_type: ChangeType, integration: Integration) -> bool {
        self.table.contains_key(&(change_type, integration))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for IntegrationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationRouter")
            .field("registrations", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}
