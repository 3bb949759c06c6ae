//! Lifecycle hooks shared by the relay components.
//!
//! None of the components own background tasks or connections, so the
//! default implementations are no-ops that always report healthy.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Health of each named component, `Ok` when healthy.
pub type HealthReport = HashMap<String, Result<(), Error>>;

#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> String;

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn ready(&self) -> Result<()> {
        Ok(())
    }

    fn health_report(&self) -> HealthReport {
        HashMap::from([(self.name(), self.ready())])
    }
}
