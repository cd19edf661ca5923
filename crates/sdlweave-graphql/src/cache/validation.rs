//! Validate-only requests.
//!
//! async-graphql validates a document only as part of executing it. A
//! request carrying [`ValidateOnly`] runs through parsing and validation
//! and is then stopped by [`ValidationGate`] before any resolver runs.

use std::sync::Arc;

use async_graphql::extensions::{Extension, ExtensionContext, ExtensionFactory, NextValidation};
use async_graphql::{ServerError, ValidationResult};

/// Request data marking a request that must stop after validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOnly;

/// Schema extension honouring [`ValidateOnly`].
///
/// Every schema whose documents go through the query cache must carry this
/// extension; without it a validate-only request is executed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationGate;

impl ExtensionFactory for ValidationGate {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(ValidationGateExtension)
    }
}

struct ValidationGateExtension;

#[async_trait::async_trait]
impl Extension for ValidationGateExtension {
    async fn validation(
        &self,
        ctx: &ExtensionContext<'_>,
        next: NextValidation<'_>,
    ) -> Result<ValidationResult, Vec<ServerError>> {
        let result = next.run(ctx).await;
        if ctx.data_opt::<ValidateOnly>().is_some() {
            // An empty error list ends the request without executing it.
            return Err(result.err().unwrap_or_default());
        }
        result
    }
}
