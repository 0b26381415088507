//! Resource type registry
//!
//! Maps resource names to their descriptors. Adding a resource type means
//! registering another descriptor; the engine itself does not change.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::descriptor::ResourceDescriptor;
use crate::error::{Result, SyncError};
use crate::partition::PartitionKey;
use crate::pipeline::{SyncPipeline, SyncReport};
use crate::provider::ListProvider;
use crate::resources;
use crate::writer::RelationalWriter;

/// Collaborators shared by every run
#[derive(Clone)]
pub struct SyncContext {
    pub provider: Arc<dyn ListProvider>,
    pub writer: RelationalWriter,
    pub cancel: CancellationToken,
}

impl SyncContext {
    pub fn new(provider: Arc<dyn ListProvider>, writer: RelationalWriter) -> Self {
        Self {
            provider,
            writer,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    descriptors: BTreeMap<&'static str, &'static ResourceDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in resource
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in resources::builtin().iter().copied() {
            registry.register(descriptor);
        }
        registry
    }

    /// Add a descriptor, returning the one it replaced
    pub fn register(
        &mut self,
        descriptor: &'static ResourceDescriptor,
    ) -> Option<&'static ResourceDescriptor> {
        self.descriptors.insert(descriptor.name, descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&'static ResourceDescriptor> {
        self.descriptors.get(name).copied()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.keys().copied()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static ResourceDescriptor> + '_ {
        self.descriptors.values().copied()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Sync resource `name` for `partition`
    ///
    /// Unknown names fail with [`SyncError::UnknownResourceType`] before any
    /// collaborator is touched.
    pub async fn run(
        &self,
        ctx: &SyncContext,
        name: &str,
        partition: &PartitionKey,
        raw_config: serde_json::Value,
    ) -> Result<SyncReport> {
        let descriptor = self
            .get(name)
            .ok_or_else(|| SyncError::UnknownResourceType(name.to_string()))?;

        SyncPipeline::new(descriptor, ctx.provider.as_ref(), &ctx.writer)
            .with_cancellation(ctx.cancel.clone())
            .run(partition, raw_config)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique_and_resolvable() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), resources::builtin().len());
        for name in registry.names() {
            assert_eq!(registry.get(name).map(|d| d.name), Some(name));
        }
        assert!(registry.get("ec2.nat_gateways").is_some());
        assert!(registry.get("doesnotexist").is_none());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = Registry::new();
        assert!(registry.register(&resources::iam::GROUPS).is_none());
        assert!(registry.register(&resources::iam::GROUPS).is_some());
        assert_eq!(registry.len(), 1);
    }
}
