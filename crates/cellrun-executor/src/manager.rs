//! Registry of live sandbox instances.

use crate::error::{ExecutorError, Result};
use crate::runtime::{ContainerRuntime, ContainerSpec};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A provisioned instance tracked by the manager.
#[derive(Debug, Clone)]
pub struct SandboxInstance {
    pub id: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// Tracks every instance the executor provisions so nothing outlives its
/// request. All teardown paths funnel through [`ContainerManager::remove`].
pub struct ContainerManager<R: ContainerRuntime> {
    runtime: Arc<R>,
    instances: Arc<RwLock<HashMap<String, SandboxInstance>>>,
}

impl<R: ContainerRuntime> Clone for ContainerManager<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            instances: Arc::clone(&self.instances),
        }
    }
}

impl<R: ContainerRuntime> ContainerManager<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime: Arc::new(runtime),
            instances: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Create and start an instance, registering it on success.
    pub async fn provision(&self, spec: &ContainerSpec) -> Result<String> {
        let id = self.runtime.create(spec).await?;
        let instance = SandboxInstance {
            id: id.clone(),
            image: spec.image.clone(),
            created_at: Utc::now(),
        };
        self.instances.write().await.insert(id.clone(), instance);
        info!(container_id = %id, image = %spec.image, "sandbox instance provisioned");
        Ok(id)
    }

    /// Look up a registered instance by id.
    pub async fn get(&self, id: &str) -> Result<SandboxInstance> {
        self.instances
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ExecutorError::NotFound(id.to_string()))
    }

    /// All currently registered instances.
    pub async fn active(&self) -> Vec<SandboxInstance> {
        self.instances.read().await.values().cloned().collect()
    }

    /// Force-remove an instance and deregister it. Idempotent: removing an
    /// unknown id is a no-op.
    pub async fn remove(&self, id: &str) -> Result<()> {
        if self.instances.write().await.remove(id).is_none() {
            return Ok(());
        }
        self.runtime.remove(id).await?;
        info!(container_id = %id, "sandbox instance removed");
        Ok(())
    }

    /// Tear down every registered instance, logging failures rather than
    /// stopping at the first one.
    pub async fn cleanup(&self) {
        let ids: Vec<String> = self.instances.write().await.drain().map(|(id, _)| id).collect();
        for id in ids {
            if let Err(e) = self.runtime.remove(&id).await {
                warn!(container_id = %id, error = %e, "failed to remove instance during cleanup");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeRuntime;

    fn spec(name: &str) -> ContainerSpec {
        ContainerSpec {
            name: name.to_string(),
            image: "cellrun-c:latest".to_string(),
            cmd: vec!["sh".into(), "-c".into(), "true".into()],
            env: vec![],
            memory_bytes: 512 * 1024 * 1024,
            cpu_quota: 50_000,
        }
    }

    #[tokio::test]
    async fn test_provision_registers_instance() {
        let manager = ContainerManager::new(FakeRuntime::default());
        let id = manager.provision(&spec("one")).await.unwrap();
        let instance = manager.get(&id).await.unwrap();
        assert_eq!(instance.image, "cellrun-c:latest");
        assert_eq!(manager.active().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_deregisters_and_tears_down() {
        let manager = ContainerManager::new(FakeRuntime::default());
        let id = manager.provision(&spec("one")).await.unwrap();
        manager.remove(&id).await.unwrap();
        assert!(manager.active().await.is_empty());
        assert_eq!(manager.runtime().removed_ids(), vec![id.clone()]);
        assert!(matches!(
            manager.get(&id).await,
            Err(ExecutorError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_a_noop() {
        let manager = ContainerManager::new(FakeRuntime::default());
        manager.remove("missing").await.unwrap();
        assert!(manager.runtime().removed_ids().is_empty());
    }

    #[tokio::test]
    async fn test_failed_provision_registers_nothing() {
        let runtime = FakeRuntime::default();
        runtime.state.lock().unwrap().fail_create = true;
        let manager = ContainerManager::new(runtime);
        assert!(manager.provision(&spec("one")).await.is_err());
        assert!(manager.active().await.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_everything() {
        let manager = ContainerManager::new(FakeRuntime::default());
        manager.provision(&spec("one")).await.unwrap();
        manager.provision(&spec("two")).await.unwrap();
        manager.cleanup().await;
        assert!(manager.active().await.is_empty());
        assert_eq!(manager.runtime().removed_ids().len(), 2);
    }
}
