//! In-memory container runtime for lifecycle tests.

use crate::error::{ExecutorError, Result};
use crate::runtime::{ContainerRuntime, ContainerSpec};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub created: Vec<ContainerSpec>,
    pub killed: Vec<String>,
    pub removed: Vec<String>,
    pub fail_create: bool,
    pub hang_wait: bool,
    pub exit_code: i64,
    pub log: String,
    next_id: u32,
}

/// Scripted [`ContainerRuntime`] that records every lifecycle call.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRuntime {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeRuntime {
    pub fn with_outcome(exit_code: i64, log: &str) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.exit_code = exit_code;
            state.log = log.to_string();
        }
        fake
    }

    pub fn created_count(&self) -> usize {
        self.state.lock().unwrap().created.len()
    }

    pub fn removed_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().removed.clone()
    }

    pub fn killed_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().killed.clone()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(ExecutorError::Provisioning("daemon unavailable".into()));
        }
        state.created.push(spec.clone());
        state.next_id += 1;
        Ok(format!("fake-{}", state.next_id))
    }

    async fn wait(&self, _id: &str) -> Result<i64> {
        let hang = self.state.lock().unwrap().hang_wait;
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(self.state.lock().unwrap().exit_code)
    }

    async fn logs(&self, _id: &str) -> Result<String> {
        Ok(self.state.lock().unwrap().log.clone())
    }

    async fn kill(&self, id: &str) -> Result<()> {
        self.state.lock().unwrap().killed.push(id.to_string());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.state.lock().unwrap().removed.push(id.to_string());
        Ok(())
    }
}
