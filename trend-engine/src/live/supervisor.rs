//! Engine supervisor - runs one polling task per named engine instance

use crate::config::StrategyVariant;
use crate::data::Timeframe;
use crate::live::PollingDriver;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What an engine instance is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceBinding {
    pub symbol: String,
    pub variant: StrategyVariant,
    pub timeframe: Timeframe,
}

/// Status row for one instance
#[derive(Debug, Clone)]
pub struct InstanceStatus {
    pub name: String,
    pub binding: InstanceBinding,
    pub started_at: DateTime<Utc>,
    /// False once the task has exited
    pub running: bool,
}

struct EngineInstance {
    binding: InstanceBinding,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

/// Supervisor - manages running engine instances by name
#[derive(Clone, Default)]
pub struct EngineSupervisor {
    /// Map of instance name -> running task
    instances: Arc<RwLock<HashMap<String, EngineInstance>>>,
}

impl EngineSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `driver` under `name`; a name already in use is rejected
    pub async fn start(&self, name: &str, driver: PollingDriver) -> Result<()> {
        let mut instances = self.instances.write().await;
        if instances.contains_key(name) {
            bail!("engine instance '{}' is already running", name);
        }

        let binding = InstanceBinding {
            symbol: driver.runner().symbol.clone(),
            variant: driver.engine().config().variant,
            timeframe: driver.runner().timeframe,
        };
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(driver.run(cancel.child_token()));

        info!(
            "✅ Started engine '{}' ({} {} {})",
            name, binding.symbol, binding.variant, binding.timeframe
        );
        instances.insert(
            name.to_string(),
            EngineInstance {
                binding,
                cancel,
                handle,
                started_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Cancel an instance and wait for its task to finish.
    ///
    /// Returns false when no instance has that name.
    pub async fn stop(&self, name: &str) -> Result<bool> {
        let instance = self.instances.write().await.remove(name);
        let Some(instance) = instance else {
            return Ok(false);
        };
        instance.cancel.cancel();
        instance
            .handle
            .await
            .with_context(|| format!("engine task '{}' panicked", name))?;
        info!("🛑 Stopped engine '{}' ({})", name, instance.binding.symbol);
        Ok(true)
    }

    /// Stop every instance
    pub async fn stop_all(&self) -> Result<()> {
        let names: Vec<String> = self.instances.read().await.keys().cloned().collect();
        for name in names {
            self.stop(&name).await?;
        }
        Ok(())
    }

    /// Status of all instances, sorted by name
    pub async fn status(&self) -> Vec<InstanceStatus> {
        let instances = self.instances.read().await;
        let mut rows: Vec<InstanceStatus> = instances
            .iter()
            .map(|(name, instance)| InstanceStatus {
                name: name.clone(),
                binding: instance.binding.clone(),
                started_at: instance.started_at,
                running: !instance.handle.is_finished(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Check if an instance with this name exists and is still running
    pub async fn is_running(&self, name: &str) -> bool {
        let instances = self.instances.read().await;
        instances
            .get(name)
            .map(|i| !i.handle.is_finished())
            .unwrap_or(false)
    }
}
