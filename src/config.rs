use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::nats::NatsCallConfig;
use crate::transcribe::RetryPolicy;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub nats: NatsConfig,
    pub retry: RetryConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub language_code: String,
}

#[derive(Debug, Deserialize)]
pub struct NatsConfig {
    pub url: String,
    pub demand_batch: usize,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct StreamConfig {
    pub chunk_size: usize,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            delay: Duration::from_millis(self.retry.delay_ms),
            ..RetryPolicy::default()
        }
    }

    pub fn nats_call_config(&self) -> NatsCallConfig {
        NatsCallConfig {
            url: self.nats.url.clone(),
            demand_batch: self.nats.demand_batch,
            idle_timeout: Duration::from_secs(self.nats.idle_timeout_secs),
        }
    }
}
