use std::{net::IpAddr, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Datapoint;

/// A failed call to the cloud provider. `message` holds the SDK's full
/// error context and is only ever logged.
#[derive(Debug, Error)]
#[error("{operation} failed: {message}")]
pub struct ProviderError {
    pub operation: &'static str,
    pub message: String,
}

impl ProviderError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self { operation, message: message.into() }
    }
}

/// Average CPU utilization for one instance over `[start, end]`.
#[derive(Clone, Debug, PartialEq)]
pub struct CpuMetricRequest {
    pub instance_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period: i32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceDirectory: Send + Sync {
    /// Id of the first instance in the first reservation whose private IP
    /// matches, or `None` when nothing matches.
    async fn find_by_private_ip(&self, ip: IpAddr) -> Result<Option<String>, ProviderError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn cpu_utilization(
        &self,
        request: &CpuMetricRequest,
    ) -> Result<Vec<Datapoint>, ProviderError>;
}

/// The provider clients a request handler talks to. Built once at startup
/// and shared read-only between requests.
#[derive(Clone)]
pub struct CloudClients {
    pub instances: Arc<dyn InstanceDirectory>,
    pub metrics: Arc<dyn MetricsSource>,
}

impl CloudClients {
    pub fn new(instances: Arc<dyn InstanceDirectory>, metrics: Arc<dyn MetricsSource>) -> Self {
        Self { instances, metrics }
    }
}
