// AWS-backed implementations of the cloud traits

use std::{net::IpAddr, sync::Arc};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudwatch::{
    primitives::DateTime as AwsDateTime,
    types::{Dimension, StandardUnit, Statistic},
};
use aws_sdk_ec2::types::Filter;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    cloud::{CloudClients, CpuMetricRequest, InstanceDirectory, MetricsSource, ProviderError},
    config::AwsConfig,
    models::Datapoint,
};

const EC2_NAMESPACE: &str = "AWS/EC2";
const CPU_METRIC: &str = "CPUUtilization";
const INSTANCE_DIMENSION: &str = "InstanceId";
const PRIVATE_IP_FILTER: &str = "private-ip-address";

pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).profile_name(&config.profile);

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    // LocalStack and similar
    if let Some(endpoint_url) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    loader.load().await
}

pub async fn cloud_clients(config: &AwsConfig) -> CloudClients {
    let sdk_config = load_sdk_config(config).await;
    CloudClients::new(
        Arc::new(Ec2Directory::new(&sdk_config)),
        Arc::new(CloudWatchMetrics::new(&sdk_config)),
    )
}

#[derive(Clone, Debug)]
pub struct Ec2Directory {
    client: aws_sdk_ec2::Client,
}

impl Ec2Directory {
    pub fn new(config: &SdkConfig) -> Self {
        Self { client: aws_sdk_ec2::Client::new(config) }
    }
}

#[async_trait]
impl InstanceDirectory for Ec2Directory {
    async fn find_by_private_ip(&self, ip: IpAddr) -> Result<Option<String>, ProviderError> {
        let output = self
            .client
            .describe_instances()
            .filters(Filter::builder().name(PRIVATE_IP_FILTER).values(ip.to_string()).build())
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(
                    "ec2:DescribeInstances",
                    aws_sdk_ec2::error::DisplayErrorContext(e).to_string(),
                )
            })?;

        let instance_id = output
            .reservations()
            .first()
            .and_then(|reservation| reservation.instances().first())
            .and_then(|instance| instance.instance_id())
            .map(str::to_owned);

        Ok(instance_id)
    }
}

#[derive(Clone, Debug)]
pub struct CloudWatchMetrics {
    client: aws_sdk_cloudwatch::Client,
}

impl CloudWatchMetrics {
    pub fn new(config: &SdkConfig) -> Self {
        Self { client: aws_sdk_cloudwatch::Client::new(config) }
    }
}

#[async_trait]
impl MetricsSource for CloudWatchMetrics {
    async fn cpu_utilization(
        &self,
        request: &CpuMetricRequest,
    ) -> Result<Vec<Datapoint>, ProviderError> {
        let dimension = Dimension::builder()
            .name(INSTANCE_DIMENSION)
            .value(&request.instance_id)
            .build()
            .map_err(|e| ProviderError::new("cloudwatch:GetMetricStatistics", e.to_string()))?;

        let output = self
            .client
            .get_metric_statistics()
            .namespace(EC2_NAMESPACE)
            .metric_name(CPU_METRIC)
            .dimensions(dimension)
            .start_time(to_aws_time(&request.start))
            .end_time(to_aws_time(&request.end))
            .period(request.period)
            .statistics(Statistic::Average)
            .unit(StandardUnit::Percent)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(
                    "cloudwatch:GetMetricStatistics",
                    aws_sdk_cloudwatch::error::DisplayErrorContext(e).to_string(),
                )
            })?;

        let datapoints = output
            .datapoints()
            .iter()
            .filter_map(|dp| {
                let timestamp = dp.timestamp().and_then(from_aws_time);
                match (timestamp, dp.average()) {
                    (Some(timestamp), Some(average)) => Some(Datapoint { timestamp, average }),
                    _ => {
                        debug!("skipping incomplete datapoint: {:?}", dp);
                        None
                    }
                }
            })
            .collect();

        Ok(datapoints)
    }
}

fn to_aws_time(ts: &DateTime<Utc>) -> AwsDateTime {
    AwsDateTime::from_secs_and_nanos(ts.timestamp(), ts.timestamp_subsec_nanos())
}

fn from_aws_time(ts: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}
