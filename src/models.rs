use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// One averaged CPU sample for a single bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub average: f64,
}

/// Chart-ready series: `timestamps[i]` pairs with `values[i]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MetricSeries {
    pub timestamps: Vec<String>,
    pub values: Vec<f64>,
}

impl MetricSeries {
    pub fn from_datapoints(mut datapoints: Vec<Datapoint>) -> Self {
        // CloudWatch returns buckets in no particular order
        datapoints.sort_by_key(|dp| dp.timestamp);

        let mut series = MetricSeries {
            timestamps: Vec::with_capacity(datapoints.len()),
            values: Vec::with_capacity(datapoints.len()),
        };
        for dp in datapoints {
            series.timestamps.push(format_timestamp(&dp.timestamp));
            series.values.push(round2(dp.average));
        }
        series
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Rounds to the nearest hundredth of the exact binary value. A value sitting
/// exactly halfway between two hundredths can only be an odd multiple of 1/8;
/// those go to the even neighbour.
fn round2(value: f64) -> f64 {
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        return (value * 100.0).round_ties_even() / 100.0;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}
