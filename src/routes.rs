use std::any::Any;

use axum::{
    error_handling::HandleErrorLayer,
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    routing::post,
    BoxError, Extension, Json, Router,
};
use tower::{
    timeout::{error::Elapsed, TimeoutLayer},
    ServiceBuilder,
};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, info};

use crate::{
    cloud::{CloudClients, CpuMetricRequest},
    error::{ApiError, INSTANCE_NOT_FOUND},
    models::MetricSeries,
    query::{CpuQuery, CpuQueryBody},
    AppContext,
};

const MALFORMED_BODY: &str = "Malformed JSON request body";

/// `/api/cpu` plus everything under the static root; `/` maps to `index.html`.
pub fn router(ctx: AppContext) -> Router {
    let static_files = ServeDir::new(&ctx.config.api.static_dir);
    let timeout = ctx.config.api.request_timeout;

    Router::new()
        .route("/api/cpu", post(cpu))
        .fallback_service(static_files)
        .layer(Extension(ctx))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    if err.is::<Elapsed>() {
                        ApiError::Timeout(timeout)
                    } else {
                        ApiError::Internal(err.to_string())
                    }
                }))
                .layer(TimeoutLayer::new(timeout)),
        )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        String::from("unknown panic payload")
    };
    ApiError::Internal(detail).into_response()
}

pub async fn cpu(
    ctx: Extension<AppContext>,
    payload: Result<Json<CpuQueryBody>, JsonRejection>,
) -> Result<Json<MetricSeries>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        debug!("rejected /api/cpu body: {}", rejection);
        ApiError::InvalidInput(MALFORMED_BODY)
    })?;

    let query = body.validate()?;
    let series = cpu_series(&ctx.clients, &query).await?;
    Ok(Json(series))
}

/// Resolves the instance behind `query.ip` and fetches its CPU series. At
/// most one call goes to each provider API.
pub async fn cpu_series(
    clients: &CloudClients,
    query: &CpuQuery,
) -> Result<MetricSeries, ApiError> {
    let instance_id = clients
        .instances
        .find_by_private_ip(query.ip)
        .await?
        .ok_or(ApiError::NotFound(INSTANCE_NOT_FOUND))?;
    info!("resolved {} to instance {}", query.ip, instance_id);

    let request = CpuMetricRequest {
        instance_id,
        start: query.start,
        end: query.end,
        period: query.period,
    };
    let datapoints = clients.metrics.cpu_utilization(&request).await?;
    debug!("{} datapoints for {}", datapoints.len(), request.instance_id);

    Ok(MetricSeries::from_datapoints(datapoints))
}
