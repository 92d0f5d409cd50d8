//! 日志与追踪初始化
//!
//! 控制台输出始终开启；配置了 `otlp_endpoint` 时额外把 span 导出到 OTLP 收集器。

use anyhow::Result;
use opentelemetry::trace::{TraceContextExt, TracerProvider as _};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use super::ObservabilityConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// 进程退出时刷新尚未导出的 span
pub struct TracingGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        let Some(provider) = self.provider.take() else {
            return;
        };
        if let Err(e) = provider.shutdown() {
            eprintln!("failed to flush spans: {e:?}");
        }
    }
}

/// 安装全局 subscriber，重复安装返回错误
pub fn init(config: &ObservabilityConfig) -> Result<TracingGuard> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.json_logs)];

    let provider = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let provider = otlp_provider(&config.service_name, endpoint)?;
            let tracer = provider.tracer(config.service_name.clone());
            layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed());
            Some(provider)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(&config.log_level))
        .try_init()?;

    Ok(TracingGuard { provider })
}

/// `RUST_LOG` 优先，其次是配置的级别，级别写错时退回 info
fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        // 奖励处理的耗时记在 span 关闭事件上
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    }
}

fn otlp_provider(service_name: &str, endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_string())
                .build(),
        )
        .with_batch_exporter(exporter)
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());
    Ok(provider)
}

/// 当前 span 所属的 trace ID，没有活动 trace 时为 None
pub fn current_trace_id() -> Option<String> {
    let context = tracing::Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}
