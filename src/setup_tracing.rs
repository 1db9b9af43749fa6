use crate::config::TracingConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn setup_tracing(config: &TracingConfig) -> anyhow::Result<()> {
    const PKG_NAME: &str = env!("CARGO_PKG_NAME");

    let registry = tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy()
                .add_directive(format!("{}=info", PKG_NAME.replace('-', "_")).parse()?)
                .add_directive("share_types=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer());

    #[cfg(feature = "opentelemetry")]
    let registry = registry.with(if config.opentelemetry {
        use opentelemetry::{KeyValue, global, trace::TracerProvider};
        use opentelemetry_otlp::WithExportConfig;
        use opentelemetry_sdk::{Resource, trace::Sampler};
        use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
        use std::time::Duration;

        let otel_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_timeout(Duration::from_secs(1))
            .build()?;

        let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_batch_exporter(otel_exporter)
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(
                Resource::builder()
                    .with_attributes([
                        KeyValue::new(SERVICE_NAME, PKG_NAME),
                        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                    ])
                    .build(),
            )
            .build();

        let tracer = tracer_provider.tracer(PKG_NAME);
        global::set_tracer_provider(tracer_provider);
        Some(tracing_opentelemetry::OpenTelemetryLayer::new(tracer))
    } else {
        None
    });

    #[cfg(not(feature = "opentelemetry"))]
    let _ = config;

    registry.init();
    Ok(())
}
