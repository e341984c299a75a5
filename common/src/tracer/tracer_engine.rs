use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

pub struct TracerOptions {
    default_level: LevelFilter,
}

impl TracerOptions {
    pub fn new(default_level: LevelFilter) -> Self {
        Self { default_level }
    }
}

/// This object initialises the stdout tracer, given a TracerOptions struct.
pub struct TracerEngine {
    service_name: String,
}

impl TracerEngine {
    /// Initialises the stdout tracer for the binary
    /// #Arguments
    /// * `options` - The caller-specified instance of TracerOptions.
    /// * `service_name` - The name of the binary, attached to the root span.
    /// #Returns
    /// An instance of TracerEngine
    pub fn new(options: TracerOptions, service_name: &str) -> Self {
        let stdout_tracer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false);

        // This filter is applied to the stdout tracer
        let log_filter = EnvFilter::builder()
            .with_default_directive(options.default_level.into())
            .from_env_lossy();

        let subscriber =
            tracing_subscriber::Registry::default().with(stdout_tracer.with_filter(log_filter));

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::warn!("{service_name}: a global subscriber is already installed");
        }

        Self {
            service_name: service_name.to_owned(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_engines_keep_the_first_subscriber() {
        let first = TracerEngine::new(TracerOptions::new(LevelFilter::INFO), "first");
        let second = TracerEngine::new(TracerOptions::new(LevelFilter::DEBUG), "second");
        assert_eq!(first.service_name(), "first");
        assert_eq!(second.service_name(), "second");
    }
}
