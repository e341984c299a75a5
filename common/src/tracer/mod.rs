mod tracer_engine;

pub use tracer_engine::{TracerEngine, TracerOptions};

/// Should be called at the start of each binary.
/// The level given is used unless overridden by the `RUST_LOG` environment variable.
#[macro_export]
macro_rules! init_tracer {
    ($level:expr) => {{
        $crate::tracer::TracerEngine::new(
            $crate::tracer::TracerOptions::new($level),
            env!("CARGO_BIN_NAME"),
        )
    }};
}
