//! Opt-in `tracing` output for hosts embedding a scatter chart.
//!
//! The chart only emits events: index rebuilds, resize commits, membership
//! recomputes, stale frames and polygon lifecycle. Installing a subscriber is
//! left to the host, or to [`init_tracing`] behind the `telemetry` feature.

/// Filter used when `RUST_LOG` is unset: chart events at debug, the rest at warn.
pub const DEFAULT_FILTER: &str = "warn,scatter_rs=debug";

/// Installs a compact global subscriber filtered by `RUST_LOG`, falling back
/// to `fallback_filter`.
///
/// Returns `false` without the `telemetry` feature, for an unparsable
/// fallback, or when the host already installed a global subscriber.
#[must_use]
pub fn init_tracing(fallback_filter: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => match EnvFilter::try_new(fallback_filter) {
                Ok(filter) => filter,
                Err(_) => return false,
            },
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .compact()
            .try_init()
            .is_ok()
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback_filter;
        false
    }
}

/// [`init_tracing`] with [`DEFAULT_FILTER`].
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(DEFAULT_FILTER)
}
