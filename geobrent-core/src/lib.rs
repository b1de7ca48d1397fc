//! GeoBrent core: change-point detection and event-impact analysis for a
//! daily oil price series.
//!
//! - Validated price series with derived rolling statistics (`series`)
//! - Curated geopolitical event catalog (`events`)
//! - Bayesian change-point detector (`detector`)
//! - Before/after window analysis around any anchor (`window`)
//! - Cross-factor summaries (`aggregate`)
//! - A read-only query facade over all of the above (`facade`)
//!
//! All inputs are loaded once and treated as immutable; every query borrows.

pub mod aggregate;
pub mod config;
pub mod data;
pub mod detector;
pub mod domain;
pub mod error;
pub mod events;
pub mod facade;
pub mod fingerprint;
pub mod series;
pub mod stats;
pub mod window;

pub use aggregate::{CorrelationAggregator, CorrelationSummary, PeriodConfig};
pub use config::AnalysisConfig;
pub use detector::{ChangePointDetector, DetectorConfig};
pub use error::{AnalysisError, ConfigError, DataError};
pub use events::{EventCatalog, EventFilter};
pub use facade::{AnalysisContext, ChangePointReport, DashboardSummary, QueryFacade};
pub use series::SeriesStore;
pub use window::{WindowAnalyzer, WindowConfig};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: loaded state and every result type can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<SeriesStore>();
        require_sync::<SeriesStore>();
        require_send::<EventCatalog>();
        require_sync::<EventCatalog>();
        require_send::<AnalysisContext>();
        require_sync::<AnalysisContext>();
        require_send::<ChangePointDetector>();
        require_sync::<ChangePointDetector>();

        require_send::<domain::ChangePoint>();
        require_sync::<domain::ChangePoint>();
        require_send::<domain::ImpactAnalysis>();
        require_sync::<domain::ImpactAnalysis>();
        require_send::<CorrelationSummary>();
        require_sync::<CorrelationSummary>();

        require_send::<AnalysisError>();
        require_sync::<AnalysisError>();
    }
}
