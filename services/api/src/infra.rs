use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use registrar::clock::SystemClock;
use registrar::config::PolicyConfig;
use registrar::error::AppError;
use registrar::store::InMemoryStore;
use registrar::Registrar;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Snapshot-backed when a path is given, purely in memory otherwise.
pub(crate) fn open_store(snapshot: Option<&Path>) -> Result<Arc<InMemoryStore>, AppError> {
    let store = match snapshot {
        Some(path) => {
            info!(path = %path.display(), "opening store snapshot");
            InMemoryStore::open(path)?
        }
        None => InMemoryStore::new(),
    };
    Ok(Arc::new(store))
}

pub(crate) fn live_registrar(
    store: Arc<InMemoryStore>,
    policy: PolicyConfig,
) -> Registrar<InMemoryStore> {
    Registrar::with_store_notifications(store, Arc::new(SystemClock), policy)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates_with_whitespace() {
        let date = parse_date(" 2025-08-04 ").expect("valid");
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 8, 4).expect("valid date"));
    }

    #[test]
    fn reports_the_offending_value() {
        let err = parse_date("2025-13-01").expect_err("invalid month");
        assert!(err.contains("2025-13-01"));
    }
}
