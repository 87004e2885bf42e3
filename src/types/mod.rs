pub mod admin;
pub mod monitoring;
pub mod quote;
pub mod settings;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_parses_provider_payload() {
        let json = r#"{
            "symbol": "AAPL",
            "price": 189.5,
            "dayLow": 187.1,
            "dayHigh": 190.2,
            "volume": 51234000.0,
            "timestamp": 1706800000000
        }"#;
        let quote: quote::Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.day_high, Some(190.2));
        assert_eq!(quote.name, None);
    }

    #[test]
    fn quote_tolerates_missing_optional_fields() {
        let quote: quote::Quote =
            serde_json::from_str(r#"{"symbol":"MSFT","price":310}"#).unwrap();
        assert_eq!(quote.price, 310.0);
        assert_eq!(quote.timestamp, 0);
        assert_eq!(quote.price_label(), "$310.00");
    }

    #[test]
    fn quote_symbol_match_ignores_case() {
        let quote = quote::Quote::new("googl", 140.0);
        assert!(quote.matches_symbol("GOOGL"));
        assert!(!quote.matches_symbol("GOOG"));
    }

    #[test]
    fn settings_serialize_with_storage_field_names() {
        let json = serde_json::to_value(settings::Settings::default()).unwrap();
        assert_eq!(json["refreshInterval"], 30);
        assert_eq!(json["cacheStaleTimeMinutes"], 5);
        assert_eq!(json["cacheGcTimeMinutes"], 10);
    }

    #[test]
    fn settings_lenient_parse_reports_defaulted_fields() {
        let value = serde_json::json!({"refreshInterval": 45, "cacheGcTimeMinutes": "ten"});
        let (parsed, defaulted) = settings::Settings::from_json_lenient(&value);
        assert_eq!(parsed.refresh_interval_seconds, 45);
        assert_eq!(parsed.cache_gc_time_minutes, 10);
        assert_eq!(defaulted, vec!["cacheStaleTimeMinutes", "cacheGcTimeMinutes"]);
    }

    #[test]
    fn field_range_clamps_and_rounds() {
        use settings::{CACHE_GC_TIME, CACHE_STALE_TIME, REFRESH_INTERVAL};
        assert_eq!(REFRESH_INTERVAL.clamp(1.0), 5);
        assert_eq!(REFRESH_INTERVAL.clamp(45.4), 45);
        assert_eq!(REFRESH_INTERVAL.clamp(45.6), 46);
        assert_eq!(REFRESH_INTERVAL.clamp(10_000.0), 600);
        assert_eq!(CACHE_STALE_TIME.clamp(-3.0), 0);
        assert_eq!(CACHE_GC_TIME.clamp(0.2), 1);
        assert_eq!(CACHE_GC_TIME.clamp(f64::INFINITY), 120);
        assert_eq!(CACHE_GC_TIME.clamp(f64::NAN), 10);
    }

    #[test]
    fn admin_config_uses_camel_case() {
        let json = serde_json::to_value(admin::AdminConfig::default()).unwrap();
        assert!(json.get("pollingIntervalSec").is_some());
        assert!(json["alertThrottle"].get("windowSeconds").is_some());
        assert_eq!(json["featureFlags"]["simulateProviderFailure"], false);
    }

    #[test]
    fn admin_patch_serializes_only_present_fields() {
        let patch = admin::AdminConfigPatch {
            polling_interval_sec: Some(45),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"pollingIntervalSec":45}"#);
    }

    #[test]
    fn admin_patch_diff_picks_changed_nested_fields() {
        let base = admin::AdminConfig::default();
        let mut edited = base.clone();
        edited.alert_throttle.max_alerts = 9;
        edited.feature_flags.sandbox_mode = true;

        let patch = admin::AdminConfigPatch::diff(&base, &edited);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "alertThrottle": {"maxAlerts": 9},
                "featureFlags": {"sandboxMode": true}
            })
        );
        assert!(admin::AdminConfigPatch::diff(&base, &base).is_empty());
    }

    #[test]
    fn monitoring_snapshot_parses_and_reports_latest() {
        let json = r#"{
            "latencyMs": [100, 120],
            "throughputPerMin": [10, 12],
            "errorRate": [0.0, 0.5],
            "dbLagMs": 12
        }"#;
        let snap: monitoring::MonitoringSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.latest_latency_ms(), Some(120.0));
        assert_eq!(snap.latest_error_rate(), Some(0.5));
        assert_eq!(snap.db_lag_ms, 12.0);
    }
}
