//! Application configuration assembled from the environment.

use crate::util::env::{env_opt, env_parse};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Origin for venue `distance_miles`.
    pub home_postcode: String,
    /// Daily tick, 24-hour `HH:MM` local time.
    pub scan_schedule: String,
    /// Max simultaneous source scans.
    pub scan_concurrency: usize,
    /// Per-scan total-time budget in seconds.
    pub scan_timeout_seconds: u64,
    pub geocoder_primary_url: String,
    pub geocoder_fallback_url: String,
    pub generic_extractor_url: String,
    pub generic_extractor_model: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        crate::util::env::init_env();
        Self {
            home_postcode: env_opt("HOME_POSTCODE").unwrap_or_else(|| "SW1A 1AA".to_string()),
            scan_schedule: env_opt("SCAN_SCHEDULE").unwrap_or_else(|| "06:00".to_string()),
            scan_concurrency: env_parse("SCAN_CONCURRENCY", 1usize).max(1),
            scan_timeout_seconds: env_parse("SCAN_TIMEOUT_SECONDS", 300u64),
            geocoder_primary_url: env_opt("GEOCODER_PRIMARY_URL")
                .unwrap_or_else(|| "https://api.postcodes.io".to_string()),
            geocoder_fallback_url: env_opt("GEOCODER_FALLBACK_URL")
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string()),
            generic_extractor_url: env_opt("GENERIC_EXTRACTOR_URL")
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            generic_extractor_model: env_opt("GENERIC_EXTRACTOR_MODEL")
                .unwrap_or_else(|| "qwen2.5:1.5b".to_string()),
            log_level: env_opt("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Parse `SCAN_SCHEDULE` into (hour, minute); falls back to 06:00 on
    /// malformed input.
    pub fn schedule_hm(&self) -> (u32, u32) {
        let mut parts = self.scan_schedule.splitn(2, ':');
        let hour: Option<u32> = parts.next().and_then(|p| p.trim().parse().ok());
        let minute: Option<u32> = parts.next().and_then(|p| p.trim().parse().ok());
        match (hour, minute) {
            (Some(h), Some(m)) if h < 24 && m < 60 => (h, m),
            _ => (6, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_schedule(schedule: &str) -> AppConfig {
        let mut config = AppConfig::from_env();
        config.scan_schedule = schedule.to_string();
        config
    }

    #[test]
    fn parses_schedule() {
        assert_eq!(config_with_schedule("06:00").schedule_hm(), (6, 0));
        assert_eq!(config_with_schedule("23:59").schedule_hm(), (23, 59));
        assert_eq!(config_with_schedule("7:30").schedule_hm(), (7, 30));
    }

    #[test]
    fn malformed_schedule_falls_back() {
        assert_eq!(config_with_schedule("24:00").schedule_hm(), (6, 0));
        assert_eq!(config_with_schedule("six am").schedule_hm(), (6, 0));
        assert_eq!(config_with_schedule("").schedule_hm(), (6, 0));
    }
}
