use std::sync::OnceLock;

const FALLBACK_LOCALE: &str = "en-US";
const FALLBACK_TIME_ZONE: &str = "Etc/UTC";

static DETECTED_LOCALE: OnceLock<String> = OnceLock::new();

/// Host locale as a BCP-47 tag (`en-US`), detected once per process.
pub fn locale() -> &'static str {
    DETECTED_LOCALE.get_or_init(|| {
        sys_locale::get_locale()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
    })
}

/// IANA identifier of the local time zone, never empty.
///
/// Looked up on every call since the host may change zones while running.
pub fn time_zone() -> String {
    match iana_time_zone::get_timezone() {
        Ok(tz) if !tz.is_empty() => tz,
        _ => FALLBACK_TIME_ZONE.to_string(),
    }
}
