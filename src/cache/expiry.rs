//! Expiration policy derived from HTTP response headers

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, CACHE_CONTROL, EXPIRES};

/// Lifetime of a cache entry when the response carries no usable cache headers
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Computes when a response cached at `now` should expire
///
/// In priority order:
/// 1. `Cache-Control: max-age=N` with N > 0 gives `now + N` seconds
/// 2. a valid RFC 1123 `Expires` header gives that instant exactly
/// 3. otherwise `now + 1 hour`
///
/// A `max-age` too large to represent as a timestamp is treated as absent.
pub fn derive_expiration(headers: &HeaderMap, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(expires) = headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(parse_max_age)
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
    {
        return expires;
    }

    if let Some(expires) = headers
        .get(EXPIRES)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
    {
        return expires;
    }

    now + Duration::seconds(DEFAULT_TTL_SECS)
}

/// Extracts a positive `max-age` from a Cache-Control header value
fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        let seconds: i64 = value.trim().trim_matches('"').parse().ok()?;
        (seconds > 0).then_some(seconds)
    })
}

/// Parses an RFC 1123 date such as `Wed, 21 Oct 2026 07:28:00 GMT`
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_max_age_sets_relative_expiry() {
        let h = headers(&[("cache-control", "max-age=120")]);
        assert_eq!(derive_expiration(&h, fixed_now()), fixed_now() + Duration::seconds(120));
    }

    #[test]
    fn test_max_age_among_other_directives() {
        let h = headers(&[("cache-control", "private, Max-Age=300, must-revalidate")]);
        assert_eq!(derive_expiration(&h, fixed_now()), fixed_now() + Duration::seconds(300));
    }

    #[test]
    fn test_max_age_wins_over_expires() {
        let h = headers(&[
            ("cache-control", "max-age=60"),
            ("expires", "Wed, 21 Oct 2026 07:28:00 GMT"),
        ]);
        assert_eq!(derive_expiration(&h, fixed_now()), fixed_now() + Duration::seconds(60));
    }

    #[test]
    fn test_zero_max_age_falls_through_to_expires() {
        let h = headers(&[
            ("cache-control", "max-age=0"),
            ("expires", "Wed, 21 Oct 2026 07:28:00 GMT"),
        ]);
        let expected = Utc.with_ymd_and_hms(2026, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(derive_expiration(&h, fixed_now()), expected);
    }

    #[test]
    fn test_no_cache_directive_is_ignored() {
        let h = headers(&[("cache-control", "no-cache")]);
        assert_eq!(
            derive_expiration(&h, fixed_now()),
            fixed_now() + Duration::seconds(DEFAULT_TTL_SECS)
        );
    }

    #[test]
    fn test_expires_header_used_exactly() {
        let h = headers(&[("expires", "Thu, 15 Oct 2026 09:30:15 GMT")]);
        let expected = Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 15).unwrap();
        assert_eq!(derive_expiration(&h, fixed_now()), expected);
    }

    #[test]
    fn test_invalid_expires_falls_back_to_default() {
        let h = headers(&[("expires", "0")]);
        assert_eq!(
            derive_expiration(&h, fixed_now()),
            fixed_now() + Duration::hours(1)
        );
    }

    #[test]
    fn test_no_headers_defaults_to_one_hour() {
        assert_eq!(
            derive_expiration(&HeaderMap::new(), fixed_now()),
            fixed_now() + Duration::hours(1)
        );
    }

    #[test]
    fn test_unrepresentable_max_age_falls_through() {
        let h = headers(&[("cache-control", "max-age=9223372036854775807")]);
        assert_eq!(
            derive_expiration(&h, fixed_now()),
            fixed_now() + Duration::hours(1)
        );

        let h = headers(&[
            ("cache-control", "max-age=99999999999999"),
            ("expires", "Wed, 21 Oct 2026 07:28:00 GMT"),
        ]);
        let expected = Utc.with_ymd_and_hms(2026, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(derive_expiration(&h, fixed_now()), expected);
    }

    #[test]
    fn test_parse_max_age_rejects_garbage() {
        assert_eq!(parse_max_age("max-age=abc"), None);
        assert_eq!(parse_max_age("max-age=-5"), None);
        assert_eq!(parse_max_age("s-maxage=30"), None);
        assert_eq!(parse_max_age("max-age=\"45\""), Some(45));
    }
}
