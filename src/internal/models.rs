use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

/// A named outlet with its RSS endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineItem {
    pub title: String,
    pub link: String,
    #[serde(rename = "pubDate", with = "pub_date")]
    pub pub_date: Timestamp,
}

/// All items returned for one source during a fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResult {
    pub feed: FeedSource,
    pub items: Vec<HeadlineItem>,
}

/// Body returned by the RSS-to-JSON conversion endpoint.
///
/// Only `items` is required; `status` and `message` are reported by the
/// service when it could not convert the feed. Items that don't parse are
/// skipped on their own so one bad entry doesn't cost the whole source.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(deserialize_with = "skip_invalid_items")]
    pub items: Vec<HeadlineItem>,
}

fn skip_invalid_items<'de, D>(deserializer: D) -> Result<Vec<HeadlineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<HeadlineItem>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping unreadable feed item: {}", e);
                None
            }
        })
        .collect())
}

/// Lenient `pubDate` handling.
///
/// The conversion service emits `YYYY-MM-DD HH:MM:SS` in UTC. Cached entries
/// are written back as RFC 3339, and raw RFC 2822 dates are accepted too.
pub mod pub_date {
    use jiff::Timestamp;
    use jiff::civil::DateTime;
    use jiff::tz::TimeZone;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(ts)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognized date: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<Timestamp> {
        let raw = raw.trim();
        if let Ok(ts) = raw.parse::<Timestamp>() {
            return Some(ts);
        }
        if let Ok(dt) = raw.parse::<DateTime>()
            && let Ok(zoned) = dt.to_zoned(TimeZone::UTC)
        {
            return Some(zoned.timestamp());
        }
        jiff::fmt::rfc2822::parse(raw)
            .ok()
            .map(|zoned| zoned.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conversion_service_date_as_utc() {
        let ts = pub_date::parse("2025-03-01 08:30:00").unwrap();
        assert_eq!(ts.to_string(), "2025-03-01T08:30:00Z");
    }

    #[test]
    fn parses_rfc3339_and_rfc2822() {
        let a = pub_date::parse("2025-03-01T08:30:00Z").unwrap();
        let b = pub_date::parse("Sat, 01 Mar 2025 09:30:00 +0100").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(pub_date::parse("yesterday-ish").is_none());
        assert!(pub_date::parse("").is_none());
    }

    #[test]
    fn response_without_items_fails_to_parse() {
        let body = r#"{"status":"error","message":"rss_url parameter is required."}"#;
        assert!(serde_json::from_str::<FeedResponse>(body).is_err());
    }

    #[test]
    fn response_skips_items_with_bad_dates() {
        let body = r#"{
            "status": "ok",
            "items": [
                {"title": "Uno", "link": "https://example.com/1", "pubDate": "2025-03-01 08:30:00"},
                {"title": "Dos", "link": "https://example.com/2", "pubDate": ""},
                {"title": "Tres", "link": "https://example.com/3", "pubDate": "2025-03-01 07:00:00"},
                {"title": "Cuatro", "link": "https://example.com/4"}
            ]
        }"#;

        let response: FeedResponse = serde_json::from_str(body).unwrap();
        let titles: Vec<_> = response.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Uno", "Tres"]);
    }

    #[test]
    fn response_with_non_array_items_fails_to_parse() {
        let body = r#"{"status":"ok","items":"nope"}"#;
        assert!(serde_json::from_str::<FeedResponse>(body).is_err());
    }

    #[test]
    fn response_ignores_unknown_fields() {
        let body = r#"{
            "status": "ok",
            "feed": {"title": "Portada"},
            "items": [{
                "title": "Titular",
                "link": "https://example.com/a",
                "pubDate": "2025-03-01 08:30:00",
                "guid": "abc",
                "author": "Redacción"
            }]
        }"#;

        let response: FeedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status.as_deref(), Some("ok"));
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].title, "Titular");
    }

    #[test]
    fn headline_serializes_pub_date_as_rfc3339() {
        let item = HeadlineItem {
            title: "t".to_string(),
            link: "https://example.com".to_string(),
            pub_date: pub_date::parse("2025-03-01 08:30:00").unwrap(),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""pubDate":"2025-03-01T08:30:00Z""#));
    }
}
