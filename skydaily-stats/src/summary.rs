//! Text of the daily post.
use crate::delta::Delta;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};

/// Compose the post body.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use skydaily_stats::{Snapshot, compose_summary};
///
/// let at = Utc.with_ymd_and_hms(2024, 11, 20, 12, 5, 0).unwrap();
/// let text = compose_summary(at, &Snapshot::new(1_234_567, 89, at), None, "https://bsky-stats.lut.li/");
/// assert_eq!(
///     text,
///     "Bluesky Daily Stats - 2024-11-20 12:05 UTC\n\
///      Users: 1,234,567\n\
///      Likes: 89\n\
///      Source: https://bsky-stats.lut.li/"
/// );
/// ```
pub fn compose_summary(
    now: DateTime<Utc>,
    snapshot: &Snapshot,
    delta: Option<&Delta>,
    source_url: &str,
) -> String {
    let mut lines = Vec::with_capacity(5);
    lines.push(format!(
        "Bluesky Daily Stats - {} UTC",
        now.format("%Y-%m-%d %H:%M")
    ));

    let mut users = format!("Users: {}", human_int(snapshot.users()));
    let mut likes = format!("Likes: {}", human_int(snapshot.likes()));
    if let Some(delta) = delta {
        users.push_str(&format!(" ({})", signed_int(delta.users)));
        likes.push_str(&format!(" ({})", signed_int(delta.likes)));
    }
    lines.push(users);
    lines.push(likes);

    if let Some(rate) = delta.and_then(|d| d.growth_rate) {
        lines.push(format!("Like growth: {}/s", human_rate(rate)));
    }

    lines.push(format!("Source: {source_url}"));
    lines.join("\n")
}

fn human_int(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn signed_int(n: i64) -> String {
    if n >= 0 {
        format!("+{}", human_int(n))
    } else {
        human_int(n)
    }
}

fn human_rate(r: f64) -> String {
    format!("{r:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(human_int(0), "0");
        assert_eq!(human_int(999), "999");
        assert_eq!(human_int(1_000), "1,000");
        assert_eq!(human_int(21_345_678), "21,345,678");
        assert_eq!(human_int(-1_234), "-1,234");
        assert_eq!(human_int(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn signs_are_explicit() {
        assert_eq!(signed_int(0), "+0");
        assert_eq!(signed_int(12_345), "+12,345");
        assert_eq!(signed_int(-7), "-7");
    }

    #[test]
    fn full_summary_with_delta() {
        let delta = Delta {
            users: 10_500,
            likes: -3,
            elapsed_secs: 86_400,
            growth_rate: Some(11.574_07),
        };
        let text = compose_summary(
            at(),
            &Snapshot::new(21_000_000, 3_000_000_000, at()),
            Some(&delta),
            "https://bsky-stats.lut.li/",
        );
        assert_eq!(
            text,
            "Bluesky Daily Stats - 2024-11-20 12:00 UTC\n\
             Users: 21,000,000 (+10,500)\n\
             Likes: 3,000,000,000 (-3)\n\
             Like growth: 11.5741/s\n\
             Source: https://bsky-stats.lut.li/"
        );
    }

    #[test]
    fn rate_line_is_omitted_when_unavailable() {
        let delta = Delta {
            users: 1,
            likes: 2,
            elapsed_secs: 0,
            growth_rate: None,
        };
        let text = compose_summary(at(), &Snapshot::new(5, 6, at()), Some(&delta), "src");
        assert!(text.contains("Users: 5 (+1)"));
        assert!(!text.contains("Like growth"));
    }
}
