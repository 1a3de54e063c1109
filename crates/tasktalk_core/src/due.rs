//! Due dates arrive from the model as loosely formatted ISO-8601 text.
//! They are normalized to RFC 3339 when possible and otherwise kept as-is.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

/// Returns `None` for blank input.
pub fn normalize_due(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(normalize_with_offset(trimmed, local_offset()))
}

/// Renders a stored due date for display in local time.
pub fn display_due(stored: &str) -> String {
    display_with_offset(stored, local_offset())
}

fn normalize_with_offset(raw: &str, offset: UtcOffset) -> String {
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339)
        && let Ok(formatted) = parsed.format(&Rfc3339)
    {
        return formatted;
    }

    if let Some(naive) = parse_naive(raw)
        && let Ok(formatted) = naive.assume_offset(offset).format(&Rfc3339)
    {
        return formatted;
    }

    // Date-only and unrecognized values are kept verbatim.
    raw.to_string()
}

fn display_with_offset(stored: &str, offset: UtcOffset) -> String {
    if let Ok(parsed) = OffsetDateTime::parse(stored, &Rfc3339)
        && let Ok(formatted) = parsed
            .to_offset(offset)
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
    {
        return formatted;
    }

    stored.to_string()
}

fn parse_naive(raw: &str) -> Option<PrimitiveDateTime> {
    let normalized = raw.replacen(' ', "T", 1);
    PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        )
    })
    .ok()
}

#[cfg(test)]
mod tests {
    use super::{display_with_offset, normalize_due, normalize_with_offset};
    use time::UtcOffset;

    #[test]
    fn blank_due_is_absent() {
        assert_eq!(normalize_due("   "), None);
    }

    #[test]
    fn rfc3339_is_kept_canonical() {
        assert_eq!(
            normalize_with_offset("2025-12-21T17:00:00Z", UtcOffset::UTC),
            "2025-12-21T17:00:00Z"
        );
    }

    #[test]
    fn naive_datetime_assumes_given_offset() {
        let offset = UtcOffset::from_hms(2, 0, 0).unwrap();
        assert_eq!(
            normalize_with_offset("2025-12-21T17:00:00", offset),
            "2025-12-21T17:00:00+02:00"
        );
        assert_eq!(
            normalize_with_offset("2025-12-21 17:00", offset),
            "2025-12-21T17:00:00+02:00"
        );
    }

    #[test]
    fn date_only_and_free_text_are_kept() {
        assert_eq!(
            normalize_with_offset("2025-12-21", UtcOffset::UTC),
            "2025-12-21"
        );
        assert_eq!(
            normalize_with_offset("next friday", UtcOffset::UTC),
            "next friday"
        );
    }

    #[test]
    fn display_converts_to_offset() {
        assert_eq!(
            display_with_offset("2025-12-21T17:00:00Z", UtcOffset::UTC),
            "2025-12-21 17:00"
        );

        let offset = UtcOffset::from_hms(-5, 0, 0).unwrap();
        assert_eq!(
            display_with_offset("2025-12-21T17:00:00Z", offset),
            "2025-12-21 12:00"
        );
    }

    #[test]
    fn display_passes_through_unparsed_values() {
        assert_eq!(display_with_offset("2025-12-21", UtcOffset::UTC), "2025-12-21");
        assert_eq!(display_with_offset("someday", UtcOffset::UTC), "someday");
    }
}
