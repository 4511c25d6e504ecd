use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// The lifecycle fields rewritten together on creation and renewal.
///
/// All three values derive from the same instant, `now + period`:
/// `ttl` in epoch seconds (what the store's reaper compares against),
/// `warranty_expiry` in epoch milliseconds (the logical expiry), and
/// `sort_key` as an RFC3339 rendering whose lexicographic order matches
/// chronological order in the owner index.
#[derive(Debug, Clone, PartialEq)]
pub struct WarrantyStamp {
    pub ttl: i64,
    pub warranty_expiry: i64,
    pub sort_key: String,
}

/// Compute fresh lifecycle fields as of `now`.
///
/// The stamp is always strictly in the future for a positive `period`;
/// the store refuses or immediately reaps past TTL values.
pub fn warranty_stamp(now: DateTime<Utc>, period: Duration) -> WarrantyStamp {
    stamp_at(now + period)
}

/// Compute renewal lifecycle fields that strictly advance the record.
///
/// A renewal landing within the clock's granularity of the mutation
/// that produced `prior_ttl` would re-derive the same expiry second and
/// leave `TTL`, `warrantyExpiry` and `sk` in place, making the renewal
/// invisible to the index and to dedup keys. When that happens the
/// expiry is pushed one TTL unit past the prior one instead.
pub fn renewal_stamp(now: DateTime<Utc>, period: Duration, prior_ttl: i64) -> WarrantyStamp {
    let expiry: DateTime<Utc> = now + period;

    if expiry.timestamp() > prior_ttl {
        return stamp_at(expiry);
    }

    match DateTime::from_timestamp(prior_ttl + 1, 0) {
        Some(bumped) => stamp_at(bumped),
        // prior_ttl out of the representable range; the record is
        // corrupt and the fresh stamp is the best available
        None => stamp_at(expiry),
    }
}

fn stamp_at(expiry: DateTime<Utc>) -> WarrantyStamp {
    WarrantyStamp {
        ttl: expiry.timestamp(),
        warranty_expiry: expiry.timestamp_millis(),
        sort_key: expiry.to_rfc3339_opts(SecondsFormat::Micros, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamp_is_now_plus_period() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let stamp = warranty_stamp(now, Duration::days(2));

        assert_eq!(now.timestamp() + 2 * 24 * 3600, stamp.ttl);
        assert_eq!(now.timestamp_millis() + 2 * 24 * 3600 * 1000, stamp.warranty_expiry);
        assert!(stamp.ttl > now.timestamp());
        assert!(stamp.warranty_expiry > now.timestamp_millis());
    }

    #[test]
    fn later_stamp_sorts_after_earlier_stamp() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let first = warranty_stamp(now, Duration::days(730));
        let second = warranty_stamp(now + Duration::seconds(30), Duration::days(730));

        assert_ne!(first.sort_key, second.sort_key);
        assert!(second.sort_key > first.sort_key);
        assert!(second.ttl > first.ttl);
    }

    #[test]
    fn renewal_stamp_matches_fresh_stamp_once_the_clock_advances() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let created = warranty_stamp(now, Duration::days(730));

        let later = now + Duration::seconds(30);
        let renewed = renewal_stamp(later, Duration::days(730), created.ttl);

        assert_eq!(warranty_stamp(later, Duration::days(730)), renewed);
    }

    #[test]
    fn same_instant_renewal_still_advances_every_field() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let created = warranty_stamp(now, Duration::days(730));

        let renewed = renewal_stamp(now, Duration::days(730), created.ttl);

        assert!(renewed.ttl > created.ttl);
        assert!(renewed.warranty_expiry > created.warranty_expiry);
        assert!(renewed.sort_key > created.sort_key);
    }

    #[test]
    fn sub_second_renewal_still_advances_every_field() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let created = warranty_stamp(now, Duration::days(730));

        let renewed = renewal_stamp(
            now + Duration::milliseconds(3),
            Duration::days(730),
            created.ttl,
        );

        assert!(renewed.ttl > created.ttl);
        assert!(renewed.warranty_expiry > created.warranty_expiry);
        assert!(renewed.sort_key > created.sort_key);
    }

    #[test]
    fn sort_key_sub_second_precision_keeps_close_renewals_distinct() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let first = warranty_stamp(now, Duration::days(730));
        let second = warranty_stamp(now + Duration::microseconds(50), Duration::days(730));

        assert!(second.sort_key > first.sort_key);
    }
}
