//! # POS Sales & Reconciliation
//!
//! The register side of the house: every sale the terminal rings up lands
//! here, whether it was entered online or replayed from an offline queue.
//! Reconciliation is idempotent on `local_id` — the client-generated key a
//! terminal attaches before it knows whether the upload will succeed. A
//! retried batch inserts each record at most once, no matter how many times
//! the network flaked mid-sync.
//!
//! Wallet transfers show up here too: the ledger engine records a linked sale
//! (`payment_type = wallet-transfer`) for every completed transfer so POS
//! reporting sees one consistent revenue stream.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transaction::types::{Amount, PaymentType};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted POS sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub product_name: String,
    /// Unit price; line total is `amount × quantity`.
    pub amount: Amount,
    pub quantity: u64,
    pub payment_type: PaymentType,
    pub timestamp: DateTime<Utc>,
    pub synced: bool,
    /// Client-generated idempotency key. Present on anything that came
    /// through the offline queue; absent for sales entered directly.
    pub local_id: Option<String>,
    /// Back-reference to the wallet transfer that paid for this sale.
    pub wavepay_transaction_id: Option<String>,
}

/// An incoming sale, as submitted by a terminal.
///
/// Quantity defaults to one and the timestamp to "now" when the client omits
/// them, matching what a register sends for a simple walk-up sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDraft {
    pub product_name: String,
    pub amount: Amount,
    #[serde(default = "default_quantity")]
    pub quantity: u64,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub local_id: Option<String>,
    #[serde(default)]
    pub wavepay_transaction_id: Option<String>,
}

fn default_quantity() -> u64 {
    1
}

/// Outcome of inserting one sale.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleInsert {
    Inserted(SaleRecord),
    /// The `local_id` was already known; nothing was written.
    AlreadyKnown(String),
}

/// Result of reconciling a batch (sales or wallet transfers).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced_count: usize,
    /// Identifiers of the records actually inserted; skipped duplicates are
    /// not listed.
    pub synced_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Filters & Stats
// ---------------------------------------------------------------------------

/// Time filter for sale listings.
///
/// At most one dimension is honored: a day-count wins over an explicit range,
/// and an empty filter returns everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesFilter {
    pub days: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Aggregates for one reporting window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStats {
    /// `Σ(amount × quantity)` over the window.
    pub total: Amount,
    pub count: usize,
}

/// Daily and weekly revenue summaries.
#[derive(Debug, Clone, Serialize)]
pub struct SalesStats {
    pub daily: WindowStats,
    /// The sales inside today's window, newest first.
    pub daily_records: Vec<SaleRecord>,
    pub weekly: WindowStats,
}

// ---------------------------------------------------------------------------
// Sales Book
// ---------------------------------------------------------------------------

/// In-memory book of sale records.
///
/// Not internally synchronized — the ledger engine owns one behind its state
/// lock, so sale inserts commit in the same critical section as the wallet
/// transfer they mirror.
#[derive(Debug, Default)]
pub struct SalesBook {
    records: Vec<SaleRecord>,
    known_local_ids: HashSet<String>,
}

impl SalesBook {
    pub fn new() -> Self {
        SalesBook::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts one sale. Idempotent on `local_id`: a draft whose `local_id`
    /// is already known is skipped, which makes blind client retries safe.
    pub fn add(&mut self, draft: SaleDraft, synced: bool) -> SaleInsert {
        if let Some(local_id) = &draft.local_id {
            if self.known_local_ids.contains(local_id) {
                debug!(%local_id, "sale already known, skipping");
                return SaleInsert::AlreadyKnown(local_id.clone());
            }
        }
        let record = SaleRecord {
            product_name: draft.product_name,
            amount: draft.amount,
            quantity: draft.quantity,
            payment_type: draft.payment_type,
            timestamp: draft.timestamp.unwrap_or_else(Utc::now),
            synced,
            local_id: draft.local_id,
            wavepay_transaction_id: draft.wavepay_transaction_id,
        };
        if let Some(local_id) = &record.local_id {
            self.known_local_ids.insert(local_id.clone());
        }
        self.records.push(record.clone());
        SaleInsert::Inserted(record)
    }

    /// Reconciles an offline batch. Each item goes through [`add`](Self::add);
    /// the report lists only the `local_id`s that were newly inserted.
    pub fn sync(&mut self, batch: Vec<SaleDraft>) -> SyncReport {
        let mut report = SyncReport::default();
        for draft in batch {
            if let SaleInsert::Inserted(record) = self.add(draft, true) {
                report.synced_count += 1;
                if let Some(local_id) = record.local_id {
                    report.synced_ids.push(local_id);
                }
            }
        }
        report
    }

    /// Lists sales matching the filter, newest first.
    pub fn list(&self, filter: &SalesFilter) -> Vec<SaleRecord> {
        let now = Utc::now();
        let mut out: Vec<SaleRecord> = self
            .records
            .iter()
            .filter(|r| {
                if let Some(days) = filter.days {
                    let cutoff = Duration::try_days(days).and_then(|d| now.checked_sub_signed(d));
                    return match cutoff {
                        Some(cutoff) => r.timestamp >= cutoff,
                        // Cutoff not representable: a huge look-back covers
                        // everything, a huge negative one covers nothing.
                        None => days >= 0,
                    };
                }
                if filter.start_date.is_some() || filter.end_date.is_some() {
                    let after_start = filter.start_date.map_or(true, |s| r.timestamp >= s);
                    let before_end = filter.end_date.map_or(true, |e| r.timestamp <= e);
                    return after_start && before_end;
                }
                true
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    /// Revenue summaries for the current day and week.
    ///
    /// Daily window: start of today (UTC) to `now`. Weekly window: start of
    /// the most recent Monday (UTC) to `now`.
    pub fn stats(&self, now: DateTime<Utc>) -> SalesStats {
        let day_start = start_of_day(now);
        let week_start = day_start - Duration::days(now.weekday().num_days_from_monday() as i64);

        let mut daily_records: Vec<SaleRecord> = self
            .records
            .iter()
            .filter(|r| r.timestamp >= day_start && r.timestamp <= now)
            .cloned()
            .collect();
        daily_records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let weekly: Vec<&SaleRecord> = self
            .records
            .iter()
            .filter(|r| r.timestamp >= week_start && r.timestamp <= now)
            .collect();

        SalesStats {
            daily: WindowStats {
                total: sum_line_totals(daily_records.iter()),
                count: daily_records.len(),
            },
            daily_records,
            weekly: WindowStats {
                total: sum_line_totals(weekly.iter().copied()),
                count: weekly.len(),
            },
        }
    }
}

fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    // Midnight always exists for UTC.
    t.date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn sum_line_totals<'a>(records: impl Iterator<Item = &'a SaleRecord>) -> Amount {
    records.fold(Amount::ZERO, |acc, r| {
        r.amount
            .checked_mul(r.quantity)
            .and_then(|line| acc.checked_add(line))
            .unwrap_or(Amount::from_minor_units(u64::MAX))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(name: &str, cents: u64, local_id: Option<&str>) -> SaleDraft {
        SaleDraft {
            product_name: name.into(),
            amount: Amount::from_minor_units(cents),
            quantity: 1,
            payment_type: PaymentType::Cash,
            timestamp: None,
            local_id: local_id.map(str::to_owned),
            wavepay_transaction_id: None,
        }
    }

    #[test]
    fn add_inserts_and_defaults_timestamp() {
        let mut book = SalesBook::new();
        let before = Utc::now();
        let SaleInsert::Inserted(record) = book.add(draft("Coffee", 450, None), false) else {
            panic!("expected insert");
        };
        assert_eq!(record.product_name, "Coffee");
        assert!(record.timestamp >= before);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn add_is_idempotent_on_local_id() {
        let mut book = SalesBook::new();
        assert!(matches!(
            book.add(draft("Coffee", 450, Some("pos-1")), true),
            SaleInsert::Inserted(_)
        ));
        assert_eq!(
            book.add(draft("Coffee", 450, Some("pos-1")), true),
            SaleInsert::AlreadyKnown("pos-1".into())
        );
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn records_without_local_id_never_collide() {
        let mut book = SalesBook::new();
        book.add(draft("Coffee", 450, None), false);
        book.add(draft("Coffee", 450, None), false);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn sync_skips_duplicates_and_reports_new_ids() {
        let mut book = SalesBook::new();
        book.add(draft("Muffin", 300, Some("pos-1")), true);

        let report = book.sync(vec![
            draft("Coffee", 450, Some("pos-2")),
            draft("Muffin", 300, Some("pos-1")), // already stored
            draft("Tea", 350, Some("pos-3")),
        ]);

        assert_eq!(report.synced_count, 2);
        assert_eq!(report.synced_ids, vec!["pos-2".to_owned(), "pos-3".to_owned()]);
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn list_is_newest_first() {
        let mut book = SalesBook::new();
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        for (i, name) in ["first", "second", "third"].iter().enumerate() {
            let mut d = draft(name, 100, None);
            d.timestamp = Some(t0 + Duration::hours(i as i64));
            book.add(d, false);
        }
        let listed = book.list(&SalesFilter::default());
        let names: Vec<&str> = listed.iter().map(|r| r.product_name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[test]
    fn days_filter_takes_precedence_over_range() {
        let mut book = SalesBook::new();
        let mut old = draft("old", 100, None);
        old.timestamp = Some(Utc::now() - Duration::days(30));
        book.add(old, false);
        book.add(draft("recent", 100, None), false);

        let filter = SalesFilter {
            days: Some(7),
            // Range that would include everything; days wins.
            start_date: Some(Utc::now() - Duration::days(365)),
            end_date: None,
        };
        let listed = book.list(&filter);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product_name, "recent");
    }

    #[test]
    fn days_filter_survives_extreme_values() {
        let mut book = SalesBook::new();
        book.add(draft("recent", 100, None), false);

        // Way past what a DateTime subtraction can represent; the window
        // covers all of history rather than panicking.
        let huge = SalesFilter {
            days: Some(10_000_000_000),
            ..SalesFilter::default()
        };
        assert_eq!(book.list(&huge).len(), 1);

        // Equally extreme in the other direction: a cutoff in the far
        // future matches nothing.
        let negative = SalesFilter {
            days: Some(-10_000_000_000),
            ..SalesFilter::default()
        };
        assert!(book.list(&negative).is_empty());
    }

    #[test]
    fn range_filter_honors_both_bounds() {
        let mut book = SalesBook::new();
        for day in [1, 10, 20] {
            let mut d = draft(&format!("day{day}"), 100, None);
            d.timestamp = Some(Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap());
            book.add(d, false);
        }
        let filter = SalesFilter {
            days: None,
            start_date: Some(Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap()),
        };
        let listed = book.list(&filter);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product_name, "day10");
    }

    #[test]
    fn stats_windows_split_daily_and_weekly() {
        let mut book = SalesBook::new();
        // A Wednesday noon.
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();

        let mut today = draft("today", 450, None);
        today.timestamp = Some(Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap());
        book.add(today, false);

        // Monday of the same week: weekly only.
        let mut monday = draft("monday", 1000, None);
        monday.timestamp = Some(Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap());
        book.add(monday, false);

        // Previous week: neither window.
        let mut last_week = draft("last week", 99999, None);
        last_week.timestamp = Some(Utc.with_ymd_and_hms(2026, 2, 27, 10, 0, 0).unwrap());
        book.add(last_week, false);

        let stats = book.stats(now);
        assert_eq!(stats.daily.count, 1);
        assert_eq!(stats.daily.total, Amount::from_minor_units(450));
        assert_eq!(stats.daily_records.len(), 1);
        assert_eq!(stats.weekly.count, 2);
        assert_eq!(stats.weekly.total, Amount::from_minor_units(1450));
    }

    #[test]
    fn stats_total_multiplies_by_quantity() {
        let mut book = SalesBook::new();
        let now = Utc::now();
        let mut d = draft("bulk", 250, None);
        d.quantity = 4;
        d.timestamp = Some(now - Duration::minutes(5));
        book.add(d, false);

        let stats = book.stats(now);
        assert_eq!(stats.daily.total, Amount::from_minor_units(1000));
    }

    #[test]
    fn stats_on_empty_book() {
        let stats = SalesBook::new().stats(Utc::now());
        assert_eq!(stats.daily.count, 0);
        assert_eq!(stats.daily.total, Amount::ZERO);
        assert_eq!(stats.weekly.count, 0);
    }
}
