use caredesk_api::ApiClient;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Sponsor;
use crate::{Result, ValidationErrors};

/// Amounts closer than this are treated as equal
const CENT: f64 = 0.005;

/// One recorded sponsorship payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: u64,
    #[serde(default)]
    pub sponsor_id: Option<u64>,
    pub amount: f64,
    pub paid_on: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthStatus {
    Paid,
    Partial,
    Missed,
    Upcoming,
}

impl MonthStatus {
    pub fn label(self) -> &'static str {
        match self {
            MonthStatus::Paid => "paid",
            MonthStatus::Partial => "partial",
            MonthStatus::Missed => "missed",
            MonthStatus::Upcoming => "upcoming",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    /// First day of the month
    pub month: NaiveDate,
    pub due: f64,
    pub paid: f64,
    /// Paid minus due so far; negative means arrears
    pub balance: f64,
    pub status: MonthStatus,
}

/// Month by month view of a sponsorship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerGrid {
    pub rows: Vec<LedgerRow>,
    /// Due for months up to and including the current one
    pub total_due: f64,
    pub total_paid: f64,
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn next_month(first: NaiveDate) -> NaiveDate {
    first_of_month(first + Duration::days(32))
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

impl LedgerGrid {
    /// One row per calendar month from `start` through `end`
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        monthly_commitment: f64,
        payments: &[Payment],
        today: NaiveDate,
    ) -> Result<Self> {
        let mut errors = ValidationErrors::new();
        if end < start {
            errors.add("end", "End date is before the start date");
        }
        if !monthly_commitment.is_finite() || monthly_commitment < 0.0 {
            errors.add("monthly_amount", "Monthly commitment must not be negative");
        }
        errors.into_result()?;

        let current = first_of_month(today);
        let last = first_of_month(end);
        let mut rows = Vec::new();
        let mut balance = 0.0;
        let mut total_due = 0.0;
        let mut total_paid = 0.0;
        let mut month = first_of_month(start);

        while month <= last {
            let paid: f64 = payments
                .iter()
                .filter(|p| same_month(p.paid_on, month))
                .map(|p| p.amount)
                .sum();
            let upcoming = month > current;

            let status = if paid + CENT >= monthly_commitment && paid > 0.0 {
                MonthStatus::Paid
            } else if upcoming {
                MonthStatus::Upcoming
            } else if paid > 0.0 {
                MonthStatus::Partial
            } else if monthly_commitment < CENT {
                MonthStatus::Paid
            } else {
                MonthStatus::Missed
            };

            // future months are not owed yet, prepayments still count
            if !upcoming {
                balance -= monthly_commitment;
                total_due += monthly_commitment;
            }
            balance += paid;
            total_paid += paid;

            rows.push(LedgerRow {
                month,
                due: monthly_commitment,
                paid,
                balance,
                status,
            });
            month = next_month(month);
        }

        let outside = payments
            .iter()
            .map(|p| first_of_month(p.paid_on))
            .filter(|m| *m < first_of_month(start) || *m > last)
            .count();
        if outside > 0 {
            debug!("{} payments fall outside the ledger range", outside);
        }

        Ok(Self {
            rows,
            total_due,
            total_paid,
        })
    }

    /// Paid minus due; negative means the sponsor is behind
    pub fn balance(&self) -> f64 {
        self.total_paid - self.total_due
    }

    pub fn count(&self, status: MonthStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }
}

/// `GET /api/sponsors/<id>/payments`
pub async fn fetch_payments(client: &ApiClient, sponsor_id: u64) -> Result<Vec<Payment>> {
    let path = format!("sponsors/{}/payments", sponsor_id);
    let listing = client.list_at(&path, "payments", None).await?;
    Ok(listing.into_items())
}

/// Parse the leading `YYYY-MM-DD` of a backend date or timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Ledger for a sponsor from their start date through `end`
pub async fn sponsor_ledger(
    client: &ApiClient,
    sponsor: &Sponsor,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<LedgerGrid> {
    let start = sponsor.start_date.as_deref().and_then(parse_date);
    let (Some(start), Some(monthly)) = (start, sponsor.monthly_amount) else {
        let mut errors = ValidationErrors::new();
        if start.is_none() {
            errors.add("start_date", "Sponsor has no valid start date");
        }
        if sponsor.monthly_amount.is_none() {
            errors.add("monthly_amount", "Sponsor has no monthly commitment");
        }
        return Err(errors.into());
    };
    let payments = fetch_payments(client, sponsor.id).await?;
    LedgerGrid::build(start, end, monthly, &payments, today)
}
