//! # Reports
//!
//! Aggregations over completed transactions.
//!
//! ## Local Time
//! Transactions are stored in UTC. Every "which day / which hour" question
//! is answered in the store's configured offset, passed in as a
//! [`FixedOffset`]. A sale at 23:30 local time belongs to that local day
//! even when UTC has already rolled over.
//!
//! ```text
//! ┌──────────────────┐   daily_summary(date)    ┌──────────────────────────┐
//! │  Transactions    │ ───────────────────────► │ totals + 24 hourly bars  │
//! │  (UTC stamps)    │   monthly_summary(y, m)  ├──────────────────────────┤
//! │                  │ ───────────────────────► │ totals + one bar per day │
//! │                  │   dashboard_metrics()    ├──────────────────────────┤
//! │                  │ ───────────────────────► │ revenue, profit, avg ... │
//! │                  │   top_products()         ├──────────────────────────┤
//! │                  │ ───────────────────────► │ best sellers by quantity │
//! │                  │   transaction_history()  ├──────────────────────────┤
//! │                  │ ───────────────────────► │ filter / sort / page     │
//! └──────────────────┘                          └──────────────────────────┘
//! ```
//!
//! Bar percentages are relative to the largest bar (floor of one cent), so
//! the tallest bar is always 100 and an empty chart is all zeros.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::inventory::inventory_value;
use crate::money::Money;
use crate::types::{Product, Transaction};
use crate::HISTORY_PAGE_SIZE;

// =============================================================================
// Report Types
// =============================================================================

/// One bar of a trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TrendBucket {
    /// "HH:00" for hourly trends, the day number for monthly trends.
    pub label: String,
    pub total_cents: i64,
    pub percentage: f64,
}

/// Totals shared by the daily and monthly reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesTotals {
    pub total_sales_cents: i64,
    pub total_items_sold: i64,
    pub total_transactions: usize,
    pub total_profit_cents: i64,
    /// profit / sales × 100, or 0 with no sales.
    pub profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: SalesTotals,
    pub hourly_trend: Vec<TrendBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub totals: SalesTotals,
    pub daily_trend: Vec<TrendBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardMetrics {
    pub total_revenue_cents: i64,
    pub todays_revenue_cents: i64,
    pub total_transactions: usize,
    pub average_transaction_value_cents: i64,
    pub inventory_value_cents: i64,
    pub total_products: usize,
    pub total_profit_cents: i64,
    pub todays_profit_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub name: String,
    pub quantity: i64,
    /// Quantity relative to the best seller.
    pub percentage: f64,
}

// =============================================================================
// Helpers
// =============================================================================

fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

fn totals<'a>(txs: impl Iterator<Item = &'a Transaction>) -> SalesTotals {
    let mut sales = Money::zero();
    let mut profit = Money::zero();
    let mut items = 0;
    let mut count = 0;

    for tx in txs {
        sales += tx.total_amount();
        profit += tx.total_profit();
        items += tx.item_count();
        count += 1;
    }

    SalesTotals {
        total_sales_cents: sales.cents(),
        total_items_sold: items,
        total_transactions: count,
        total_profit_cents: profit.cents(),
        profit_margin: profit.ratio_percent(sales),
    }
}

fn buckets(labels_and_totals: Vec<(String, i64)>) -> Vec<TrendBucket> {
    let max = labels_and_totals
        .iter()
        .map(|(_, t)| *t)
        .max()
        .unwrap_or(0)
        .max(1);

    labels_and_totals
        .into_iter()
        .map(|(label, total)| TrendBucket {
            label,
            total_cents: total,
            percentage: Money::from_cents(total).ratio_percent(Money::from_cents(max)),
        })
        .collect()
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

// =============================================================================
// Daily / Monthly
// =============================================================================

/// Sales for one local calendar day with an hourly breakdown.
pub fn daily_summary(
    transactions: &[Transaction],
    date: NaiveDate,
    offset: FixedOffset,
) -> DailySummary {
    let day: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| local_date(tx.created_at, offset) == date)
        .collect();

    let mut hourly = [0i64; 24];
    for tx in &day {
        let hour = tx.created_at.with_timezone(&offset).hour() as usize;
        hourly[hour] += tx.total_amount_cents;
    }

    DailySummary {
        date,
        totals: totals(day.iter().copied()),
        hourly_trend: buckets(
            hourly
                .iter()
                .enumerate()
                .map(|(h, total)| (format!("{h:02}:00"), *total))
                .collect(),
        ),
    }
}

/// Sales for one local calendar month with a per-day breakdown.
///
/// Rejects a month outside 1..=12.
pub fn monthly_summary(
    transactions: &[Transaction],
    year: i32,
    month: u32,
    offset: FixedOffset,
) -> CoreResult<MonthlySummary> {
    let days = days_in_month(year, month).ok_or_else(|| ValidationError::OutOfRange {
        field: "month".to_string(),
        min: 1,
        max: 12,
    })?;

    let in_month: Vec<(&Transaction, NaiveDate)> = transactions
        .iter()
        .map(|tx| (tx, local_date(tx.created_at, offset)))
        .filter(|(_, d)| d.year() == year && d.month() == month)
        .collect();

    let mut daily = vec![0i64; days as usize];
    for (tx, d) in &in_month {
        daily[d.day0() as usize] += tx.total_amount_cents;
    }

    Ok(MonthlySummary {
        year,
        month,
        totals: totals(in_month.iter().map(|(tx, _)| *tx)),
        daily_trend: buckets(
            daily
                .iter()
                .enumerate()
                .map(|(i, total)| ((i + 1).to_string(), *total))
                .collect(),
        ),
    })
}

// =============================================================================
// Dashboard
// =============================================================================

pub fn dashboard_metrics(
    transactions: &[Transaction],
    products: &[Product],
    today: NaiveDate,
    offset: FixedOffset,
) -> DashboardMetrics {
    let all = totals(transactions.iter());
    let todays = totals(
        transactions
            .iter()
            .filter(|tx| local_date(tx.created_at, offset) == today),
    );

    let average = if all.total_transactions == 0 {
        0
    } else {
        all.total_sales_cents / all.total_transactions as i64
    };

    DashboardMetrics {
        total_revenue_cents: all.total_sales_cents,
        todays_revenue_cents: todays.total_sales_cents,
        total_transactions: all.total_transactions,
        average_transaction_value_cents: average,
        inventory_value_cents: inventory_value(products).cents(),
        total_products: products.len(),
        total_profit_cents: all.total_profit_cents,
        todays_profit_cents: todays.total_profit_cents,
    }
}

/// Best sellers by units sold, keyed by the product name on the receipt.
///
/// Ties keep the order in which products were first sold.
pub fn top_products(transactions: &[Transaction], limit: usize) -> Vec<TopProduct> {
    let mut order: Vec<String> = Vec::new();
    let mut sold: HashMap<String, i64> = HashMap::new();

    for item in transactions.iter().flat_map(|tx| tx.items.iter()) {
        let entry = sold.entry(item.name.clone()).or_insert_with(|| {
            order.push(item.name.clone());
            0
        });
        *entry += item.quantity;
    }

    let mut ranked: Vec<(String, i64)> = order
        .into_iter()
        .map(|name| {
            let qty = sold.get(&name).copied().unwrap_or(0);
            (name, qty)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);

    let max = ranked.first().map(|(_, q)| *q).unwrap_or(0).max(1);
    ranked
        .into_iter()
        .map(|(name, quantity)| TopProduct {
            name,
            quantity,
            percentage: quantity as f64 / max as f64 * 100.0,
        })
        .collect()
}

// =============================================================================
// Transaction History
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum HistorySortKey {
    #[default]
    Date,
    Amount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and page request for the history table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct HistoryQuery {
    /// Case-insensitive substring of the transaction id.
    pub search: Option<String>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub sort_by: HistorySortKey,
    pub direction: SortDirection,
    /// 1-based; clamped into `1..=total_pages`.
    pub page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoryPage {
    pub items: Vec<Transaction>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Applies `query` to `transactions`.
///
/// Date bounds are inclusive local days. An out-of-range page snaps to the
/// nearest valid one.
pub fn transaction_history(
    transactions: &[Transaction],
    query: &HistoryQuery,
    offset: FixedOffset,
) -> HistoryPage {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut matched: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| match &needle {
            Some(n) => tx.id.to_lowercase().contains(n),
            None => true,
        })
        .filter(|tx| {
            let d = local_date(tx.created_at, offset);
            query.start_date.map_or(true, |s| d >= s) && query.end_date.map_or(true, |e| d <= e)
        })
        .collect();

    matched.sort_by(|a, b| {
        let ord = match query.sort_by {
            HistorySortKey::Date => a.created_at.cmp(&b.created_at),
            HistorySortKey::Amount => a.total_amount_cents.cmp(&b.total_amount_cents),
        };
        match query.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    let total_items = matched.len();
    let total_pages = total_items.div_ceil(HISTORY_PAGE_SIZE).max(1);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);
    let start = (page - 1) * HISTORY_PAGE_SIZE;

    HistoryPage {
        items: matched
            .into_iter()
            .skip(start)
            .take(HISTORY_PAGE_SIZE)
            .cloned()
            .collect(),
        page,
        total_pages,
        total_items,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
