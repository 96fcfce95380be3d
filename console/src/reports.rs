//! Totals behind the finance dashboard charts.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use common_money::Amount;
use serde::Serialize;

use crate::models::{parse_day, CreditReport, Entry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalTotal {
    pub terminal: String,
    pub count: usize,
    pub total: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub total: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreditSummary {
    pub outstanding: Amount,
    pub settled: Amount,
    pub open_reports: usize,
}

/// Entries grouped by terminal, sorted by terminal name.
pub fn totals_by_terminal(entries: &[Entry]) -> Vec<TerminalTotal> {
    let mut grouped: BTreeMap<&str, (usize, Amount)> = BTreeMap::new();
    for entry in entries {
        let slot = grouped
            .entry(entry.terminal.trim())
            .or_insert_with(|| (0, Amount::zero()));
        slot.0 += 1;
        slot.1 = slot.1.clone() + &entry.amount;
    }

    grouped
        .into_iter()
        .map(|(terminal, (count, total))| TerminalTotal {
            terminal: terminal.to_string(),
            count,
            total,
        })
        .collect()
}

/// Entries summed per calendar day; undated entries are skipped.
pub fn daily_totals(entries: &[Entry]) -> Vec<DailyTotal> {
    let mut grouped: BTreeMap<NaiveDate, Amount> = BTreeMap::new();
    for entry in entries {
        let Some(day) = entry.day() else {
            continue;
        };
        let total = grouped.entry(day).or_default();
        *total = total.clone() + &entry.amount;
    }

    grouped
        .into_iter()
        .map(|(day, total)| DailyTotal { day, total })
        .collect()
}

/// Split credit reports into settled and outstanding debt. A report counts
/// as settled once its status reads `paid` or `settled`.
pub fn summarize_credit(reports: &[CreditReport]) -> CreditSummary {
    let mut summary = CreditSummary::default();
    for report in reports {
        let settled = report
            .status
            .as_deref()
            .map(|status| matches!(status.trim().to_ascii_lowercase().as_str(), "paid" | "settled"))
            .unwrap_or(false);
        if settled {
            summary.settled = summary.settled.clone() + &report.amount;
        } else {
            summary.outstanding = summary.outstanding.clone() + &report.amount;
            summary.open_reports += 1;
        }
    }
    summary
}

/// Credit reports created within `[from, to]`, inclusive.
pub fn credit_in_range(reports: &[CreditReport], from: NaiveDate, to: NaiveDate) -> Vec<&CreditReport> {
    reports
        .iter()
        .filter(|report| {
            report
                .date
                .as_deref()
                .and_then(parse_day)
                .map(|day| day >= from && day <= to)
                .unwrap_or(false)
        })
        .collect()
}
