//! Board analytics computed from fetched lists and cards.

use crate::trello::{Card, List};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Cards due within this many days count as due soon
pub const DUE_SOON_DAYS: i64 = 7;

/// Open/closed card counts for one list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub list_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    pub open_cards: usize,
    pub closed_cards: usize,
}

/// Cards partitioned by due date
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueReport {
    pub due_soon: Vec<Card>,
    pub overdue: Vec<Card>,
}

/// One record per list, in list order. Cards on lists not in `lists` are ignored.
pub fn summarize_lists(lists: &[List], cards: &[Card]) -> Vec<ListSummary> {
    lists
        .iter()
        .map(|list| {
            let (closed, open): (Vec<&Card>, Vec<&Card>) = cards
                .iter()
                .filter(|c| c.id_list.as_deref() == Some(list.id.as_str()))
                .partition(|c| c.closed);

            ListSummary {
                list_id: list.id.clone(),
                list_name: list.name.clone(),
                open_cards: open.len(),
                closed_cards: closed.len(),
            }
        })
        .collect()
}

/// Split cards into overdue (due before `now`) and due soon (due between `now`
/// and `now + 7 days`, both inclusive). Cards without a parseable due date are
/// left out.
pub fn due_report(cards: Vec<Card>, now: DateTime<Utc>) -> DueReport {
    let horizon = now + Duration::days(DUE_SOON_DAYS);
    let mut report = DueReport::default();

    for card in cards {
        let Some(due) = card.due.as_deref().and_then(parse_due) else {
            continue;
        };

        if due < now {
            report.overdue.push(card);
        } else if due <= horizon {
            report.due_soon.push(card);
        }
    }

    report
}

/// Number of cards each member appears on
pub fn member_workload(cards: &[Card]) -> BTreeMap<String, usize> {
    let mut workload = BTreeMap::new();
    for member in cards.iter().flat_map(|c| c.id_members.iter()) {
        *workload.entry(member.clone()).or_insert(0) += 1;
    }
    workload
}

fn parse_due(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
