//! In-memory aggregation of analytics events for the admin dashboard.

use crate::models::AnalyticsEvent;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const PAGE_VIEW: &str = "page_view";
const TOP_PAGES: usize = 20;
const TOP_REFERRERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub events: usize,
    pub sessions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub days: i64,
    pub total_events: usize,
    pub page_views: usize,
    pub unique_sessions: usize,
    pub unique_users: usize,
    pub top_pages: Vec<CountEntry>,
    pub events_by_type: Vec<CountEntry>,
    pub daily: Vec<DailyCount>,
    pub top_referrers: Vec<CountEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalyticsStats {
    /// Zeroed stats for a store that has no analytics table yet.
    pub fn unavailable(days: i64) -> Self {
        Self {
            days,
            message: Some(
                "Analytics storage is not set up yet. \
                 Apply the latest database migrations to start collecting events."
                    .to_string(),
            ),
            ..Self::default()
        }
    }
}

fn ranked(counts: HashMap<String, usize>, limit: usize) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(key, count)| CountEntry { key, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    entries.truncate(limit);
    entries
}

pub fn aggregate(events: &[AnalyticsEvent], days: i64) -> AnalyticsStats {
    let mut sessions = HashSet::new();
    let mut users = HashSet::new();
    let mut pages: HashMap<String, usize> = HashMap::new();
    let mut types: HashMap<String, usize> = HashMap::new();
    let mut referrers: HashMap<String, usize> = HashMap::new();
    let mut daily: BTreeMap<NaiveDate, (usize, HashSet<&str>)> = BTreeMap::new();
    let mut page_views = 0;

    for event in events.iter().filter(|e| !e.is_admin) {
        sessions.insert(event.session_id.as_str());
        if let Some(user_id) = event.user_id {
            users.insert(user_id);
        }
        *types.entry(event.event_type.clone()).or_default() += 1;
        if event.event_type == PAGE_VIEW {
            page_views += 1;
            if let Some(path) = &event.page_path {
                *pages.entry(path.clone()).or_default() += 1;
            }
        }
        if let Some(referrer) = event.referrer.as_deref().filter(|r| !r.is_empty()) {
            *referrers.entry(referrer.to_string()).or_default() += 1;
        }
        let day = daily.entry(event.created_at.date_naive()).or_default();
        day.0 += 1;
        day.1.insert(event.session_id.as_str());
    }

    AnalyticsStats {
        days,
        total_events: types.values().sum(),
        page_views,
        unique_sessions: sessions.len(),
        unique_users: users.len(),
        top_pages: ranked(pages, TOP_PAGES),
        events_by_type: ranked(types, usize::MAX),
        daily: daily
            .into_iter()
            .map(|(date, (events, sessions))| DailyCount {
                date,
                events,
                sessions: sessions.len(),
            })
            .collect(),
        top_referrers: ranked(referrers, TOP_REFERRERS),
        message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(id: i64, session: &str, kind: &str, path: Option<&str>, day: u32) -> AnalyticsEvent {
        AnalyticsEvent {
            id,
            session_id: session.to_string(),
            user_id: None,
            event_type: kind.to_string(),
            event_name: None,
            page_path: path.map(str::to_string),
            metadata: None,
            ip_address: None,
            user_agent: None,
            referrer: None,
            is_admin: false,
            created_at: Utc.with_ymd_and_hms(2026, 6, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn groups_by_page_type_and_day() {
        let mut with_user = event(4, "s2", "click", None, 11);
        with_user.user_id = Some(7);
        with_user.referrer = Some("https://google.com".into());
        let mut admin = event(5, "s3", PAGE_VIEW, Some("/admin"), 11);
        admin.is_admin = true;

        let events = vec![
            event(1, "s1", PAGE_VIEW, Some("/"), 10),
            event(2, "s1", PAGE_VIEW, Some("/hotels"), 10),
            event(3, "s2", PAGE_VIEW, Some("/"), 11),
            with_user,
            admin,
        ];
        let stats = aggregate(&events, 30);

        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.page_views, 3);
        assert_eq!(stats.unique_sessions, 2);
        assert_eq!(stats.unique_users, 1);
        assert_eq!(stats.top_pages[0], CountEntry { key: "/".into(), count: 2 });
        assert_eq!(stats.daily.len(), 2);
        assert_eq!(stats.daily[1].sessions, 1);
        assert_eq!(stats.top_referrers.len(), 1);
    }

    #[test]
    fn no_events_means_empty_stats() {
        let stats = aggregate(&[], 7);
        assert_eq!(stats.total_events, 0);
        assert!(stats.daily.is_empty());
        assert!(stats.message.is_none());
    }
}
