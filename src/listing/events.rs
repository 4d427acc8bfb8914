//! Event listing: period, category and search filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::{paginate, search_matches, slug_matches};
use crate::models::{Event, ListParams, PagedResult};

/// Which part of the calendar to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Upcoming,
    Past,
    #[default]
    All,
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" | "future" => Ok(Self::Upcoming),
            "past" => Ok(Self::Past),
            "" | "all" => Ok(Self::All),
            _ => Err(format!("Invalid period: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventSort {
    /// Soonest first for upcoming events, most recent first otherwise
    #[default]
    Date,
    Title,
}

impl std::str::FromStr for EventSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "date" => Ok(Self::Date),
            "title" => Ok(Self::Title),
            _ => Err(format!("Invalid event sort: {}", s)),
        }
    }
}

/// Filters of the events page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub period: Period,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: EventSort,
}

impl EventQuery {
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        let period_ok = match self.period {
            Period::Upcoming => event.is_upcoming(now),
            Period::Past => !event.is_upcoming(now),
            Period::All => true,
        };

        period_ok
            && slug_matches(
                self.category.as_deref(),
                event.category.as_ref().map(|c| c.slug.as_str()),
            )
            && search_matches(
                self.search.as_deref(),
                [event.title.as_str()]
                    .into_iter()
                    .chain(event.summary.as_deref())
                    .chain(event.location.as_deref())
                    .chain(event.speakers.iter().map(|s| s.name.as_str())),
            )
    }
}

pub fn sort_events(events: &mut [Event], sort: EventSort, period: Period) {
    match (sort, period) {
        (EventSort::Date, Period::Upcoming) => events.sort_by_key(|e| (e.starts_at, e.id)),
        (EventSort::Date, _) => events.sort_by_key(|e| Reverse((e.starts_at, e.id))),
        (EventSort::Title, _) => events.sort_by_cached_key(|e| (e.title.to_lowercase(), e.id)),
    }
}

/// Filter, sort and paginate the published events as seen at `now`
pub fn list_events(
    events: Vec<Event>,
    query: &EventQuery,
    params: &ListParams,
    now: DateTime<Utc>,
) -> PagedResult<Event> {
    let mut matching: Vec<Event> = events.into_iter().filter(|e| query.matches(e, now)).collect();
    sort_events(&mut matching, query.sort, query.period);
    paginate(matching, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryKind, Speaker};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn event(id: i64, title: &str, offset_days: i64) -> Event {
        let starts_at = now() + Duration::days(offset_days);
        Event {
            id,
            slug: format!("event-{}", id),
            title: title.to_string(),
            summary: None,
            description: String::new(),
            location: Some("Lyon".to_string()),
            starts_at,
            ends_at: None,
            cover_image_url: None,
            category_id: None,
            category: None,
            capacity: None,
            registration_count: 0,
            registration_open: true,
            is_published: true,
            speakers: Vec::new(),
            gallery: Vec::new(),
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    fn ids(events: &[Event]) -> Vec<i64> {
        events.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_upcoming_sorted_soonest_first() {
        let events = vec![event(1, "A", 10), event(2, "B", -3), event(3, "C", 2)];
        let query = EventQuery {
            period: Period::Upcoming,
            ..Default::default()
        };
        let result = list_events(events, &query, &ListParams::default(), now());
        assert_eq!(ids(&result.items), vec![3, 1]);
    }

    #[test]
    fn test_past_sorted_most_recent_first() {
        let events = vec![event(1, "A", -10), event(2, "B", 3), event(3, "C", -2)];
        let query = EventQuery {
            period: Period::Past,
            ..Default::default()
        };
        let result = list_events(events, &query, &ListParams::default(), now());
        assert_eq!(ids(&result.items), vec![3, 1]);
    }

    #[test]
    fn test_running_event_counts_as_upcoming() {
        let mut running = event(1, "Festival", -1);
        running.ends_at = Some(now() + Duration::days(1));
        let query = EventQuery {
            period: Period::Upcoming,
            ..Default::default()
        };
        assert!(query.matches(&running, now()));
    }

    #[test]
    fn test_category_and_search_filters() {
        let mut a = event(1, "Repair café", 1);
        a.category = Some(Category {
            id: 1,
            slug: "ateliers".to_string(),
            name: "Ateliers".to_string(),
            description: None,
            kind: CategoryKind::Event,
            sort_order: 0,
            created_at: now(),
        });
        let mut b = event(2, "Conférence", 1);
        b.speakers = vec![Speaker {
            id: 1,
            event_id: 2,
            name: "Aïcha Diallo".to_string(),
            role: None,
            bio: None,
            photo_url: None,
            sort_order: 0,
        }];

        let by_category = EventQuery {
            category: Some("ateliers".to_string()),
            ..Default::default()
        };
        assert!(by_category.matches(&a, now()));
        assert!(!by_category.matches(&b, now()));

        let by_speaker = EventQuery {
            search: Some("diallo".to_string()),
            ..Default::default()
        };
        assert!(by_speaker.matches(&b, now()));
        assert!(!by_speaker.matches(&a, now()));

        let by_location = EventQuery {
            search: Some("LYON".to_string()),
            ..Default::default()
        };
        assert!(by_location.matches(&a, now()) && by_location.matches(&b, now()));
    }

    #[test]
    fn test_title_sort() {
        let mut events = vec![event(1, "zumba", 0), event(2, "Atelier", 0), event(3, "brocante", 0)];
        sort_events(&mut events, EventSort::Title, Period::All);
        assert_eq!(ids(&events), vec![2, 3, 1]);
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("Upcoming".parse::<Period>().unwrap(), Period::Upcoming);
        assert_eq!("".parse::<Period>().unwrap(), Period::All);
        assert!("tomorrow".parse::<Period>().is_err());
    }

    proptest! {
        #[test]
        fn periods_split_the_calendar(offsets in proptest::collection::vec(-100i64..100, 0..40)) {
            let events: Vec<Event> = offsets
                .iter()
                .enumerate()
                .map(|(i, d)| event(i as i64, "x", *d))
                .collect();
            let params = ListParams::new(1, 100);
            let total = |period| {
                let query = EventQuery { period, ..Default::default() };
                list_events(events.clone(), &query, &params, now()).total
            };
            prop_assert_eq!(total(Period::Upcoming) + total(Period::Past), total(Period::All));
        }

        #[test]
        fn upcoming_is_ascending(offsets in proptest::collection::vec(0i64..100, 0..30)) {
            let events: Vec<Event> = offsets
                .iter()
                .enumerate()
                .map(|(i, d)| event(i as i64, "x", *d))
                .collect();
            let query = EventQuery { period: Period::Upcoming, ..Default::default() };
            let result = list_events(events, &query, &ListParams::new(1, 100), now());
            for pair in result.items.windows(2) {
                prop_assert!(pair[0].starts_at <= pair[1].starts_at);
            }
        }
    }
}
