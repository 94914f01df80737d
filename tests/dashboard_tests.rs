// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard aggregation tests.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use personal_crm::models::{CalendarSync, Contact, ContactDetails, Event, Recurrence, VipInfo};
use personal_crm::services::dashboard::{
    next_birthday, ActivityAction, Dashboard, UpcomingKind, ATTENTION_THRESHOLD_DAYS,
};

mod common;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn contact(id: i64, name: &str, birthday: &str, updated_at: DateTime<Utc>) -> Contact {
    Contact {
        id,
        user_id: 1,
        name: name.to_string(),
        relationship: None,
        industry: String::new(),
        company: "Acme".to_string(),
        birthday: birthday.to_string(),
        vip: false,
        notes: String::new(),
        details: ContactDetails::default(),
        vip_info: VipInfo::default(),
        calendar: CalendarSync::default(),
        created_at: updated_at,
        updated_at,
    }
}

fn vip(id: i64, name: &str, last_contacted: &str, now: DateTime<Utc>) -> Contact {
    Contact {
        vip: true,
        vip_info: VipInfo {
            last_contacted: last_contacted.to_string(),
            ..VipInfo::default()
        },
        ..contact(id, name, "", now)
    }
}

fn event(id: i64, contact_id: i64, title: &str, date: &str) -> Event {
    let created = at(2024, 1, 1);
    Event {
        id,
        user_id: 1,
        contact_id,
        title: title.to_string(),
        event_date: date.to_string(),
        recurrence: Recurrence::None,
        calendar_event_id: String::new(),
        created_at: created,
        updated_at: created,
    }
}

#[test]
fn test_birthday_five_days_out() {
    let now = at(2024, 6, 10);
    let contacts = vec![contact(1, "Ada", "2020-06-15", now)];

    let dashboard = Dashboard::build(&contacts, &[], now);

    assert_eq!(dashboard.upcoming_events.len(), 1);
    let upcoming = &dashboard.upcoming_events[0];
    assert_eq!(upcoming.kind, UpcomingKind::Birthday);
    assert_eq!(upcoming.contact_name, "Ada");
    assert_eq!(upcoming.days_until, 5);
    assert_eq!(upcoming.display_date, "Jun 15");
    assert_eq!(upcoming.date, "2020-06-15");
}

#[test]
fn test_birthday_outside_window_and_invalid_are_skipped() {
    let now = at(2024, 6, 10);
    let contacts = vec![
        contact(1, "Later", "1990-08-01", now),
        contact(2, "Bad", "June 12th", now),
        contact(3, "None", "", now),
        contact(4, "Edge", "1985-07-10", now),
    ];

    let dashboard = Dashboard::build(&contacts, &[], now);

    let names: Vec<_> = dashboard
        .upcoming_events
        .iter()
        .map(|e| e.contact_name.as_str())
        .collect();
    assert_eq!(names, vec!["Edge"]);
    assert_eq!(dashboard.upcoming_events[0].days_until, 30);
}

#[test]
fn test_custom_event_window() {
    let now = at(2024, 6, 10);
    let contacts = vec![contact(1, "Grace", "", now)];
    let events = vec![
        event(10, 1, "In 30 days", "2024-07-10"),
        event(11, 1, "In 35 days", "2024-07-15"),
        event(12, 1, "Yesterday", "2024-06-09"),
        event(13, 1, "Today", "2024-06-10"),
    ];

    let dashboard = Dashboard::build(&contacts, &events, now);

    let titles: Vec<_> = dashboard
        .upcoming_events
        .iter()
        .map(|e| e.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Today", "In 30 days"]);
    assert!(dashboard
        .upcoming_events
        .iter()
        .all(|e| e.kind == UpcomingKind::Custom && e.contact_name == "Grace"));
}

#[test]
fn test_event_for_missing_contact_is_skipped() {
    let now = at(2024, 6, 10);
    let events = vec![event(10, 99, "Orphan", "2024-06-12")];

    let dashboard = Dashboard::build(&[], &events, now);
    assert!(dashboard.upcoming_events.is_empty());
}

#[test]
fn test_upcoming_sorted_by_days_until() {
    let now = at(2024, 6, 10);
    let contacts = vec![
        contact(1, "Twenty", "1990-06-30", now),
        contact(2, "Three", "1990-06-13", now),
    ];
    let events = vec![event(10, 1, "Ten", "2024-06-20")];

    let dashboard = Dashboard::build(&contacts, &events, now);

    let days: Vec<_> = dashboard
        .upcoming_events
        .iter()
        .map(|e| e.days_until)
        .collect();
    assert_eq!(days, vec![3, 10, 20]);
}

#[test]
fn test_next_birthday_within_a_year() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let mut day = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();

    while day < end {
        let next = next_birthday(day, today).unwrap();
        assert!(next >= today, "{} before {}", next, today);
        assert!(next - today <= Duration::days(366), "{} too far", next);
        day += Duration::days(1);
    }
}

#[test]
fn test_vip_never_contacted_needs_attention() {
    let now = at(2024, 6, 10);
    let contacts = vec![vip(1, "Never", "", now)];

    let dashboard = Dashboard::build(&contacts, &[], now);

    assert_eq!(dashboard.needs_attention.len(), 1);
    assert_eq!(dashboard.needs_attention[0].name, "Never");
    assert_eq!(dashboard.needs_attention[0].days_since, 0);
}

#[test]
fn test_needs_attention_threshold() {
    let now = at(2024, 6, 10);
    let today = now.date_naive();
    let stale = (today - Duration::days(ATTENTION_THRESHOLD_DAYS + 1))
        .format("%Y-%m-%d")
        .to_string();
    let boundary = (today - Duration::days(ATTENTION_THRESHOLD_DAYS))
        .format("%Y-%m-%d")
        .to_string();

    let contacts = vec![
        vip(1, "Stale", &stale, now),
        vip(2, "Boundary", &boundary, now),
        vip(3, "Recent", "2024-06-01", now),
        vip(4, "Garbled", "yesterday", now),
        // Not a VIP, never tracked
        contact(5, "Regular", "", now),
    ];

    let dashboard = Dashboard::build(&contacts, &[], now);

    let names: Vec<_> = dashboard
        .needs_attention
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["Stale"]);
    assert_eq!(
        dashboard.needs_attention[0].days_since,
        ATTENTION_THRESHOLD_DAYS + 1
    );
}

#[test]
fn test_recent_activity_order_and_action() {
    let now = at(2024, 6, 10);
    let mut edited = contact(1, "Edited", "", now - Duration::hours(3));
    edited.created_at = now - Duration::days(30);
    let added = contact(2, "Added", "", now - Duration::minutes(5));
    let old = contact(3, "Old", "", now - Duration::days(4));

    let dashboard = Dashboard::build(&[old, edited, added], &[], now);

    let activity = &dashboard.recent_activity;
    assert_eq!(activity.len(), 3);
    assert_eq!(activity[0].name, "Added");
    assert_eq!(activity[0].action, ActivityAction::Added);
    assert_eq!(activity[0].time_ago, "Just now");
    assert_eq!(activity[1].name, "Edited");
    assert_eq!(activity[1].action, ActivityAction::Updated);
    assert_eq!(activity[1].time_ago, "3 hours ago");
    assert_eq!(activity[2].time_ago, "4 days ago");
}

#[test]
fn test_recent_activity_is_capped() {
    let now = at(2024, 6, 10);
    let contacts: Vec<_> = (1..=15)
        .map(|i| contact(i, &format!("C{}", i), "", now - Duration::hours(i)))
        .collect();

    let dashboard = Dashboard::build(&contacts, &[], now);

    assert_eq!(dashboard.recent_activity.len(), 10);
    assert_eq!(dashboard.recent_activity[0].name, "C1");
    assert_eq!(dashboard.recent_activity[9].name, "C10");
}

#[tokio::test]
async fn test_dashboard_service_uses_only_own_live_data() {
    let app = common::create_test_app().await;
    let user = common::seed_valid_user(&app.state).await;
    let other = common::seed_user(&app.state, "g-2", "a", "r", Utc::now()).await;
    let now = Utc::now();
    let soon = (now.date_naive() + Duration::days(3))
        .format("%Y-%m-%d")
        .to_string();

    let mine = common::seed_contact(&app.state, &user, common::new_contact("Mine")).await;
    let gone = common::seed_contact(&app.state, &user, common::new_contact("Gone")).await;
    common::seed_contact(&app.state, &other, common::new_contact("Theirs")).await;

    let db = &app.state.db;
    db.create_event(user.id, mine.id, "Soon", &soon, Recurrence::None, "", now)
        .await
        .unwrap();
    db.create_event(user.id, gone.id, "Orphaned", &soon, Recurrence::None, "", now)
        .await
        .unwrap();
    assert!(db.delete_contact(user.id, gone.id, now).await.unwrap());

    let dashboard = app
        .state
        .dashboard
        .build_dashboard(user.id, now)
        .await
        .unwrap();

    let titles: Vec<_> = dashboard
        .upcoming_events
        .iter()
        .map(|e| e.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Soon"]);

    let names: Vec<_> = dashboard
        .recent_activity
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["Mine"]);
}
