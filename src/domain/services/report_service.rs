use chrono::{DateTime, Utc};
use crate::domain::models::{
    event::Event,
    report::{Dashboard, DashboardStats, EventReport, EventStats, RsvpCounts, RsvpSummary, VenueCapacity},
};

/// `part / whole * 100`, rounded to two decimals. A zero `whole` yields `0.0`.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn summarize_rsvps(counts: &RsvpCounts) -> RsvpSummary {
    let total = counts.pending + counts.attending + counts.not_attending + counts.maybe;
    RsvpSummary {
        pending: counts.pending,
        attending: counts.attending,
        not_attending: counts.not_attending,
        maybe: counts.maybe,
        total,
        responded: total - counts.pending,
    }
}

pub fn build_event_report(event: &Event, stats: EventStats, now: DateTime<Utc>) -> EventReport {
    let rsvps = summarize_rsvps(&stats.rsvps);
    let expected_headcount = stats.rsvps.attending_guests + stats.rsvps.attending_plus_ones;

    let venues = stats
        .venues
        .into_iter()
        .map(|v| VenueCapacity {
            utilization: v.capacity.filter(|c| *c > 0).map(|c| percentage(expected_headcount, c as i64)),
            venue_id: v.venue_id,
            name: v.name,
            capacity: v.capacity,
            is_primary: v.is_primary,
        })
        .collect();

    EventReport {
        event_id: event.id.clone(),
        event_name: event.name.clone(),
        status: event.status,
        generated_at: now,
        response_rate: percentage(rsvps.responded, rsvps.total),
        attendance_rate: percentage(stats.invitations.checked_in, rsvps.attending),
        confirmation_rate: percentage(stats.invitations.confirmed, stats.invitations.total_invited),
        expected_headcount,
        plus_ones: stats.rsvps.attending_plus_ones,
        vip_attending: stats.rsvps.vip_attending,
        invitations: stats.invitations,
        rsvps,
        age_groups: stats.age_groups,
        dietary: stats.dietary,
        groups: stats.groups,
        venues,
    }
}

pub fn build_dashboard(stats: DashboardStats, now: DateTime<Utc>) -> Dashboard {
    let rsvps = summarize_rsvps(&stats.rsvps);
    Dashboard {
        events: stats.events,
        upcoming_events: stats.upcoming,
        total_guests: stats.total_guests,
        response_rate: percentage(rsvps.responded, rsvps.total),
        rsvps,
        deliveries: stats.deliveries,
        generated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        event::{EventStatus, EventType},
        report::{InvitationCounts, VenueRow},
    };

    fn event() -> Event {
        let now = Utc::now();
        Event {
            id: "evt".into(),
            name: "Launch".into(),
            description: None,
            event_type: EventType::Corporate,
            start_date: now,
            end_date: now,
            timezone: "UTC".into(),
            status: EventStatus::Published,
            is_recurring: false,
            recurrence_rule: None,
            is_private: false,
            rsvp_deadline: None,
            allow_plus_ones: true,
            max_plus_ones: 2,
            created_by: "u".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percentage_rounds_and_handles_zero() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(0, 7), 0.0);
        assert_eq!(percentage(4, 4), 100.0);
    }

    #[test]
    fn event_report_rates() {
        let stats = EventStats {
            invitations: InvitationCounts {
                total_invited: 8,
                invitations_sent: 8,
                confirmed: 2,
                checked_in: 3,
                checked_out: 0,
                vip_invited: 1,
            },
            rsvps: RsvpCounts {
                pending: 2,
                attending: 4,
                not_attending: 1,
                maybe: 1,
                attending_guests: 5,
                attending_plus_ones: 2,
                vip_attending: 1,
            },
            venues: vec![
                VenueRow { venue_id: "v1".into(), name: "Hall".into(), capacity: Some(20), is_primary: true },
                VenueRow { venue_id: "v2".into(), name: "Garden".into(), capacity: None, is_primary: false },
            ],
            ..Default::default()
        };

        let report = build_event_report(&event(), stats, Utc::now());

        assert_eq!(report.rsvps.total, 8);
        assert_eq!(report.rsvps.responded, 6);
        assert_eq!(report.response_rate, 75.0);
        assert_eq!(report.attendance_rate, 75.0);
        assert_eq!(report.confirmation_rate, 25.0);
        assert_eq!(report.expected_headcount, 7);
        assert_eq!(report.venues[0].utilization, Some(35.0));
        assert_eq!(report.venues[1].utilization, None);
    }

    #[test]
    fn empty_event_report_is_all_zero() {
        let report = build_event_report(&event(), EventStats::default(), Utc::now());

        assert_eq!(report.response_rate, 0.0);
        assert_eq!(report.attendance_rate, 0.0);
        assert_eq!(report.confirmation_rate, 0.0);
        assert_eq!(report.expected_headcount, 0);
    }

    #[test]
    fn dashboard_response_rate() {
        let stats = DashboardStats {
            rsvps: RsvpCounts { pending: 1, attending: 1, maybe: 1, ..Default::default() },
            ..Default::default()
        };
        let dashboard = build_dashboard(stats, Utc::now());

        assert_eq!(dashboard.rsvps.total, 3);
        assert_eq!(dashboard.response_rate, 66.67);
    }
}
