use crate::domain::{
    models::event::EventScope,
    models::report::{
        BreakdownEntry, DashboardStats, EventStats, EventStatusCounts, GroupBreakdown, InvitationCounts,
        RsvpCounts, UpcomingEvent, VenueRow,
    },
    ports::ReportRepository,
};
use crate::error::AppError;
use crate::infra::repositories::sqlite_event_repo::EVENT_SCOPE_FILTER;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const UPCOMING_LIMIT: i64 = 5;

/// RSVP counters over `rsvps r` joined with their guest and event; callers append the WHERE clause.
const RSVP_COUNTS_SELECT: &str = r#"SELECT
    COALESCE(SUM(r.status = 'pending'), 0) AS pending,
    COALESCE(SUM(r.status = 'attending'), 0) AS attending,
    COALESCE(SUM(r.status = 'not_attending'), 0) AS not_attending,
    COALESCE(SUM(r.status = 'maybe'), 0) AS maybe,
    COALESCE(SUM(CASE WHEN r.status = 'attending' THEN r.guests_count ELSE 0 END), 0) AS attending_guests,
    COALESCE(SUM(CASE WHEN r.status = 'attending'
        THEN (SELECT COUNT(*) FROM rsvp_plus_ones p WHERE p.rsvp_id = r.id) ELSE 0 END), 0) AS attending_plus_ones,
    COALESCE(SUM(r.status = 'attending' AND g.is_vip), 0) AS vip_attending
FROM rsvps r
JOIN guests g ON g.id = r.guest_id
JOIN events e ON e.id = r.event_id"#;

pub struct SqliteReportRepo {
    pool: SqlitePool,
}

impl SqliteReportRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for SqliteReportRepo {
    async fn event_stats(&self, event_id: &str) -> Result<EventStats, AppError> {
        let invitations = sqlx::query_as::<_, InvitationCounts>(
            r#"SELECT
                COUNT(*) AS total_invited,
                COALESCE(SUM(eg.invitation_sent), 0) AS invitations_sent,
                COALESCE(SUM(eg.confirmed), 0) AS confirmed,
                COALESCE(SUM(eg.checked_in_at IS NOT NULL), 0) AS checked_in,
                COALESCE(SUM(eg.checked_out_at IS NOT NULL), 0) AS checked_out,
                COALESCE(SUM(g.is_vip), 0) AS vip_invited
               FROM event_guests eg
               JOIN guests g ON g.id = eg.guest_id
               WHERE eg.event_id = ?"#
        )
            .bind(event_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        let rsvps = sqlx::query_as::<_, RsvpCounts>(&format!("{} WHERE r.event_id = ?", RSVP_COUNTS_SELECT))
            .bind(event_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        let age_groups = sqlx::query_as::<_, BreakdownEntry>(
            r#"SELECT COALESCE(g.age_group, 'unspecified') AS label, COUNT(*) AS count
               FROM event_guests eg
               JOIN guests g ON g.id = eg.guest_id
               WHERE eg.event_id = ?
               GROUP BY label
               ORDER BY count DESC, label ASC"#
        )
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;

        let dietary = sqlx::query_as::<_, BreakdownEntry>(
            r#"SELECT TRIM(dietary_requirements) AS label, COUNT(*) AS count
               FROM rsvps
               WHERE event_id = ? AND status = 'attending'
                 AND dietary_requirements IS NOT NULL AND TRIM(dietary_requirements) != ''
               GROUP BY label
               ORDER BY count DESC, label ASC"#
        )
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;

        let groups = sqlx::query_as::<_, GroupBreakdown>(
            r#"SELECT gg.id AS group_id, gg.name AS name,
                      COUNT(m.guest_id) AS members,
                      COALESCE(SUM(r.status = 'attending'), 0) AS attending
               FROM guest_groups gg
               LEFT JOIN guest_group_members m ON m.group_id = gg.id
               LEFT JOIN rsvps r ON r.guest_id = m.guest_id AND r.event_id = gg.event_id
               WHERE gg.event_id = ?
               GROUP BY gg.id, gg.name
               ORDER BY gg.name ASC"#
        )
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;

        let venues = sqlx::query_as::<_, VenueRow>(
            r#"SELECT id AS venue_id, name, capacity, is_primary
               FROM event_venues
               WHERE event_id = ?
               ORDER BY is_primary DESC, created_at ASC"#
        )
            .bind(event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;

        Ok(EventStats { invitations, rsvps, age_groups, dietary, groups, venues })
    }

    async fn dashboard_stats(&self, scope: EventScope<'_>, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let events = sqlx::query_as::<_, EventStatusCounts>(&format!(
            r#"SELECT
                COALESCE(SUM(e.status = 'draft'), 0) AS draft,
                COALESCE(SUM(e.status = 'published'), 0) AS published,
                COALESCE(SUM(e.status = 'cancelled'), 0) AS cancelled,
                COALESCE(SUM(e.status = 'completed'), 0) AS completed,
                COUNT(*) AS total
               FROM events e
               WHERE {}"#,
            EVENT_SCOPE_FILTER
        ))
            .bind(scope.kind())
            .bind(scope.owner())
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        let upcoming = sqlx::query_as::<_, UpcomingEvent>(&format!(
            r#"SELECT e.id, e.name, e.start_date, e.status,
                      (SELECT COUNT(*) FROM rsvps r WHERE r.event_id = e.id AND r.status = 'attending') AS attending
               FROM events e
               WHERE {}
                 AND e.status = 'published' AND e.start_date >= ?3
               ORDER BY e.start_date ASC
               LIMIT ?4"#,
            EVENT_SCOPE_FILTER
        ))
            .bind(scope.kind())
            .bind(scope.owner())
            .bind(now)
            .bind(UPCOMING_LIMIT)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;

        let total_guests = sqlx::query_scalar::<_, i64>(&format!(
            r#"SELECT CASE WHEN ?1 = 'all'
                   THEN (SELECT COUNT(*) FROM guests)
                   ELSE (SELECT COUNT(DISTINCT eg.guest_id) FROM event_guests eg
                         JOIN events e ON e.id = eg.event_id WHERE {})
               END"#,
            EVENT_SCOPE_FILTER
        ))
            .bind(scope.kind())
            .bind(scope.owner())
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        let rsvps = sqlx::query_as::<_, RsvpCounts>(&format!("{} WHERE {}", RSVP_COUNTS_SELECT, EVENT_SCOPE_FILTER))
            .bind(scope.kind())
            .bind(scope.owner())
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        let deliveries = sqlx::query_as::<_, BreakdownEntry>(&format!(
            r#"SELECT nr.status AS label, COUNT(*) AS count
               FROM notification_recipients nr
               JOIN notifications n ON n.id = nr.notification_id
               LEFT JOIN events e ON e.id = n.event_id
               WHERE (e.id IS NOT NULL AND {}) OR (?1 = 'all') OR (?1 = 'owner' AND n.created_by = ?2)
               GROUP BY nr.status
               ORDER BY nr.status ASC"#,
            EVENT_SCOPE_FILTER
        ))
            .bind(scope.kind())
            .bind(scope.owner())
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;

        Ok(DashboardStats { events, upcoming, total_guests, rsvps, deliveries })
    }
}
