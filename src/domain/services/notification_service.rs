use std::sync::Arc;
use crate::config::Config;
use crate::domain::{
    models::{
        event::Event,
        guest::Guest,
        notification::{Channel, DeliveryStatus, Notification, NotificationRecipient, NotificationStatus},
        rsvp::Rsvp,
        venue::EventVenue,
    },
    ports::{EmailService, EventGuestRepository, EventRepository, GuestRepository, NotificationRepository, RsvpRepository, VenueRepository},
    services::{calendar, defaults::INVITATION_TEMPLATE, lifecycle},
};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tera::{Context, Tera};
use tracing::{info, warn};

const DATE_FORMAT: &str = "%A, %-d %B %Y %H:%M";

/// Everything a template may refer to for one recipient.
pub struct TemplateData<'a> {
    pub guest: Option<&'a Guest>,
    pub event: Option<&'a Event>,
    pub venue: Option<&'a EventVenue>,
    pub rsvp: Option<&'a Rsvp>,
}

pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    events: Arc<dyn EventRepository>,
    venues: Arc<dyn VenueRepository>,
    guests: Arc<dyn GuestRepository>,
    event_guests: Arc<dyn EventGuestRepository>,
    rsvps: Arc<dyn RsvpRepository>,
    email: Arc<dyn EmailService>,
    config: Config,
}

impl NotificationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        events: Arc<dyn EventRepository>,
        venues: Arc<dyn VenueRepository>,
        guests: Arc<dyn GuestRepository>,
        event_guests: Arc<dyn EventGuestRepository>,
        rsvps: Arc<dyn RsvpRepository>,
        email: Arc<dyn EmailService>,
        config: Config,
    ) -> Self {
        Self { notifications, events, venues, guests, event_guests, rsvps, email, config }
    }

    /// Snapshots the recipients of a new notification: the given guests, or everyone invited to the event.
    /// Guests without an address for the channel are skipped.
    pub async fn resolve_recipients(
        &self,
        notification_id: &str,
        channel: Channel,
        event_id: Option<&str>,
        guest_ids: Option<&[String]>,
    ) -> Result<Vec<NotificationRecipient>, AppError> {
        let guests = match (guest_ids, event_id) {
            (Some(ids), _) => {
                let mut guests = Vec::with_capacity(ids.len());
                for id in ids {
                    let guest = self.guests.find_by_id(id).await?
                        .ok_or_else(|| AppError::NotFound(format!("Guest {} not found", id)))?;
                    guests.push(guest);
                }
                guests
            }
            (None, Some(event_id)) => self.guests.list_by_event(event_id).await?,
            (None, None) => return Err(AppError::Validation("Either event_id or guest_ids is required".into())),
        };

        let mut seen = std::collections::HashSet::new();
        Ok(guests
            .into_iter()
            .filter(|g| seen.insert(g.id.clone()))
            .filter_map(|g| {
                let address = address_for(channel, &g)?;
                Some(NotificationRecipient::new(notification_id.to_string(), Some(g.id), address))
            })
            .collect())
    }

    /// Delivers a claimed notification to each pending recipient and returns the final status.
    pub async fn dispatch(&self, notification: &Notification) -> Result<NotificationStatus, AppError> {
        let event = match &notification.event_id {
            Some(id) => self.events.find_by_id(id).await?,
            None => None,
        };
        let venue = match &event {
            Some(e) => self.venues.find_primary(&e.id).await?,
            None => None,
        };
        let is_invitation = match &notification.template_id {
            Some(id) => self.notifications.get_template(id).await?.is_some_and(|t| t.name == INVITATION_TEMPLATE),
            None => false,
        };
        let ics = match (&event, is_invitation) {
            (Some(e), true) => Some(calendar::generate_ics(e, venue.as_ref())),
            _ => None,
        };

        let recipients = self.notifications.list_recipients(&notification.id).await?;
        let mut delivered = 0usize;

        for mut recipient in recipients {
            match recipient.status {
                DeliveryStatus::Sent | DeliveryStatus::Delivered | DeliveryStatus::Read => {
                    delivered += 1;
                    continue;
                }
                DeliveryStatus::Failed => continue,
                // The notification is claimed by this run, so a `sending` row is left over from an interrupted one.
                DeliveryStatus::Pending | DeliveryStatus::Sending => {}
            }

            if recipient.status == DeliveryStatus::Pending {
                lifecycle::transition_recipient(&mut recipient, DeliveryStatus::Sending, None, Utc::now())?;
                recipient = self.notifications.update_recipient(&recipient).await?;
            }

            let outcome = self.deliver_to(notification, &recipient, event.as_ref(), venue.as_ref(), ics.as_deref()).await;
            let now = Utc::now();
            match outcome {
                Ok(guest) => {
                    lifecycle::transition_recipient(&mut recipient, DeliveryStatus::Sent, None, now)?;
                    delivered += 1;
                    if is_invitation {
                        if let Err(e) = self.mark_invited(event.as_ref(), guest.as_ref(), now).await {
                            warn!(recipient_id = %recipient.id, "Failed to mark invitation as sent: {}", e);
                        }
                    }
                }
                Err(reason) => {
                    warn!(recipient_id = %recipient.id, "Delivery failed: {}", reason);
                    lifecycle::transition_recipient(&mut recipient, DeliveryStatus::Failed, Some(reason), now)?;
                }
            }
            self.notifications.update_recipient(&recipient).await?;
        }

        let status = if delivered > 0 { NotificationStatus::Sent } else { NotificationStatus::Failed };
        let sent_at = (status == NotificationStatus::Sent).then(Utc::now);
        self.notifications.finish(&notification.id, status, sent_at).await?;

        info!(notification_id = %notification.id, delivered, status = status.as_str(), "Notification dispatched");
        Ok(status)
    }

    /// Renders and sends to one recipient. Any failure, lookups included, is reported for that recipient only.
    async fn deliver_to(
        &self,
        notification: &Notification,
        recipient: &NotificationRecipient,
        event: Option<&Event>,
        venue: Option<&EventVenue>,
        ics: Option<&str>,
    ) -> Result<Option<Guest>, String> {
        if notification.channel != Channel::Email {
            return Err(format!("{} channel not configured", notification.channel.as_str()));
        }

        let guest = match &recipient.guest_id {
            Some(id) => self.guests.find_by_id(id).await.map_err(|e| e.to_string())?,
            None => None,
        };
        let rsvp = match (event, &guest) {
            (Some(e), Some(g)) => self.rsvps.find_by_event_guest(&e.id, &g.id).await.map_err(|e| e.to_string())?,
            _ => None,
        };
        let data = TemplateData { guest: guest.as_ref(), event, venue, rsvp: rsvp.as_ref() };

        let context = build_context(&data, &self.config);
        let subject = render(&notification.subject, &context, false).map_err(|e| e.to_string())?;
        let body = render(&notification.body, &context, true).map_err(|e| e.to_string())?;

        let (attachment_name, attachment_data) = match ics {
            Some(ics) => (Some(calendar::ICS_FILE_NAME), Some(ics.as_bytes())),
            None => (None, None),
        };

        self.email
            .send(&recipient.address, &subject, &body, attachment_name, attachment_data)
            .await
            .map_err(|e| e.to_string())?;
        Ok(guest)
    }

    async fn mark_invited(&self, event: Option<&Event>, guest: Option<&Guest>, now: DateTime<Utc>) -> Result<(), AppError> {
        let (Some(event), Some(guest)) = (event, guest) else {
            return Ok(());
        };
        if let Some(mut event_guest) = self.event_guests.find(&event.id, &guest.id).await? {
            lifecycle::mark_invitation_sent(&mut event_guest, now);
            self.event_guests.update(&event_guest).await?;
        }
        Ok(())
    }
}

pub fn address_for(channel: Channel, guest: &Guest) -> Option<String> {
    let address = match channel {
        Channel::Email => guest.email.as_ref(),
        Channel::Sms | Channel::Whatsapp | Channel::Push => guest.phone.as_ref(),
    }?;
    let address = address.trim();
    (!address.is_empty()).then(|| address.to_string())
}

/// Formats an instant in the event's own timezone; unknown zones fall back to UTC.
pub fn format_in_timezone(at: DateTime<Utc>, timezone: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => at.with_timezone(&tz).format(DATE_FORMAT).to_string(),
        Err(_) => at.format(DATE_FORMAT).to_string(),
    }
}

pub fn build_context(data: &TemplateData<'_>, config: &Config) -> Context {
    let mut context = Context::new();

    let (first, last, full) = match data.guest {
        Some(g) => (g.first_name.clone(), g.last_name.clone(), g.full_name()),
        None => (String::new(), String::new(), String::new()),
    };
    context.insert("guest_first_name", &first);
    context.insert("guest_last_name", &last);
    context.insert("guest_name", &full);

    match data.event {
        Some(e) => {
            context.insert("event_name", &e.name);
            context.insert("event_description", &e.description.clone().unwrap_or_default());
            context.insert("event_start", &format_in_timezone(e.start_date, &e.timezone));
            context.insert("event_end", &format_in_timezone(e.end_date, &e.timezone));
            context.insert("timezone", &e.timezone);
        }
        None => {
            for key in ["event_name", "event_description", "event_start", "event_end", "timezone"] {
                context.insert(key, "");
            }
        }
    }

    context.insert("venue_name", &data.venue.map(|v| v.name.clone()).unwrap_or_default());
    context.insert("venue_address", &data.venue.map(|v| v.full_address()).unwrap_or_default());

    match data.rsvp {
        Some(r) => {
            context.insert("rsvp_token", &r.token);
            context.insert("rsvp_link", &config.rsvp_link(&r.token));
        }
        None => {
            context.insert("rsvp_token", "");
            context.insert("rsvp_link", "");
        }
    }

    context
}

pub fn render(template: &str, context: &Context, autoescape: bool) -> Result<String, AppError> {
    Tera::one_off(template, context, autoescape)
        .map_err(|e| AppError::Validation(format!("Template error: {}", e)))
}
