//! State machines for events, invitations, RSVP answers and delivery receipts.

use chrono::{DateTime, Utc};

use crate::domain::models::{
    event::{Event, EventStatus},
    event_guest::EventGuest,
    notification::{DeliveryStatus, NotificationRecipient},
    rsvp::{Rsvp, RsvpPlusOne, RsvpResponse, RsvpStatus},
};
use crate::error::AppError;

pub fn transition_event(event: &mut Event, next: EventStatus) -> Result<(), AppError> {
    if !event.status.can_transition_to(next) {
        return Err(AppError::Validation(format!(
            "Cannot change event status from '{}' to '{}'",
            event.status.as_str(),
            next.as_str()
        )));
    }
    event.status = next;
    event.updated_at = Utc::now();
    Ok(())
}

pub fn mark_invitation_sent(event_guest: &mut EventGuest, now: DateTime<Utc>) {
    event_guest.invitation_sent = true;
    event_guest.invitation_sent_at = Some(now);
    event_guest.updated_at = now;
}

/// Confirming twice keeps the first confirmation time.
pub fn confirm(event_guest: &mut EventGuest, now: DateTime<Utc>) {
    if !event_guest.confirmed {
        event_guest.confirmed = true;
        event_guest.confirmed_at = Some(now);
        event_guest.updated_at = now;
    }
}

pub fn check_in(event_guest: &mut EventGuest, now: DateTime<Utc>) -> Result<(), AppError> {
    if event_guest.checked_in_at.is_some() {
        return Err(AppError::Conflict("Guest is already checked in".into()));
    }
    event_guest.checked_in_at = Some(now);
    event_guest.updated_at = now;
    Ok(())
}

pub fn check_out(event_guest: &mut EventGuest, now: DateTime<Utc>) -> Result<(), AppError> {
    if event_guest.checked_in_at.is_none() {
        return Err(AppError::Conflict("Guest has not checked in".into()));
    }
    if event_guest.checked_out_at.is_some() {
        return Err(AppError::Conflict("Guest is already checked out".into()));
    }
    event_guest.checked_out_at = Some(now);
    event_guest.updated_at = now;
    Ok(())
}

pub fn transition_recipient(
    recipient: &mut NotificationRecipient,
    next: DeliveryStatus,
    error_message: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if !recipient.status.can_transition_to(next) {
        return Err(AppError::Validation(format!(
            "Cannot change delivery status from '{}' to '{}'",
            recipient.status.as_str(),
            next.as_str()
        )));
    }

    match next {
        DeliveryStatus::Sent => recipient.sent_at = Some(now),
        DeliveryStatus::Delivered => recipient.delivered_at = Some(now),
        DeliveryStatus::Read => recipient.read_at = Some(now),
        _ => {}
    }
    recipient.error_message = match next {
        DeliveryStatus::Failed => error_message,
        _ => None,
    };
    recipient.status = next;
    recipient.updated_at = now;
    Ok(())
}

/// Validates a response against the event's rules and applies it to `rsvp`.
/// Returns the plus-ones that replace the stored list.
pub fn apply_rsvp_response(
    event: &Event,
    rsvp: &mut Rsvp,
    response: RsvpResponse,
    now: DateTime<Utc>,
) -> Result<Vec<RsvpPlusOne>, AppError> {
    if event.rsvp_closed(now) {
        return Err(AppError::Conflict("RSVP is closed for this event".into()));
    }
    if response.status == RsvpStatus::Pending {
        return Err(AppError::Validation("A response must be attending, not_attending or maybe".into()));
    }

    let guests_count = response.guests_count.unwrap_or(rsvp.guests_count);
    if guests_count < 0 {
        return Err(AppError::Validation("guests_count cannot be negative".into()));
    }
    if response.status == RsvpStatus::Attending && guests_count < 1 {
        return Err(AppError::Validation("Attending requires guests_count of at least 1".into()));
    }

    if !response.plus_ones.is_empty() {
        if !event.allow_plus_ones {
            return Err(AppError::Validation("This event does not allow plus-ones".into()));
        }
        if response.plus_ones.len() > event.max_plus_ones.max(0) as usize {
            return Err(AppError::Validation(format!(
                "At most {} plus-ones are allowed",
                event.max_plus_ones
            )));
        }
        if response.plus_ones.iter().any(|p| p.first_name.trim().is_empty()) {
            return Err(AppError::Validation("Plus-ones need a first name".into()));
        }
    }

    rsvp.status = response.status;
    rsvp.guests_count = guests_count;
    rsvp.dietary_requirements = response.dietary_requirements;
    rsvp.special_needs = response.special_needs;
    rsvp.message = response.message;
    rsvp.responded_at = Some(now);
    rsvp.updated_at = now;

    // Only attending answers bring company.
    let plus_ones = if rsvp.status == RsvpStatus::Attending {
        response
            .plus_ones
            .into_iter()
            .map(|input| RsvpPlusOne::from_input(&rsvp.id, input))
            .collect()
    } else {
        Vec::new()
    };

    Ok(plus_ones)
}
