use crate::domain::models::{event::Event, venue::EventVenue};
use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};

pub const ICS_FILE_NAME: &str = "invite.ics";

/// Generates an iCalendar (.ics) entry for an event, located at its primary venue when known.
pub fn generate_ics(event: &Event, venue: Option<&EventVenue>) -> String {
    let mut calendar = Calendar::new();

    let mut ical_event = IcalEvent::new();
    ical_event
        .summary(&event.name)
        .starts(event.start_date)
        .ends(event.end_date)
        .uid(&event.id);

    if let Some(description) = &event.description {
        ical_event.description(description);
    }

    if let Some(venue) = venue {
        let address = venue.full_address();
        let location = if address.is_empty() {
            venue.name.clone()
        } else {
            format!("{}, {}", venue.name, address)
        };
        ical_event.location(&location);
    }

    calendar.push(ical_event.done());
    calendar.to_string()
}
