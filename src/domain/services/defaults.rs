use crate::domain::models::notification::{Channel, NotificationTemplate};

pub const INVITATION_TEMPLATE: &str = "invitation";
pub const REMINDER_TEMPLATE: &str = "reminder";

pub const DEFAULT_INVITATION_SUBJECT: &str = "Invitation: {{ event_name }}";
pub const DEFAULT_REMINDER_SUBJECT: &str = "Reminder: {{ event_name }} is coming up";
pub const PASSWORD_RESET_SUBJECT: &str = "Reset your password";

pub fn get_default_template(name: &str) -> Option<&'static str> {
    match name {
        INVITATION_TEMPLATE => Some(include_str!("../../../templates/defaults/invitation.html")),
        REMINDER_TEMPLATE => Some(include_str!("../../../templates/defaults/reminder.html")),
        "password_reset" => Some(include_str!("../../../templates/defaults/password_reset.html")),
        _ => None,
    }
}

/// Templates seeded on first start when no template of that name exists.
pub fn seed_templates() -> Vec<NotificationTemplate> {
    [
        (INVITATION_TEMPLATE, DEFAULT_INVITATION_SUBJECT, "Default email invitation with RSVP link"),
        (REMINDER_TEMPLATE, DEFAULT_REMINDER_SUBJECT, "Default reminder before the event"),
    ]
    .into_iter()
    .filter_map(|(name, subject, description)| {
        let body = get_default_template(name)?;
        let mut template = NotificationTemplate::new(name.to_string(), Channel::Email, subject.to_string(), body.to_string());
        template.description = Some(description.to_string());
        Some(template)
    })
    .collect()
}
