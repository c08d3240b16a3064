use crate::domain::models::{
    event::{Event, EventScope},
    role::{Role, RoleName},
    user::User,
};
use crate::error::AppError;

/// The authenticated caller with their roles loaded.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub roles: Vec<Role>,
}

impl CurrentUser {
    pub fn new(user: User, roles: Vec<Role>) -> Self {
        Self { user, roles }
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn role_names(&self) -> Vec<RoleName> {
        self.roles.iter().map(|r| r.name).collect()
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r.name == RoleName::Admin)
    }

    /// Highest rank over all roles; `None` for a user without roles.
    pub fn rank(&self) -> Option<u8> {
        self.roles.iter().map(|r| r.name.rank()).max()
    }

    pub fn has_role(&self, required: RoleName) -> bool {
        self.rank().is_some_and(|rank| rank >= required.rank())
    }

    pub fn require_role(&self, required: RoleName) -> Result<(), AppError> {
        if self.has_role(required) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("Requires role '{}' or higher", required)))
        }
    }

    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.roles.iter().any(|r| r.allows(resource, action))
    }

    pub fn require_permission(&self, resource: &str, action: &str) -> Result<(), AppError> {
        if self.has_permission(resource, action) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("Missing permission {}:{}", resource, action)))
        }
    }

    pub fn sees_all_events(&self) -> bool {
        self.has_role(RoleName::EventManager)
    }

    /// Staff below event_host (front desk, vendors) read shared events instead of owning any.
    fn is_staff_reader(&self) -> bool {
        !self.has_role(RoleName::EventHost) && self.has_permission("events", "read")
    }

    /// Front-desk staff check guests in at every event, private ones included.
    fn works_the_door(&self) -> bool {
        !self.has_role(RoleName::EventHost) && self.has_permission("checkin", "write")
    }

    pub fn event_scope(&self) -> EventScope<'_> {
        if self.sees_all_events() {
            EventScope::All
        } else if self.is_staff_reader() {
            EventScope::Shared
        } else {
            EventScope::Owner(self.id())
        }
    }

    pub fn can_manage_event(&self, event: &Event) -> bool {
        self.sees_all_events() || (event.created_by == self.user.id && self.has_role(RoleName::EventHost))
    }

    pub fn can_view_event(&self, event: &Event) -> bool {
        self.can_manage_event(event) || self.event_scope().includes(event)
    }

    pub fn can_check_in(&self, event: &Event) -> bool {
        self.can_manage_event(event) || self.works_the_door()
    }

    pub fn ensure_can_manage(&self, event: &Event) -> Result<(), AppError> {
        if self.can_manage_event(event) {
            Ok(())
        } else {
            Err(AppError::Forbidden("You cannot manage this event".into()))
        }
    }

    pub fn ensure_can_check_in(&self, event: &Event) -> Result<(), AppError> {
        if self.can_check_in(event) {
            Ok(())
        } else {
            self.ensure_can_view(event)?;
            Err(AppError::Forbidden("You cannot check guests in at this event".into()))
        }
    }

    /// Hidden events answer 404 so their existence does not leak.
    pub fn ensure_can_view(&self, event: &Event) -> Result<(), AppError> {
        if self.can_view_event(event) {
            Ok(())
        } else {
            Err(AppError::NotFound("Event not found".into()))
        }
    }
}
