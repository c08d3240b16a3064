pub mod audit;
pub mod auth;
pub mod event;
pub mod event_guest;
pub mod group;
pub mod guest;
pub mod notification;
pub mod report;
pub mod role;
pub mod rsvp;
pub mod setting;
pub mod user;
pub mod venue;
