pub mod access;
pub mod audit_service;
pub mod auth_service;
pub mod calendar;
pub mod defaults;
pub mod lifecycle;
pub mod notification_service;
pub mod password;
pub mod report_service;
