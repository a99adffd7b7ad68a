//! Academic records service: school years and calendars, curricula and sections,
//! admissions, enrollment, gradebooks, and document requests.

pub mod academics;
pub mod admissions;
pub mod clock;
pub mod config;
pub mod designations;
pub mod documents;
pub mod enrollment;
pub mod error;
pub mod gradebook;
pub mod http;
pub mod notifications;
pub mod registrar;
pub mod service;
pub mod store;
pub mod telemetry;

pub use registrar::Registrar;
