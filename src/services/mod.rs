pub mod calendar;
pub mod clients;
pub mod directory;
pub mod email_settings;
pub mod encryption;
pub mod expenditure;
pub mod tenancy;
