pub mod calendar;
pub mod client;
pub mod company;
pub mod email;
pub mod expenditure;
pub mod user;
