pub mod cache;
pub mod client;
pub mod source;
pub mod types;

pub use client::MaildirSource;
pub use source::MailSource;
pub use types::{DateRange, Direction, DirectionSet, MailEvent, ScannedMail};
