//! Mail activity analytics: daily/weekly counts, weekday × hour rhythm and
//! ISO-week calendar heatmaps built from a maildir or an exported event table.

pub mod analytics;
pub mod config;
pub mod logging;
pub mod mail;
pub mod tables;
