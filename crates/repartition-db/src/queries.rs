//! Database query functions organized by domain.

pub mod history;
pub mod rules;
pub mod settings;
