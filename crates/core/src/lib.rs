//! Core show logic for talentshow: voting, moderation, trivia, notifications
//! and the live views built on the change feed.

pub mod services;

pub use services::*;
