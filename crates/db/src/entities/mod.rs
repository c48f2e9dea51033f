//! Database entities.

#![allow(missing_docs)]

pub mod act;
pub mod comment;
pub mod notification;
pub mod trivia;
pub mod trivia_tally;
pub mod vote;

pub use act::Entity as Act;
pub use comment::Entity as Comment;
pub use notification::Entity as Notification;
pub use trivia::Entity as Trivia;
pub use trivia_tally::Entity as TriviaTally;
pub use vote::Entity as Vote;
