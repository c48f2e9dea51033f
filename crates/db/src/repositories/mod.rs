//! Typed repositories, one per collection.

mod act;
mod comment;
mod notification;
mod trivia;
mod vote;

pub use act::{ActRepository, OrderAssignment};
pub use comment::CommentRepository;
pub use notification::NotificationRepository;
pub use trivia::TriviaRepository;
pub use vote::VoteRepository;
