//! Business logic services.

#![allow(missing_docs)]

pub mod act;
pub mod change_feed;
pub mod comment;
pub mod delivery;
pub mod edit_history;
pub mod email;
pub mod live;
pub mod notification;
pub mod retry;
pub mod seed;
pub mod trivia;
pub mod voting;

pub use act::{ActService, CreateActInput, EditActInput, EditOutcome, RegisterActInput};
pub use change_feed::{
    ChangeEvent, ChangeFeed, ChangeFeedService, ChangeKind, Collection, LocalChangeFeed,
    publish_logged,
};
pub use comment::{CommentService, SubmitCommentInput};
pub use delivery::{DeliveryService, LogDelivery, NotificationDelivery};
pub use edit_history::{EDITABLE_ACT_FIELDS, TrackedFields, diff_fields};
pub use email::SmtpDelivery;
pub use live::{LiveQueryService, Subscription, TriviaSnapshot};
pub use notification::{NotificationService, RenderedNotice};
pub use retry::RetryPolicy;
pub use seed::{SeedReport, SeedService};
pub use trivia::{CreateTriviaInput, OptionSummary, TriviaService, TriviaSummary, tally_map};
pub use voting::{MAX_RATING, MIN_RATING, VotingService};
