//! Change events and feed topics

mod change_event;
mod topic;

pub use change_event::{ChangeEvent, ChangeKind, ChangeRecord};
pub use topic::{FeedTopic, COMMENTS_TOPIC_PREFIX, POSTS_TOPIC_PREFIX, REACTIONS_TOPIC_PREFIX};
