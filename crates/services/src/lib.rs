#![forbid(unsafe_code)]

pub mod error;
pub mod identity;
pub mod persistence;
pub mod quest_service;
pub mod quest_view;

pub use quest_core::Clock;

pub use error::{AuthError, QuestError};
pub use identity::{AccountIdentityProvider, Identity, IdentityProvider};
pub use persistence::{PendingWrite, WriteQueue};
pub use quest_service::{QuestService, QuestSession, Submission};
pub use quest_view::{FeedbackView, OptionMark, OptionView, QuestView};
