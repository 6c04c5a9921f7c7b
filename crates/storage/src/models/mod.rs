pub mod classification;
pub mod notification;
pub mod round_template;
pub mod scoring;
pub mod setup_profile;
pub mod social;
pub mod tournament;
pub mod user;

pub use classification::ClassificationRecord;
pub use notification::Notification;
pub use round_template::{RoundStage, RoundTemplate, ScoredArrow, ScoredEnd};
pub use scoring::{Arrow, End, PersonalRecord, ScoringSession, SessionStatus};
pub use setup_profile::SetupProfile;
pub use social::FeedItem;
pub use tournament::{Tournament, TournamentParticipant};
pub use user::User;
