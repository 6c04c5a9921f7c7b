pub mod classification;
pub mod feed;
pub mod notification;
pub mod personal_record;
pub mod round_template;
pub mod session;
pub mod setup_profile;
pub mod tournament;
pub mod user;
