pub mod classifications;
pub mod rounds;
pub mod sessions;
pub mod tournaments;
