pub mod community;
pub mod home;

pub use community::CommunityPage;
pub use home::HomePage;
