pub use super::episodes::Entity as Episodes;
pub use super::profile_shows::Entity as ProfileShows;
pub use super::profiles::Entity as Profiles;
pub use super::shows::Entity as Shows;
pub use super::users::Entity as Users;
pub use super::watch_marks::Entity as WatchMarks;
