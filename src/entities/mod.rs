pub mod prelude;

pub mod episodes;
pub mod profile_shows;
pub mod profiles;
pub mod shows;
pub mod users;
pub mod watch_marks;
