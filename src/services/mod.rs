pub mod ratings;
pub mod recommendations;
pub mod restaurants;
pub mod reviews;
pub mod users;
