pub mod courses;
pub mod subscriptions;
