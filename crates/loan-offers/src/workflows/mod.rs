pub mod notification;
pub mod scoring;
