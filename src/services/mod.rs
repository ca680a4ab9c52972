pub mod presentation;
pub mod providers;
pub mod session;
