pub mod app_error;
pub mod jwt;
pub mod telegram;
pub mod use_cases;
