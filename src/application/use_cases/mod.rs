pub mod telegram_auth;
