use std::sync::Arc;

use crate::{
    application::use_cases::telegram_auth::TelegramAuthUseCases, infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub telegram_auth_use_cases: Arc<TelegramAuthUseCases>,
}
