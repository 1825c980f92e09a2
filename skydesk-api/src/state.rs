use skydesk_core::Services;

#[derive(Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    pub secret: String,
    pub expiration: u64,
    pub admin_username: String,
    pub admin_password: String,
}

impl From<&skydesk_store::app_config::AuthConfig> for AuthConfig {
    fn from(cfg: &skydesk_store::app_config::AuthConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            secret: cfg.jwt_secret.clone(),
            expiration: cfg.jwt_expiration_seconds,
            admin_username: cfg.admin_username.clone(),
            admin_password: cfg.admin_password.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub auth: AuthConfig,
}
