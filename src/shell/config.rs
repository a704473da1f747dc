use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// HOST and PORT from the environment; unset or unparsable values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { host, port }
    }
}

#[cfg(test)]
mod server_config_tests {
    use super::*;

    #[test]
    fn it_should_fall_back_to_defaults() {
        dotenvy::dotenv().ok();
        let config = ServerConfig::from_env();
        assert!(!config.host.is_empty());
        assert!(config.port > 0);
    }
}
