use std::env;

#[derive(Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub sqlite_path: String,
    pub database_url: Option<String>,
    pub bcrypt_cost: u32,
    pub cors_allow_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let server_port = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);

        let sqlite_path = env::var("SQLITE_PATH").unwrap_or_else(|_| "/tmp/holonet.sqlite".to_string());
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());

        // bcrypt rejects costs outside 4..=31
        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|c| (4..=31).contains(c))
            .unwrap_or(10);

        let cors_allow_origin = env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string());

        Self {
            server_port,
            sqlite_path,
            database_url,
            bcrypt_cost,
            cors_allow_origin,
        }
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }

        let path = self.sqlite_path.trim();
        if path.starts_with("sqlite:") || path.starts_with("file:") {
            return path.to_string();
        }
        format!("sqlite://{}", path)
    }

    pub fn is_sqlite(&self) -> bool {
        self.database_url().starts_with("sqlite:")
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            server_port: 0,
            sqlite_path: String::new(),
            database_url: Some("sqlite::memory:".to_string()),
            bcrypt_cost: 4,
            cors_allow_origin: "*".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn sqlite_path_becomes_url() {
        let config = AppConfig {
            database_url: None,
            sqlite_path: "/var/lib/holonet/data.sqlite".to_string(),
            ..AppConfig::for_tests()
        };
        assert_eq!(config.database_url(), "sqlite:///var/lib/holonet/data.sqlite");
        assert!(config.is_sqlite());
    }

    #[test]
    fn explicit_url_wins() {
        let config = AppConfig {
            database_url: Some("postgres://holonet@localhost/holonet".to_string()),
            sqlite_path: "/tmp/ignored.sqlite".to_string(),
            ..AppConfig::for_tests()
        };
        assert_eq!(config.database_url(), "postgres://holonet@localhost/holonet");
        assert!(!config.is_sqlite());
    }
}
