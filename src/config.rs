use crate::dates::{DEFAULT_TIMEZONE, DateError, DayNormalizer};
use std::{env, net::SocketAddr, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/ledger.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub normalizer: DayNormalizer,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DateError> {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = env::var("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH));

        let normalizer = match env::var("LEDGER_TIMEZONE") {
            Ok(name) if !name.trim().is_empty() => DayNormalizer::from_name(name.trim())?,
            _ => DayNormalizer::new(DEFAULT_TIMEZONE),
        };

        Ok(Self {
            port,
            data_path,
            normalizer,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
