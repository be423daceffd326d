//! Environment-driven configuration.

use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use crate::checkout::ShippingPolicy;
use crate::domain::value_objects::Money;
use crate::{EcommerceError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
}

impl FromStr for StoreBackend {
    type Err = EcommerceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(EcommerceError::Config(format!("Invalid STORE_BACKEND '{other}', expected memory or file"))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub store_dir: PathBuf,
    /// Bundled sample catalog when unset.
    pub catalog_path: Option<PathBuf>,
    pub shipping: ShippingPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8083,
            store_backend: StoreBackend::Memory,
            store_dir: PathBuf::from("./data/store"),
            catalog_path: None,
            shipping: ShippingPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let money = |key: &str, fallback: Money| -> Result<Money> {
            match get(key) {
                Some(raw) => Decimal::from_str(raw.trim())
                    .map(Money::new)
                    .map_err(|e| EcommerceError::Config(format!("Invalid {key}: {e}"))),
                None => Ok(fallback),
            }
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| EcommerceError::Config(format!("Invalid PORT: {e}")))?,
            None => defaults.port,
        };
        let store_backend = match get("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.store_backend,
        };
        let shipping = ShippingPolicy {
            free_over: money("FREE_SHIPPING_THRESHOLD", defaults.shipping.free_over)?,
            flat_fee: money("FLAT_SHIPPING_FEE", defaults.shipping.flat_fee)?,
        };

        let config = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            store_backend,
            store_dir: get("STORE_DIR").map(PathBuf::from).unwrap_or(defaults.store_dir),
            catalog_path: get("CATALOG_PATH").filter(|p| !p.is_empty()).map(PathBuf::from),
            shipping,
        };
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}
