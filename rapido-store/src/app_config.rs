use rapido_core::DEFAULT_ORDER_STATUS;
use rapido_pricing::PricingConfig;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_initial_status")]
    pub initial_status: String,
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            initial_status: default_initial_status(),
            pricing: PricingConfig::default(),
        }
    }
}

fn default_initial_status() -> String {
    DEFAULT_ORDER_STATUS.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_run_migrations() -> bool { true }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `RAPIDO_DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("RAPIDO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn from_toml(raw: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_business_rules_default_when_absent() {
        let cfg = from_toml(
            r#"
            [server]
            port = 9000

            [database]
            url = "postgres://localhost/rapido"
            "#,
        );

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.max_connections, 5);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.business_rules.initial_status, "pendente");
        assert_eq!(cfg.business_rules.pricing, PricingConfig::default());
    }

    #[test]
    fn test_pricing_overrides() {
        let cfg = from_toml(
            r#"
            [server]
            port = 8081

            [database]
            url = "postgres://localhost/rapido"

            [business_rules]
            initial_status = "aguardando"

            [business_rules.pricing]
            overweight_fee = 20
            discount_rate = 0.05
            "#,
        );

        let pricing = &cfg.business_rules.pricing;
        assert_eq!(cfg.business_rules.initial_status, "aguardando");
        assert_eq!(pricing.overweight_fee, dec!(20));
        assert_eq!(pricing.discount_rate, dec!(0.05));
        assert_eq!(pricing.urgency_rate, dec!(0.20));
    }
}
