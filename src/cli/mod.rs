pub mod chat;
pub mod market;

use anyhow::Result;

use referlut_market::config::MarketConfig;
use referlut_market::store::CookieJar;

/// Jar over the configured cookie-store directory.
pub fn open_jar(config: &MarketConfig) -> CookieJar {
    CookieJar::new(config.store_dir())
}

pub fn run_config_show() -> Result<()> {
    let config = MarketConfig::load_default();
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn run_config_path() -> Result<()> {
    println!("{}", MarketConfig::config_path().display());
    Ok(())
}
