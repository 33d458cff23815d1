/* src/setup/check.rs */

use super::config::Config;
use log::LevelFilter;
use std::net::IpAddr;

pub const MAX_LOG_CAPACITY: usize = 1000;

// Main validation entry point
pub fn validate_config(config: &Config) -> Result<(), String> {
    validate_network(config)?;
    validate_tarpit(config)?;
    validate_dashboard(config)?;

    if config.setup.log_level.parse::<LevelFilter>().is_err() {
        return Err(format!(
            "Configuration error: log_level '{}' is not one of off, error, warn, info, debug, trace.",
            config.setup.log_level
        ));
    }
    Ok(())
}

fn validate_network(config: &Config) -> Result<(), String> {
    if config.network.listen.parse::<IpAddr>().is_err() {
        return Err(format!(
            "Configuration error: listen address '{}' is not a valid IP address.",
            config.network.listen
        ));
    }
    if config.network.write_timeout_secs == 0 {
        return Err(
            "Configuration error: write_timeout_secs must be greater than zero.".to_string(),
        );
    }
    Ok(())
}

fn validate_tarpit(config: &Config) -> Result<(), String> {
    // Room for at least one character plus CRLF.
    if config.tarpit.max_line_len < 3 {
        return Err(format!(
            "Configuration error: max_line_len {} is too short, the minimum is 3.",
            config.tarpit.max_line_len
        ));
    }
    if config.tarpit.line_interval_ms == 0 {
        return Err(
            "Configuration error: line_interval_ms must be greater than zero.".to_string(),
        );
    }
    Ok(())
}

fn validate_dashboard(config: &Config) -> Result<(), String> {
    if config.dashboard.tick_ms == 0 {
        return Err("Configuration error: tick_ms must be greater than zero.".to_string());
    }
    if config.dashboard.log_capacity == 0 || config.dashboard.log_capacity > MAX_LOG_CAPACITY {
        return Err(format!(
            "Configuration error: log_capacity {} is out of range (1..={}).",
            config.dashboard.log_capacity, MAX_LOG_CAPACITY
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&Config::default()), Ok(()));
    }

    #[test]
    fn rejects_hostname_as_listen_address() {
        let mut config = Config::default();
        config.network.listen = "localhost".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("localhost"));
    }

    #[test]
    fn rejects_zero_tick_and_capacity() {
        let mut config = Config::default();
        config.dashboard.tick_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.dashboard.log_capacity = 0;
        assert!(validate_config(&config).is_err());

        config.dashboard.log_capacity = MAX_LOG_CAPACITY + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = Config::default();
        config.setup.log_level = "loud".to_string();
        assert!(validate_config(&config).unwrap_err().contains("loud"));
    }

    #[test]
    fn rejects_tiny_lines() {
        let mut config = Config::default();
        config.tarpit.max_line_len = 2;
        assert!(validate_config(&config).is_err());
    }
}
