use anyhow::{bail, Context, Result};
use chrono::{Duration, FixedOffset};

/// Server configuration, read from the environment (and `.env` in development)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    /// Offset used for naive form date-times and for displayed times
    pub venue_offset: FixedOffset,
    pub session_ttl: Duration,
    /// Usernames from `STAFF`, if set
    pub staff: Option<Vec<String>>,
    pub seed_default_zones: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("Invalid PORT")?;
        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .context("Invalid DATABASE_MAX_CONNECTIONS")?;
        let venue_offset = parse_utc_offset(&lookup("VENUE_UTC_OFFSET").unwrap_or_else(|| "+03:00".to_string()))
            .context("Invalid VENUE_UTC_OFFSET")?;
        let session_ttl_hours = lookup("SESSION_TTL_HOURS")
            .unwrap_or_else(|| "336".to_string())
            .parse::<i64>()
            .context("Invalid SESSION_TTL_HOURS")?;
        if session_ttl_hours <= 0 {
            bail!("SESSION_TTL_HOURS must be positive");
        }
        let staff = lookup("STAFF").map(|list| parse_name_list(&list, ','));
        let seed_default_zones = lookup("SEED_DEFAULT_ZONES")
            .unwrap_or_else(|| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        Ok(Self {
            database_url,
            host,
            port,
            database_max_connections,
            venue_offset,
            session_ttl: Duration::hours(session_ttl_hours),
            staff,
            seed_default_zones,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse `+03:00`, `-0530`, `Z` or `UTC` into a fixed offset
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).context("zero offset");
    }

    let (sign, rest) = match value.chars().next() {
        Some('+') => (1, &value[1..]),
        Some('-') => (-1, &value[1..]),
        _ => bail!("offset must start with '+' or '-': {}", value),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        bail!("offset must look like +HH:MM: {}", value);
    }
    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = digits[2..].parse()?;
    if minutes >= 60 {
        bail!("offset minutes out of range: {}", value);
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("offset out of range: {}", value))
}

/// Split a list of names, skipping blanks and `#` comments
pub fn parse_name_list(contents: &str, separator: char) -> Vec<String> {
    contents
        .split(separator)
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/anticafe")])).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.venue_offset.local_minus_utc(), 3 * 3600);
        assert_eq!(config.session_ttl, Duration::hours(336));
        assert!(config.staff.is_none());
        assert!(config.seed_default_zones);
    }

    #[test]
    fn test_missing_database_url() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/anticafe"),
            ("PORT", "8080"),
            ("VENUE_UTC_OFFSET", "-05:30"),
            ("STAFF", "alice, bob,,"),
            ("SEED_DEFAULT_ZONES", "false"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.venue_offset.local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(config.staff, Some(vec!["alice".to_string(), "bob".to_string()]));
        assert!(!config.seed_default_zones);

        assert!(Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("SESSION_TTL_HOURS", "0")])).is_err());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+0300").unwrap().local_minus_utc(), 10800);
        assert!(parse_utc_offset("03:00").is_err());
        assert!(parse_utc_offset("+3").is_err());
        assert!(parse_utc_offset("+03:75").is_err());
    }

    #[test]
    fn test_parse_name_list() {
        let contents = "# staff accounts\nadmin\n\n  manager  \n";
        assert_eq!(parse_name_list(contents, '\n'), vec!["admin", "manager"]);
    }
}
