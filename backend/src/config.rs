use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use time::UtcOffset;
use time::macros::offset;

#[derive(Debug, Error)]
#[error("{name} has an invalid value '{value}'")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Largest JSON body accepted, in bytes.
    pub json_limit: usize,
    /// How many times a submission is re-evaluated after a concurrent write.
    pub submit_retries: u32,
    /// Offset of the institution's clock. Deadlines end at its midnight.
    pub utc_offset: UtcOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            db_path: PathBuf::from("ingesta.sqlite"),
            json_limit: 10 * 1024 * 1024, // 10 MB
            submit_retries: 3,
            utc_offset: offset!(-5),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok(); // Load .env if present

        let defaults = Self::default();
        Ok(Config {
            host: env::var("INGESTA_HOST").unwrap_or(defaults.host),
            port: parsed("INGESTA_PORT", defaults.port)?,
            db_path: env::var("INGESTA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            json_limit: parsed("INGESTA_JSON_LIMIT", defaults.json_limit)?,
            submit_retries: parsed("INGESTA_SUBMIT_RETRIES", defaults.submit_retries)?,
            utc_offset: offset_hours("INGESTA_UTC_OFFSET", defaults.utc_offset)?,
        })
    }
}

/// Reads a whole-hour offset such as `-5` or `+1`.
fn offset_hours(name: &'static str, default: UtcOffset) -> Result<UtcOffset, ConfigError> {
    let hours: i8 = parsed(name, default.whole_hours())?;
    UtcOffset::from_hms(hours, 0, 0).map_err(|_| ConfigError {
        name,
        value: hours.to_string(),
    })
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back_and_bad_values_are_named() {
        assert_eq!(parsed("INGESTA_TEST_UNSET_PORT", 8080u16).unwrap(), 8080);

        env::set_var("INGESTA_TEST_BAD_RETRIES", "tres");
        let err = parsed("INGESTA_TEST_BAD_RETRIES", 3u32).unwrap_err();
        assert_eq!(err.name, "INGESTA_TEST_BAD_RETRIES");
        assert_eq!(err.value, "tres");

        env::set_var("INGESTA_TEST_GOOD_LIMIT", " 2048 ");
        assert_eq!(parsed("INGESTA_TEST_GOOD_LIMIT", 0usize).unwrap(), 2048);
    }

    #[test]
    fn utc_offset_is_read_in_hours() {
        assert_eq!(Config::default().utc_offset, offset!(-5));
        assert_eq!(
            offset_hours("INGESTA_TEST_UNSET_OFFSET", offset!(-5)).unwrap(),
            offset!(-5)
        );

        env::set_var("INGESTA_TEST_OFFSET_PLUS", "+1");
        assert_eq!(
            offset_hours("INGESTA_TEST_OFFSET_PLUS", offset!(-5)).unwrap(),
            offset!(+1)
        );

        env::set_var("INGESTA_TEST_OFFSET_RANGE", "30");
        let err = offset_hours("INGESTA_TEST_OFFSET_RANGE", offset!(-5)).unwrap_err();
        assert_eq!(err.name, "INGESTA_TEST_OFFSET_RANGE");

        env::set_var("INGESTA_TEST_OFFSET_TEXT", "GMT-5");
        assert!(offset_hours("INGESTA_TEST_OFFSET_TEXT", offset!(-5)).is_err());
    }
}
