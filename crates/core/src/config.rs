use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub datadog: DatadogConfig,
    pub slack: SlackConfig,
    pub bot: BotConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatadogConfig {
    pub api_key: SecretString,
    pub app_key: SecretString,
    /// API host, e.g. `api.datadoghq.eu`.
    pub site: String,
    /// Browser-facing base URL used to build shareable dashboard links.
    pub app_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub app_token: SecretString,
    pub bot_token: SecretString,
    /// Channel that receives replica-ready notifications.
    pub notify_channel_id: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    pub slash_command: String,
    pub shortcut_callback_id: String,
    pub view_callback_id: String,
    pub greeting_keyword: String,
    /// Static link offered next to every replica for merging changes back.
    pub review_url: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub datadog_api_key: Option<String>,
    pub datadog_app_key: Option<String>,
    pub datadog_site: Option<String>,
    pub slack_app_token: Option<String>,
    pub slack_bot_token: Option<String>,
    pub notify_channel_id: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            datadog: DatadogConfig {
                api_key: String::new().into(),
                app_key: String::new().into(),
                site: "api.datadoghq.eu".to_string(),
                app_base_url: "https://app.datadoghq.eu".to_string(),
                timeout_secs: 30,
            },
            slack: SlackConfig {
                app_token: String::new().into(),
                bot_token: String::new().into(),
                notify_channel_id: String::new(),
                timeout_secs: 30,
            },
            bot: BotConfig {
                slash_command: "/rep".to_string(),
                shortcut_callback_id: "replica".to_string(),
                view_callback_id: "replica-modal".to_string(),
                greeting_keyword: "hello".to_string(),
                review_url: "https://github.com/tomweston/replica/pulls".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("replica.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(datadog) = patch.datadog {
            if let Some(api_key_value) = datadog.api_key {
                self.datadog.api_key = secret_value(api_key_value);
            }
            if let Some(app_key_value) = datadog.app_key {
                self.datadog.app_key = secret_value(app_key_value);
            }
            if let Some(site) = datadog.site {
                self.datadog.site = site;
            }
            if let Some(app_base_url) = datadog.app_base_url {
                self.datadog.app_base_url = app_base_url;
            }
            if let Some(timeout_secs) = datadog.timeout_secs {
                self.datadog.timeout_secs = timeout_secs;
            }
        }

        if let Some(slack) = patch.slack {
            if let Some(app_token_value) = slack.app_token {
                self.slack.app_token = secret_value(app_token_value);
            }
            if let Some(bot_token_value) = slack.bot_token {
                self.slack.bot_token = secret_value(bot_token_value);
            }
            if let Some(notify_channel_id) = slack.notify_channel_id {
                self.slack.notify_channel_id = notify_channel_id;
            }
            if let Some(timeout_secs) = slack.timeout_secs {
                self.slack.timeout_secs = timeout_secs;
            }
        }

        if let Some(bot) = patch.bot {
            if let Some(slash_command) = bot.slash_command {
                self.bot.slash_command = slash_command;
            }
            if let Some(shortcut_callback_id) = bot.shortcut_callback_id {
                self.bot.shortcut_callback_id = shortcut_callback_id;
            }
            if let Some(view_callback_id) = bot.view_callback_id {
                self.bot.view_callback_id = view_callback_id;
            }
            if let Some(greeting_keyword) = bot.greeting_keyword {
                self.bot.greeting_keyword = greeting_keyword;
            }
            if let Some(review_url) = bot.review_url {
                self.bot.review_url = review_url;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("REPLICA_DATADOG_API_KEY") {
            self.datadog.api_key = secret_value(value);
        }
        if let Some(value) = read_env("REPLICA_DATADOG_APP_KEY") {
            self.datadog.app_key = secret_value(value);
        }
        if let Some(value) = read_env("REPLICA_DATADOG_SITE") {
            self.datadog.site = value;
        }
        if let Some(value) = read_env("REPLICA_DATADOG_APP_BASE_URL") {
            self.datadog.app_base_url = value;
        }
        if let Some(value) = read_env("REPLICA_DATADOG_TIMEOUT_SECS") {
            self.datadog.timeout_secs = parse_u64("REPLICA_DATADOG_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("REPLICA_SLACK_APP_TOKEN") {
            self.slack.app_token = secret_value(value);
        }
        if let Some(value) = read_env("REPLICA_SLACK_BOT_TOKEN") {
            self.slack.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("REPLICA_SLACK_CHANNEL_ID") {
            self.slack.notify_channel_id = value;
        }
        if let Some(value) = read_env("REPLICA_SLACK_TIMEOUT_SECS") {
            self.slack.timeout_secs = parse_u64("REPLICA_SLACK_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("REPLICA_BOT_SLASH_COMMAND") {
            self.bot.slash_command = value;
        }
        if let Some(value) = read_env("REPLICA_BOT_GREETING_KEYWORD") {
            self.bot.greeting_keyword = value;
        }
        if let Some(value) = read_env("REPLICA_BOT_REVIEW_URL") {
            self.bot.review_url = value;
        }

        let log_level = read_env("REPLICA_LOGGING_LEVEL").or_else(|| read_env("REPLICA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REPLICA_LOGGING_FORMAT").or_else(|| read_env("REPLICA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(datadog_api_key) = overrides.datadog_api_key {
            self.datadog.api_key = secret_value(datadog_api_key);
        }
        if let Some(datadog_app_key) = overrides.datadog_app_key {
            self.datadog.app_key = secret_value(datadog_app_key);
        }
        if let Some(datadog_site) = overrides.datadog_site {
            self.datadog.site = datadog_site;
        }
        if let Some(slack_app_token) = overrides.slack_app_token {
            self.slack.app_token = secret_value(slack_app_token);
        }
        if let Some(slack_bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = secret_value(slack_bot_token);
        }
        if let Some(notify_channel_id) = overrides.notify_channel_id {
            self.slack.notify_channel_id = notify_channel_id;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_datadog(&self.datadog)?;
        validate_slack(&self.slack)?;
        validate_bot(&self.bot)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("replica.toml"), PathBuf::from("config/replica.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_datadog(datadog: &DatadogConfig) -> Result<(), ConfigError> {
    if datadog.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "datadog.api_key is required. Get it from your Datadog organization settings"
                .to_string(),
        ));
    }
    if datadog.app_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "datadog.app_key is required. Get it from your Datadog organization settings"
                .to_string(),
        ));
    }
    if datadog.site.trim().is_empty() || datadog.site.contains("://") {
        return Err(ConfigError::Validation(
            "datadog.site must be a bare host, e.g. `api.datadoghq.eu`".to_string(),
        ));
    }
    if !datadog.app_base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "datadog.app_base_url must be an https URL".to_string(),
        ));
    }
    if datadog.timeout_secs == 0 || datadog.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "datadog.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let app_token = slack.app_token.expose_secret();
    if app_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.app_token is required. Get it from https://api.slack.com/apps > Your App > Basic Information > App-Level Tokens".to_string()
        ));
    }
    if !app_token.starts_with("xapp-") {
        let hint = if app_token.starts_with("xoxb-") {
            " (hint: you may have used the bot token instead of the app token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.app_token must start with `xapp-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    let bot_token = slack.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.bot_token is required. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions > Bot User OAuth Token".to_string()
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        let hint = if bot_token.starts_with("xapp-") {
            " (hint: you may have used the app token instead of the bot token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.bot_token must start with `xoxb-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    if slack.notify_channel_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "slack.notify_channel_id is required (channel that receives replica notifications)"
                .to_string(),
        ));
    }
    if slack.timeout_secs == 0 || slack.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "slack.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_bot(bot: &BotConfig) -> Result<(), ConfigError> {
    if !bot.slash_command.starts_with('/') || bot.slash_command.len() < 2 {
        return Err(ConfigError::Validation(
            "bot.slash_command must start with `/` followed by a name".to_string(),
        ));
    }
    if bot.shortcut_callback_id.trim().is_empty() {
        return Err(ConfigError::Validation("bot.shortcut_callback_id is required".to_string()));
    }
    if bot.view_callback_id.trim().is_empty() {
        return Err(ConfigError::Validation("bot.view_callback_id is required".to_string()));
    }
    if bot.greeting_keyword.trim().is_empty() {
        return Err(ConfigError::Validation("bot.greeting_keyword is required".to_string()));
    }
    if !bot.review_url.starts_with("https://") {
        return Err(ConfigError::Validation("bot.review_url must be an https URL".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    datadog: Option<DatadogPatch>,
    slack: Option<SlackPatch>,
    bot: Option<BotPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatadogPatch {
    api_key: Option<String>,
    app_key: Option<String>,
    site: Option<String>,
    app_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    app_token: Option<String>,
    bot_token: Option<String>,
    notify_channel_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BotPatch {
    slash_command: Option<String>,
    shortcut_callback_id: Option<String>,
    view_callback_id: Option<String>,
    greeting_keyword: Option<String>,
    review_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::{
        interpolate_env_vars, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat,
    };

    fn valid_overrides() -> ConfigOverrides {
        ConfigOverrides {
            datadog_api_key: Some("dd-api".to_string()),
            datadog_app_key: Some("dd-app".to_string()),
            slack_app_token: Some("xapp-test".to_string()),
            slack_bot_token: Some("xoxb-test".to_string()),
            notify_channel_id: Some("C0123".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn defaults_target_the_eu_site_and_rep_command() {
        let config = AppConfig::default();
        assert_eq!(config.datadog.site, "api.datadoghq.eu");
        assert_eq!(config.datadog.app_base_url, "https://app.datadoghq.eu");
        assert_eq!(config.bot.slash_command, "/rep");
        assert_eq!(config.bot.greeting_keyword, "hello");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn load_succeeds_with_programmatic_overrides() {
        let config = AppConfig::load(LoadOptions {
            overrides: valid_overrides(),
            ..LoadOptions::default()
        })
        .expect("load should succeed");

        assert_eq!(config.datadog.api_key.expose_secret(), "dd-api");
        assert_eq!(config.slack.notify_channel_id, "C0123");
    }

    #[test]
    fn load_rejects_missing_datadog_credentials() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                slack_app_token: Some("xapp-test".to_string()),
                slack_bot_token: Some("xoxb-test".to_string()),
                notify_channel_id: Some("C0123".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("expected validation failure").to_string();
        assert!(message.contains("datadog.api_key"));
    }

    #[test]
    fn load_rejects_swapped_slack_tokens_with_hint() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                slack_app_token: Some("xoxb-oops".to_string()),
                ..valid_overrides()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("expected validation failure").to_string();
        assert!(message.contains("bot token instead of the app token"));
    }

    #[test]
    fn load_rejects_missing_notify_channel() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                notify_channel_id: Some("   ".to_string()),
                ..valid_overrides()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("expected validation failure").to_string();
        assert!(message.contains("slack.notify_channel_id"));
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[datadog]\nsite = \"api.datadoghq.com\"\napp_base_url = \"https://app.datadoghq.com\"\n\n[bot]\nslash_command = \"/replica\"\n"
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: valid_overrides(),
        })
        .expect("load should succeed");

        assert_eq!(config.datadog.site, "api.datadoghq.com");
        assert_eq!(config.bot.slash_command, "/replica");
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does/not/exist.toml".into()),
            require_file: true,
            overrides: valid_overrides(),
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn interpolation_resolves_known_vars_and_rejects_unterminated() {
        std::env::set_var("REPLICA_TEST_INTERP_VAR", "resolved");
        let output = interpolate_env_vars("value = \"${REPLICA_TEST_INTERP_VAR}\"")
            .expect("interpolation should succeed");
        assert_eq!(output, "value = \"resolved\"");

        let result = interpolate_env_vars("value = \"${UNTERMINATED");
        assert!(matches!(result, Err(ConfigError::UnterminatedInterpolation)));
    }

    #[test]
    fn invalid_slash_command_fails_validation() {
        let mut config = AppConfig::default();
        config.datadog.api_key = "k".to_string().into();
        config.datadog.app_key = "k".to_string().into();
        config.slack.app_token = "xapp-t".to_string().into();
        config.slack.bot_token = "xoxb-t".to_string().into();
        config.slack.notify_channel_id = "C1".to_string();
        config.bot.slash_command = "rep".to_string();

        let message = config.validate().err().expect("expected failure").to_string();
        assert!(message.contains("bot.slash_command"));
    }
}
