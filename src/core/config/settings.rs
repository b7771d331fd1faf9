use reqwest::Url;

use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_environment, parse_navigation_policy,
    parse_socket_addr, parse_u64,
};
use super::types::{
    ApiSettings, ConfigError, RuntimeSettings, SessionSettings, Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let environment = parse_environment(
            env_optional("EXAM_ENGINE_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("EXAM_ENGINE_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let base_url = env_or_default("EXAM_API_BASE_URL", "http://localhost:8000/api");
        let token = env_optional("EXAM_API_TOKEN");
        let timeout_seconds = parse_u64(
            "EXAM_API_TIMEOUT_SECONDS",
            env_or_default("EXAM_API_TIMEOUT_SECONDS", "30"),
        )?;
        let connect_timeout_seconds = parse_u64(
            "EXAM_API_CONNECT_TIMEOUT_SECONDS",
            env_or_default("EXAM_API_CONNECT_TIMEOUT_SECONDS", "10"),
        )?;

        let exam_id = env_or_default("EXAM_ID", "");
        let navigation_policy =
            parse_navigation_policy(env_optional("EXAM_REQUIRE_ANSWER_TO_ADVANCE"));

        let log_level = env_or_default("EXAM_ENGINE_LOG_LEVEL", "info");
        let json = env_optional("EXAM_ENGINE_LOG_JSON")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_listen_addr = parse_socket_addr(
            "PROMETHEUS_LISTEN_ADDR",
            env_or_default("PROMETHEUS_LISTEN_ADDR", "127.0.0.1:9100"),
        )?;

        let settings = Self {
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { base_url, token, timeout_seconds, connect_timeout_seconds },
            session: SessionSettings { exam_id, navigation_policy },
            telemetry: TelemetrySettings {
                log_level,
                json,
                prometheus_enabled,
                prometheus_listen_addr,
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn session(&self) -> &SessionSettings {
        &self.session
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let base_url_valid = Url::parse(&self.api.base_url)
            .map(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
            .unwrap_or(false);
        if !base_url_valid {
            return Err(ConfigError::InvalidValue {
                field: "EXAM_API_BASE_URL",
                value: self.api.base_url.clone(),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "EXAM_API_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.api.connect_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "EXAM_API_CONNECT_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.session.exam_id.is_empty() {
            return Err(ConfigError::MissingValue("EXAM_ID"));
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.api.token.is_none() {
            return Err(ConfigError::MissingSecret("EXAM_API_TOKEN"));
        }
        if !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "EXAM_API_BASE_URL",
                value: self.api.base_url.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::Environment;
    use super::*;
    use crate::domain::types::NavigationPolicy;
    use crate::test_support;

    #[tokio::test]
    async fn load_uses_defaults() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.runtime().environment, Environment::Test);
        assert!(!settings.runtime().strict_config);
        assert_eq!(settings.api().timeout_seconds, 30);
        assert_eq!(settings.api().connect_timeout_seconds, 10);
        assert!(settings.api().token.is_none());
        assert_eq!(settings.session().exam_id, "exam-1");
        assert_eq!(settings.session().navigation_policy, NavigationPolicy::Free);
        assert_eq!(settings.telemetry().log_level, "info");
        assert!(!settings.telemetry().prometheus_enabled);
    }

    #[tokio::test]
    async fn load_reads_overrides() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("EXAM_API_TOKEN", "secret-token");
        std::env::set_var("EXAM_API_TIMEOUT_SECONDS", "5");
        std::env::set_var("EXAM_REQUIRE_ANSWER_TO_ADVANCE", "true");
        std::env::set_var("EXAM_ENGINE_LOG_JSON", "1");

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.api().token.as_deref(), Some("secret-token"));
        assert_eq!(settings.api().timeout_seconds, 5);
        assert_eq!(settings.session().navigation_policy, NavigationPolicy::RequireAnswer);
        assert!(settings.telemetry().json);
    }

    #[tokio::test]
    async fn load_requires_exam_id() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::remove_var("EXAM_ID");

        let err = Settings::load().expect_err("missing exam id");
        assert!(matches!(err, ConfigError::MissingValue("EXAM_ID")));
    }

    #[tokio::test]
    async fn load_rejects_non_http_base_url() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("EXAM_API_BASE_URL", "ftp://exams.example.com");

        let err = Settings::load().expect_err("invalid url");
        assert!(matches!(err, ConfigError::InvalidValue { field: "EXAM_API_BASE_URL", .. }));
    }

    #[tokio::test]
    async fn production_requires_token() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("EXAM_ENGINE_ENV", "production");
        std::env::set_var("EXAM_API_BASE_URL", "https://exams.example.com/api");

        let err = Settings::load().expect_err("missing token");
        assert!(matches!(err, ConfigError::MissingSecret("EXAM_API_TOKEN")));

        std::env::set_var("EXAM_API_TOKEN", "secret-token");
        let settings = Settings::load().expect("settings");
        assert!(settings.runtime().strict_config);
    }
}
