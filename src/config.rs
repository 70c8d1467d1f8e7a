use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 计分与锁账本的业务参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// 每用户锁代币上限
    #[serde(default = "default_max_locks")]
    pub max_locks: i32,
    /// 没收后的冷却天数
    #[serde(default = "default_forfeit_cooldown_days")]
    pub forfeit_cooldown_days: i64,
    /// 重算再次没收时冷却是否从头计
    #[serde(default = "default_recompute_restarts_cooldown")]
    pub recompute_restarts_cooldown: bool,
    /// 并发冲突自动重试次数
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 批量计分只看最近 N 小时出的结果，不填就全量扫
    #[serde(default)]
    pub hours_back: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// 是否自动扫描未计分结果
    #[serde(default = "default_auto_process_outcomes")]
    pub auto_process_outcomes: bool,
    #[serde(default = "default_outcome_sweep_secs")]
    pub outcome_sweep_secs: u64,
    #[serde(default = "default_replenish_sweep_secs")]
    pub replenish_sweep_secs: u64,
}

fn default_max_locks() -> i32 {
    3
}
fn default_forfeit_cooldown_days() -> i64 {
    30
}
fn default_recompute_restarts_cooldown() -> bool {
    true
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_auto_process_outcomes() -> bool {
    true
}
fn default_outcome_sweep_secs() -> u64 {
    300
}
fn default_replenish_sweep_secs() -> u64 {
    3600
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_locks: default_max_locks(),
            forfeit_cooldown_days: default_forfeit_cooldown_days(),
            recompute_restarts_cooldown: default_recompute_restarts_cooldown(),
            retry_attempts: default_retry_attempts(),
            hours_back: None,
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            auto_process_outcomes: default_auto_process_outcomes(),
            outcome_sweep_secs: default_outcome_sweep_secs(),
            replenish_sweep_secs: default_replenish_sweep_secs(),
        }
    }
}

fn env_bool(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")
}

impl Config {
    pub fn from_toml() -> Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str).context("解析配置文件失败")?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .context("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    scoring: ScoringConfig::default(),
                    tasks: TasksConfig::default(),
                }
            }
            Err(e) => {
                return Err(anyhow::anyhow!("无法读取配置文件 {config_path}: {e}"));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("MAX_LOCKS")
            && let Ok(n) = v.parse()
        {
            config.scoring.max_locks = n;
        }
        if let Ok(v) = env::var("LOCK_COOLDOWN_DAYS")
            && let Ok(n) = v.parse()
        {
            config.scoring.forfeit_cooldown_days = n;
        }
        if let Ok(v) = env::var("RECOMPUTE_RESTARTS_COOLDOWN") {
            config.scoring.recompute_restarts_cooldown = env_bool(&v);
        }
        if let Ok(v) = env::var("SCORE_RETRY_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            config.scoring.retry_attempts = n;
        }
        if let Ok(v) = env::var("SCORE_PROCESSING_HOURS_BACK")
            && let Ok(n) = v.parse()
        {
            config.scoring.hours_back = Some(n);
        }
        if let Ok(v) = env::var("AUTO_PROCESS_OUTCOMES") {
            config.tasks.auto_process_outcomes = env_bool(&v);
        }
        if let Ok(v) = env::var("OUTCOME_SWEEP_SECS")
            && let Ok(n) = v.parse()
        {
            config.tasks.outcome_sweep_secs = n;
        }
        if let Ok(v) = env::var("REPLENISH_SWEEP_SECS")
            && let Ok(n) = v.parse()
        {
            config.tasks.replenish_sweep_secs = n;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_defaults_when_sections_omitted() {
        let config: Config = toml::from_str(
            r#"
[server]
host = "127.0.0.1"
port = 8080

[database]
url = "postgres://localhost/tipoff"
max_connections = 5

[jwt]
secret = "s"
access_token_expires_in = 3600
"#,
        )
        .unwrap();
        assert_eq!(config.scoring.max_locks, 3);
        assert_eq!(config.scoring.forfeit_cooldown_days, 30);
        assert!(config.scoring.recompute_restarts_cooldown);
        assert_eq!(config.scoring.retry_attempts, 3);
        assert_eq!(config.scoring.hours_back, None);
        assert!(config.tasks.auto_process_outcomes);
        assert_eq!(config.tasks.outcome_sweep_secs, 300);
        assert_eq!(config.tasks.replenish_sweep_secs, 3600);
    }

    #[test]
    fn test_env_bool_accepts_common_truthy_values() {
        assert!(env_bool("1"));
        assert!(env_bool("TRUE"));
        assert!(env_bool("yes"));
        assert!(!env_bool("0"));
        assert!(!env_bool("off"));
    }
}
