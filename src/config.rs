use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub gacha: GachaConfig,
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GachaConfig {
    /// 自定义徽章目录 (TOML)，为空时使用内置目录
    pub catalog_path: Option<String>,
    /// 历史记录默认返回条数
    pub history_default_limit: u64,
    /// 历史记录单次最大返回条数
    pub history_max_limit: u64,
    /// 写冲突时整笔抽取事务的最大尝试次数
    pub max_tx_attempts: u32,
    /// 内部发券接口密钥，为空表示关闭该接口
    pub internal_api_key: String,
}

impl Default for GachaConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            history_default_limit: 20,
            history_max_limit: 100,
            max_tx_attempts: 5,
            internal_api_key: String::new(),
        }
    }
}

impl GachaConfig {
    /// 将请求的条数限制在 [1, history_max_limit]
    pub fn history_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.history_default_limit)
            .clamp(1, self.history_max_limit.max(1))
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
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
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

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
                    gacha: GachaConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }

        // Gacha
        if let Ok(v) = env::var("GACHA_CATALOG_PATH") {
            self.gacha.catalog_path = Some(v);
        }
        if let Ok(v) = env::var("GACHA_HISTORY_DEFAULT_LIMIT")
            && let Ok(n) = v.parse()
        {
            self.gacha.history_default_limit = n;
        }
        if let Ok(v) = env::var("GACHA_HISTORY_MAX_LIMIT")
            && let Ok(n) = v.parse()
        {
            self.gacha.history_max_limit = n;
        }
        if let Ok(v) = env::var("GACHA_MAX_TX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            self.gacha.max_tx_attempts = n;
        }
        if let Ok(v) = env::var("GACHA_INTERNAL_API_KEY") {
            self.gacha.internal_api_key = v;
        }
    }
}
