use std::env;

use lazy_static::lazy_static;

lazy_static! {
    pub static ref CONFIG: Config = Config::from_env();
}

/// Origins allowed outside production so local frontends can send credentials.
const DEV_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:5000",
    "http://127.0.0.1:5000",
    "http://localhost:3000",
    "http://localhost:5173",
];

/// Request headers accepted from browsers in production.
pub const PRODUCTION_CORS_HEADERS: [&str; 5] = [
    "Authorization",
    "Content-Type",
    "Accept",
    "Origin",
    "X-Requested-With",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
    Gemini,
    OpenAi,
}

impl ImageProvider {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "openai" => ImageProvider::OpenAi,
            _ => ImageProvider::Gemini,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub debug: bool,
    pub environment: String,
    pub log_level: String,

    pub host: String,
    pub port: u16,

    pub jwt_secret_key: String,
    pub jwt_algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,

    pub cors_origins: Vec<String>,
    /// `None` allows any request header.
    pub cors_headers: Option<Vec<String>>,

    pub image_provider: ImageProvider,
    pub openai_api_key: String,
    pub openai_model: String,
    pub gemini_api_key: String,
    pub gemini_model: String,

    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,
    pub aws_bucket_name: String,

    pub mongodb_uri: String,
    pub mongodb_db_name: String,
    pub mongodb_user_collection: String,
    pub mongodb_property_collection: String,
    pub mongodb_chat_collection: String,
    pub mongodb_refresh_token_collection: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, then apply the
    /// environment-specific overrides.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: i64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let mut config = Self {
            app_name: string("APP_NAME", "Property Analysis API"),
            debug: lookup("DEBUG").map(|v| parse_bool(&v)).unwrap_or(false),
            environment: string("ENVIRONMENT", "development"),
            log_level: string("LOG_LEVEL", "INFO"),
            host: string("HOST", "0.0.0.0"),
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(8000),
            jwt_secret_key: string("JWT_SECRET_KEY", "your-secret-key-here"),
            jwt_algorithm: string("JWT_ALGORITHM", "HS256"),
            access_token_expire_minutes: number("ACCESS_TOKEN_EXPIRE_MINUTES", 1440),
            refresh_token_expire_days: number("REFRESH_TOKEN_EXPIRE_DAYS", 30),
            cors_origins: Vec::new(),
            cors_headers: None,
            image_provider: ImageProvider::parse(&string("IMAGE_PROVIDER", "gemini")),
            openai_api_key: string("OPENAI_API_KEY", ""),
            openai_model: string("OPENAI_MODEL", "gpt-image-1.5"),
            gemini_api_key: string("GEMINI_API_KEY", ""),
            gemini_model: string("GEMINI_MODEL", "gemini-2.5-flash-image"),
            aws_access_key_id: string("AWS_ACCESS_KEY_ID", ""),
            aws_secret_access_key: string("AWS_SECRET_ACCESS_KEY", ""),
            aws_region: string("AWS_REGION", ""),
            aws_bucket_name: string("AWS_BUCKET_NAME", ""),
            mongodb_uri: string("MONGODB_URI", ""),
            mongodb_db_name: string("MONGODB_DB_NAME", ""),
            mongodb_user_collection: string("MONGODB_USER_COLLECTION", "user_data"),
            mongodb_property_collection: string("MONGODB_PROPERTY_COLLECTION", "property_data"),
            mongodb_chat_collection: string("MONGODB_CHAT_COLLECTION", "chat_history"),
            mongodb_refresh_token_collection: string(
                "MONGODB_REFRESH_TOKEN_COLLECTION",
                "refresh_tokens",
            ),
        };

        config.apply_environment(lookup("CORS_ORIGINS").as_deref());
        config
    }

    fn apply_environment(&mut self, raw_cors_origins: Option<&str>) {
        if self.is_production() {
            self.debug = false;
            self.log_level = "INFO".to_string();
            self.cors_origins = parse_production_origins(raw_cors_origins.unwrap_or(""));
            self.cors_headers = Some(
                PRODUCTION_CORS_HEADERS
                    .iter()
                    .map(|h| h.to_string())
                    .collect(),
            );
        } else {
            self.debug = true;
            self.log_level = "DEBUG".to_string();
            self.cors_origins = DEV_CORS_ORIGINS.iter().map(|o| o.to_string()).collect();
            self.cors_headers = None;
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// A wildcard is refused in production; everything else is a comma list.
fn parse_production_origins(raw: &str) -> Vec<String> {
    let cleaned = raw.trim().trim_matches('"').trim_matches('\'');
    if cleaned.is_empty() || cleaned == "*" {
        return Vec::new();
    }
    cleaned
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
