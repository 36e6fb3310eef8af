use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    pub smtp: Option<SmtpConfig>,
    pub report: ReportConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Shared-password access and the session tokens issued after login
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared quality-team password (`QUALITY_PASS`)
    pub quality_password: String,
    /// HMAC secret used to sign session tokens
    pub token_secret: String,
    pub token_ttl: Duration,
}

// Secrets stay out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("quality_password", &"***")
            .field("token_secret", &"***")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Photo bucket configuration
///
/// Either backend may be configured. When `s3` is present it takes precedence
/// over the Supabase REST API.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket name (`SUPABASE_BUCKET`)
    pub bucket: String,
    pub supabase: Option<SupabaseStorageConfig>,
    pub s3: Option<S3StorageConfig>,
}

#[derive(Clone)]
pub struct SupabaseStorageConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Service or anon key sent as bearer token
    pub key: String,
}

impl std::fmt::Debug for SupabaseStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStorageConfig")
            .field("url", &self.url)
            .field("key", &"***")
            .finish()
    }
}

/// S3-compatible endpoint (MinIO, Supabase S3 gateway, AWS)
#[derive(Clone)]
pub struct S3StorageConfig {
    pub endpoint: String,
    /// Endpoint used to build public links (defaults to `endpoint`)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl std::fmt::Debug for S3StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("public_endpoint", &self.public_endpoint)
            .field("access_key", &"***")
            .field("secret_key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

/// SMTP settings for optional email notifications
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: Vec<String>,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// PDF report generation settings
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Timeout for fetching each photo from the bucket
    pub photo_fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            report: ReportConfig::from_env()?,
        })
    }
}

/// Read a variable, treating empty values as unset
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Hosted Postgres poolers cap connections aggressively
    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_MIN_CONNECTIONS: u32 = 0;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300; // 5 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = non_empty_var("SUPABASE_DB_URL")
            .or_else(|| non_empty_var("DATABASE_URL"))
            .ok_or_else(|| "SUPABASE_DB_URL (or DATABASE_URL) must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_TOKEN_TTL_SECS: u64 = 12 * 3600; // one work shift

    pub fn from_env() -> Result<Self, String> {
        let quality_password = non_empty_var("QUALITY_PASS")
            .ok_or_else(|| "QUALITY_PASS environment variable is required".to_string())?;

        // Without an explicit secret, tokens are bound to the password itself so
        // rotating QUALITY_PASS invalidates every open session.
        let token_secret = non_empty_var("AUTH_TOKEN_SECRET")
            .unwrap_or_else(|| format!("rnc-session:{}", quality_password));

        let token_ttl_secs = env::var("AUTH_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TOKEN_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "AUTH_TOKEN_TTL_SECS must be a valid number".to_string())?;

        Ok(Self {
            quality_password,
            token_secret,
            token_ttl: Duration::from_secs(token_ttl_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = non_empty_var("SWAGGER_USERNAME");
        let password = non_empty_var("SWAGGER_PASSWORD");
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "RNC Tracker API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Non-conformance report (RNC) tracking API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    pub const DEFAULT_BUCKET: &'static str = "rnc-fotos";
    const DEFAULT_S3_REGION: &'static str = "us-east-1";

    pub fn from_env() -> Result<Self, String> {
        let bucket =
            non_empty_var("SUPABASE_BUCKET").unwrap_or_else(|| Self::DEFAULT_BUCKET.to_string());

        let supabase = match (non_empty_var("SUPABASE_URL"), non_empty_var("SUPABASE_KEY")) {
            (Some(url), Some(key)) => Some(SupabaseStorageConfig {
                url: url.trim_end_matches('/').to_string(),
                key,
            }),
            (Some(_), None) => {
                return Err("SUPABASE_KEY must be set when SUPABASE_URL is set".to_string())
            }
            _ => None,
        };

        let s3 = match non_empty_var("S3_ENDPOINT") {
            Some(endpoint) => {
                let endpoint = endpoint.trim_end_matches('/').to_string();
                let public_endpoint = non_empty_var("S3_PUBLIC_ENDPOINT")
                    .map(|e| e.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| endpoint.clone());
                let access_key = non_empty_var("S3_ACCESS_KEY")
                    .ok_or_else(|| "S3_ACCESS_KEY must be set when S3_ENDPOINT is set")?;
                let secret_key = non_empty_var("S3_SECRET_KEY")
                    .ok_or_else(|| "S3_SECRET_KEY must be set when S3_ENDPOINT is set")?;
                let region = non_empty_var("S3_REGION")
                    .unwrap_or_else(|| Self::DEFAULT_S3_REGION.to_string());

                Some(S3StorageConfig {
                    endpoint,
                    public_endpoint,
                    access_key,
                    secret_key,
                    region,
                })
            }
            None => None,
        };

        Ok(Self {
            bucket,
            supabase,
            s3,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.supabase.is_some() || self.s3.is_some()
    }
}

impl SmtpConfig {
    const DEFAULT_PORT: u16 = 587;

    /// Returns `Ok(None)` when email notification is not configured.
    pub fn from_env() -> Result<Option<Self>, String> {
        let Some(host) = non_empty_var("SMTP_HOST") else {
            return Ok(None);
        };

        let port = match non_empty_var("SMTP_PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| "SMTP_PORT must be a valid port number".to_string())?,
            None => Self::DEFAULT_PORT,
        };

        let from = non_empty_var("EMAIL_FROM")
            .ok_or_else(|| "EMAIL_FROM must be set when SMTP_HOST is set".to_string())?;

        let to: Vec<String> = non_empty_var("EMAIL_TO")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if to.is_empty() {
            return Err("EMAIL_TO must be set when SMTP_HOST is set".to_string());
        }

        Ok(Some(Self {
            host,
            port,
            username: non_empty_var("SMTP_USER"),
            password: non_empty_var("SMTP_PASS"),
            from,
            to,
        }))
    }
}

impl ReportConfig {
    const DEFAULT_PHOTO_FETCH_TIMEOUT_SECS: u64 = 15;

    pub fn from_env() -> Result<Self, String> {
        let secs = env::var("PHOTO_FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_PHOTO_FETCH_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "PHOTO_FETCH_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            photo_fetch_timeout: Duration::from_secs(secs),
        })
    }
}
