use std::{env, path::PathBuf, str::FromStr, time::Duration};

const DEFAULT_MASTER_URL: &str = "http://localhost:8080";
const DEFAULT_WAIT_INTERVAL_MS: u64 = 1000;
const DEFAULT_RPC_MAX_RETRIES: u32 = 3;
const DEFAULT_RPC_RETRY_BACKOFF_MS: u64 = 500;

/// Qué hacer cuando el master no responde: reintentar un par de veces y
/// después rendirse (el worker termina).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RPC_MAX_RETRIES,
            backoff: Duration::from_millis(DEFAULT_RPC_RETRY_BACKOFF_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// En Docker: MASTER_URL=http://master:8080
    pub master_url: String,
    /// Directorio donde se publican intermedios y salidas
    pub work_dir: PathBuf,
    /// Pausa cuando el master contesta Wait
    pub wait_interval: Duration,
    pub retry: RetryPolicy,
    /// Aplicación map/reduce a ejecutar
    pub app: String,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            master_url: env::var("MASTER_URL").unwrap_or_else(|_| DEFAULT_MASTER_URL.to_string()),
            work_dir: env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            wait_interval: Duration::from_millis(env_or("WAIT_INTERVAL_MS", DEFAULT_WAIT_INTERVAL_MS)),
            retry: RetryPolicy {
                max_retries: env_or("RPC_MAX_RETRIES", DEFAULT_RPC_MAX_RETRIES),
                backoff: Duration::from_millis(env_or(
                    "RPC_RETRY_BACKOFF_MS",
                    DEFAULT_RPC_RETRY_BACKOFF_MS,
                )),
            },
            app: env::var("MR_APP").unwrap_or_else(|_| "wordcount".to_string()),
        }
    }
}
