use anyhow::{bail, Context, Result};
use glob::glob;
use std::{env, str::FromStr, time::Duration};

use crate::monitor::MonitorConfig;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_INPUT_GLOB: &str = "/data/input/*";
const DEFAULT_N_REDUCE: u32 = 10;
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 5;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct MasterConfig {
    pub addr: String,
    /// Patrón de archivos de entrada, ej: "/data/input/*.txt"
    pub input_glob: String,
    pub n_reduce: u32,
    pub monitor: MonitorConfig,
    /// Tiempo que se sigue atendiendo después de Exit, para que los
    /// workers que están esperando reciban la señal de salida.
    pub shutdown_grace: Duration,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

impl MasterConfig {
    /// Lee la configuración de variables de entorno (con defaults).
    pub fn from_env() -> Result<Self> {
        let config = Self {
            addr: env::var("MASTER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            input_glob: env::var("INPUT_GLOB").unwrap_or_else(|_| DEFAULT_INPUT_GLOB.to_string()),
            n_reduce: env_or("N_REDUCE", DEFAULT_N_REDUCE),
            monitor: MonitorConfig {
                interval: Duration::from_secs(env_or(
                    "MONITOR_INTERVAL_SECS",
                    DEFAULT_MONITOR_INTERVAL_SECS,
                )),
                task_timeout: Duration::from_secs(env_or(
                    "TASK_TIMEOUT_SECS",
                    DEFAULT_TASK_TIMEOUT_SECS,
                )),
            },
            shutdown_grace: Duration::from_secs(env_or(
                "SHUTDOWN_GRACE_SECS",
                DEFAULT_SHUTDOWN_GRACE_SECS,
            )),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_reduce == 0 {
            bail!("N_REDUCE tiene que ser al menos 1");
        }
        if self.monitor.interval.is_zero() {
            bail!("MONITOR_INTERVAL_SECS tiene que ser mayor a 0");
        }
        if self.monitor.interval >= self.monitor.task_timeout {
            bail!(
                "el intervalo del monitor ({:?}) tiene que ser menor al timeout de tarea ({:?})",
                self.monitor.interval,
                self.monitor.task_timeout
            );
        }
        Ok(())
    }
}

/// Archivos que hacen match con el patrón, ordenados para que la
/// numeración de tareas Map sea reproducible.
pub fn collect_inputs(pattern: &str) -> Result<Vec<String>> {
    let mut inputs = Vec::new();
    for entry in glob(pattern).with_context(|| format!("patrón input_glob inválido: {}", pattern))? {
        let path = entry.context("no se pudo leer una entrada del glob")?;
        if path.is_file() {
            inputs.push(path.to_string_lossy().to_string());
        }
    }
    inputs.sort();
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("master_config_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    fn config() -> MasterConfig {
        MasterConfig {
            addr: DEFAULT_ADDR.to_string(),
            input_glob: DEFAULT_INPUT_GLOB.to_string(),
            n_reduce: 2,
            monitor: MonitorConfig::default(),
            shutdown_grace: Duration::from_secs(1),
        }
    }

    #[test]
    fn default_monitor_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn interval_must_be_shorter_than_timeout() {
        let mut c = config();
        c.monitor.interval = Duration::from_secs(30);
        assert!(c.validate().is_err());

        c.monitor.interval = Duration::ZERO;
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_reducers_is_rejected() {
        let mut c = config();
        c.n_reduce = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn collect_inputs_returns_sorted_files_only() {
        let tmp = temp_dir("inputs");
        fs::write(tmp.join("pg-b.txt"), "b").unwrap();
        fs::write(tmp.join("pg-a.txt"), "a").unwrap();
        fs::create_dir_all(tmp.join("pg-dir.txt")).unwrap();

        let pattern = format!("{}/pg-*.txt", tmp.display());
        let inputs = collect_inputs(&pattern).unwrap();

        assert_eq!(
            inputs,
            vec![
                tmp.join("pg-a.txt").to_string_lossy().to_string(),
                tmp.join("pg-b.txt").to_string_lossy().to_string(),
            ]
        );
    }

    #[test]
    fn collect_inputs_rejects_bad_pattern() {
        assert!(collect_inputs("[").is_err());
    }
}
