use std::ffi::OsStr;
use std::fs::File;

use justconfig::error::ConfigError;
use justconfig::item::ValueExtractor;
use justconfig::processors::Trim;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::config_processors::Unquote;
use crate::error::{EvalError, Result};
use crate::metrics::report::{DEFAULT_DECIMALS, MAX_DECIMALS};

// Set some default values
const DEFAULT_K: usize = 5;
const DEFAULT_LOG_LEVEL: &str = "info";

pub struct AppConfig {
    pub data: DataConfig,
    pub eval: EvalConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

pub struct DataConfig {
    pub recommendations_path: Option<String>,
    pub groundtruth_path: Option<String>,
    pub sort_by_score: bool,
}

pub struct EvalConfig {
    pub k: usize,
}

pub struct OutputConfig {
    pub per_user_path: Option<String>,
    pub decimals: u32,
}

pub struct LogConfig {
    pub level: String,
}

impl AppConfig {
    /// Reads the optional config file, then lets environment variables override it.
    pub fn new(config_path: Option<&str>) -> Result<AppConfig> {
        // Initialize config object
        let mut conf = Config::default();

        if let Some(config_path) = config_path {
            let config_file = File::open(config_path).map_err(|source| EvalError::Io {
                path: config_path.to_string(),
                source,
            })?;
            let config_text = ConfigText::new(config_file, config_path)
                .map_err(|e| EvalError::Config(format!("loading {} failed: {}", config_path, e)))?;
            conf.add_source(config_text);
        }

        // Define config params from environment variables
        let config_env = Env::new(&[
            (
                ConfPath::from(&["data", "recommendations_path"]),
                OsStr::new("RECOMMENDATIONS"),
            ),
            (
                ConfPath::from(&["data", "groundtruth_path"]),
                OsStr::new("GROUNDTRUTH"),
            ),
            (ConfPath::from(&["eval", "k"]), OsStr::new("EVAL_K")),
            (ConfPath::from(&["log", "level"]), OsStr::new("LOG_LEVEL")),
        ]);
        conf.add_source(config_env);

        // Parse into custom config struct
        AppConfig::parse(&conf)
    }

    pub(crate) fn parse(conf: &Config) -> Result<AppConfig> {
        Ok(AppConfig {
            data: DataConfig::parse(conf, ConfPath::from(&["data"]))?,
            eval: EvalConfig::parse(conf, ConfPath::from(&["eval"]))?,
            output: OutputConfig::parse(conf, ConfPath::from(&["output"]))?,
            log: LogConfig::parse(conf, ConfPath::from(&["log"]))?,
        })
    }
}

fn config_error(e: ConfigError) -> EvalError {
    EvalError::Config(e.to_string())
}

impl DataConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<DataConfig> {
        Ok(DataConfig {
            recommendations_path: conf
                .get(path.push("recommendations_path"))
                .unquote()
                .try_value()
                .map_err(config_error)?,
            groundtruth_path: conf
                .get(path.push("groundtruth_path"))
                .unquote()
                .try_value()
                .map_err(config_error)?,
            sort_by_score: conf
                .get(path.push("sort_by_score"))
                .trim()
                .try_value()
                .map_err(config_error)?
                .unwrap_or(false),
        })
    }
}

impl EvalConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<EvalConfig> {
        Ok(EvalConfig {
            k: conf
                .get(path.push("k"))
                .trim()
                .try_value()
                .map_err(config_error)?
                .unwrap_or(DEFAULT_K),
        })
    }
}

impl OutputConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<OutputConfig> {
        let decimals = conf
            .get(path.push("decimals"))
            .trim()
            .try_value()
            .map_err(config_error)?
            .unwrap_or(DEFAULT_DECIMALS);
        if decimals > MAX_DECIMALS {
            return Err(EvalError::Config(format!(
                "output.decimals must be at most {}, got {}",
                MAX_DECIMALS, decimals
            )));
        }
        Ok(OutputConfig {
            per_user_path: conf
                .get(path.push("per_user_path"))
                .unquote()
                .try_value()
                .map_err(config_error)?,
            decimals,
        })
    }
}

impl LogConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<LogConfig> {
        Ok(LogConfig {
            level: conf
                .get(path.push("level"))
                .unquote()
                .try_value()
                .map_err(config_error)?
                .unwrap_or_else(|| String::from(DEFAULT_LOG_LEVEL)),
        })
    }
}
