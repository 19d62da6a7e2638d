use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration file (YAML or JSON).
///
/// Example `config.yaml`:
/// ```yaml
/// port: 9091
/// data-dir: /var/lib/bfw/data
/// token: my-secret-token
/// log-format: json
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfigFile {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, alias = "data-dir")]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, alias = "log-format")]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format '{}', expected text or json", s)),
        }
    }
}

/// Load a config file, returning the default if the file doesn't exist.
/// Files ending in `.json` are read as JSON, anything else as YAML.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config: T = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default() {
        let cfg: ServerConfigFile = load_config_file("/nonexistent/bfw/config.yaml").unwrap();
        assert!(cfg.port.is_none());
        assert!(cfg.log_format.is_none());
    }

    #[test]
    fn yaml_and_json_are_both_read() {
        let dir = std::env::temp_dir().join(format!("bfw-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let yaml = dir.join("config.yaml");
        std::fs::write(&yaml, "port: 7000\ndata-dir: /srv/bfw\nlog-format: json\n").unwrap();
        let cfg: ServerConfigFile = load_config_file(yaml.to_str().unwrap()).unwrap();
        assert_eq!(cfg.port, Some(7000));
        assert_eq!(cfg.data_dir.as_deref(), Some("/srv/bfw"));
        assert_eq!(cfg.log_format, Some(LogFormat::Json));

        let json = dir.join("config.json");
        std::fs::write(&json, r#"{"port": 7001, "token": "t"}"#).unwrap();
        let cfg: ServerConfigFile = load_config_file(json.to_str().unwrap()).unwrap();
        assert_eq!(cfg.port, Some(7001));
        assert_eq!(cfg.token.as_deref(), Some("t"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
