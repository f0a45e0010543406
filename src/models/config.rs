use serde::{Deserialize, Serialize};

/// User configuration from VehPack Config.yaml
///
/// Contains input/output locations and archiver settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "VehPack_Settings", default)]
    pub settings: PackSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackSettings {
    #[serde(rename = "Input Dir", default = "default_input_dir")]
    pub input_dir: String,

    #[serde(rename = "Output Dir", default = "default_output_dir")]
    pub output_dir: String,

    #[serde(rename = "Archiver Path", default = "default_archiver_path")]
    pub archiver_path: String,

    /// Seconds to wait for one archiver invocation.
    #[serde(rename = "Archiver Timeout", default = "default_archiver_timeout")]
    pub archiver_timeout: u64,

    #[serde(rename = "Platform Dir", default = "default_platform_dir")]
    pub platform_dir: String,

    #[serde(rename = "Keep Temp", default)]
    pub keep_temp: bool,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    #[serde(rename = "Log Dir", default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            archiver_path: default_archiver_path(),
            archiver_timeout: default_archiver_timeout(),
            platform_dir: default_platform_dir(),
            keep_temp: false,
            debug_mode: false,
            log_dir: default_log_dir(),
        }
    }
}

fn default_input_dir() -> String {
    "input".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_archiver_path() -> String {
    if cfg!(target_os = "windows") {
        "utils/gtautil.exe".to_string()
    } else {
        "utils/gtautil".to_string()
    }
}

fn default_archiver_timeout() -> u64 {
    300
}

fn default_platform_dir() -> String {
    "x64".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_settings_defaults() {
        let settings = PackSettings::default();
        assert_eq!(settings.input_dir, "input");
        assert_eq!(settings.output_dir, "output");
        assert_eq!(settings.archiver_timeout, 300);
        assert_eq!(settings.platform_dir, "x64");
        assert!(!settings.keep_temp);
        assert!(settings.archiver_path.contains("gtautil"));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "VehPack_Settings:\n  Input Dir: mods\n  Keep Temp: true\n";
        let config: UserConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(config.settings.input_dir, "mods");
        assert!(config.settings.keep_temp);
        assert_eq!(config.settings.output_dir, "output");
        assert_eq!(config.settings.archiver_timeout, 300);
    }
}
