//! Per-model configuration files.
//!
//! Configuration is looked up in `*.conf` files whose `[Device]` section
//! matches the vendor and product IDs of the controller, searched in the
//! system and local share directories and `./config`. `/etc/iptsd.conf`
//! applies on top, without a device filter. Built-in quirks seed the
//! defaults, so most machines work without any file at all.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::device::DeviceInfo;
use crate::quirks::Quirks;

const CONFIG_DIRS: &[&str] = &["/usr/share/iptsd", "/usr/local/share/iptsd", "./config"];
const CONFIG_OVERRIDE: &str = "/etc/iptsd.conf";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Effective daemon configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub invert_x: bool,
    pub invert_y: bool,

    /// Physical panel size in millimetres, used for axis resolutions.
    pub width: Option<u32>,
    pub height: Option<u32>,

    /// Lift all touches while a palm is resting on the panel.
    pub block_on_palm: bool,
}

#[derive(Debug, Deserialize)]
struct ConfFile {
    #[serde(rename = "Device")]
    device: Option<DeviceSection>,

    #[serde(rename = "Config", default)]
    config: ConfigSection,
}

#[derive(Debug, Deserialize)]
struct DeviceSection {
    #[serde(rename = "Vendor")]
    vendor: u32,

    #[serde(rename = "Product")]
    product: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigSection {
    #[serde(rename = "InvertX")]
    invert_x: Option<bool>,

    #[serde(rename = "InvertY")]
    invert_y: Option<bool>,

    #[serde(rename = "Width")]
    width: Option<u32>,

    #[serde(rename = "Height")]
    height: Option<u32>,

    #[serde(rename = "BlockOnPalm")]
    block_on_palm: Option<bool>,
}

impl Config {
    /// Build the configuration for the given controller.
    pub fn load(info: &DeviceInfo) -> Result<Self, ConfigError> {
        Self::load_with_paths(info, CONFIG_DIRS, Path::new(CONFIG_OVERRIDE))
    }

    fn load_with_paths(
        info: &DeviceInfo,
        dirs: &[impl AsRef<Path>],
        override_file: &Path,
    ) -> Result<Self, ConfigError> {
        let quirks = Quirks::for_model(info.vendor, info.product);

        let mut config = Config {
            invert_x: quirks.contains(Quirks::HEATMAP_INVERT_X),
            invert_y: quirks.contains(Quirks::HEATMAP_INVERT_Y),
            ..Config::default()
        };

        'dirs: for dir in dirs {
            for path in conf_files(dir.as_ref()) {
                let file = parse(&path)?;

                let matches = file.device.as_ref().is_some_and(|device| {
                    device.vendor == u32::from(info.vendor)
                        && device.product == u32::from(info.product)
                });

                if !matches {
                    continue;
                }

                log::info!(target: "iptsd", "using device config {}", path.display());
                config.apply(&file.config);
                break 'dirs;
            }
        }

        if override_file.exists() {
            let file = parse(override_file)?;
            config.apply(&file.config);
        }

        Ok(config)
    }

    fn apply(&mut self, section: &ConfigSection) {
        if let Some(invert_x) = section.invert_x {
            self.invert_x = invert_x;
        }

        if let Some(invert_y) = section.invert_y {
            self.invert_y = invert_y;
        }

        if let Some(width) = section.width {
            self.width = Some(width);
        }

        if let Some(height) = section.height {
            self.height = Some(height);
        }

        if let Some(block_on_palm) = section.block_on_palm {
            self.block_on_palm = block_on_palm;
        }
    }
}

/// The `.conf` files in a directory, in name order. A missing directory is
/// simply empty.
fn conf_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "conf"))
        .collect();

    files.sort();
    files
}

fn parse(path: &Path) -> Result<ConfFile, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Unreadable { path: path.to_owned(), source })?;

    toml::from_str(&text)
        .map_err(|source| ConfigError::Malformed { path: path.to_owned(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(vendor: u16, product: u16) -> DeviceInfo {
        DeviceInfo { vendor, product, ..DeviceInfo::default() }
    }

    fn write_conf(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn matching_file_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        write_conf(
            dir.path(),
            "surface.conf",
            "[Device]\nVendor = 0x045E\nProduct = 0x0021\n\n\
             [Config]\nInvertX = true\nWidth = 260\nHeight = 173\n",
        );

        let config = Config::load_with_paths(
            &info(0x045e, 0x0021),
            &[dir.path()],
            Path::new("/nonexistent"),
        )
        .unwrap();

        assert!(config.invert_x);
        assert_eq!(config.width, Some(260));
        assert_eq!(config.height, Some(173));

        // The built-in Surface Book 2 quirk still applies.
        assert!(config.invert_y);
    }

    #[test]
    fn non_matching_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_conf(
            dir.path(),
            "other.conf",
            "[Device]\nVendor = 0x1111\nProduct = 0x2222\n\n[Config]\nBlockOnPalm = true\n",
        );

        let config = Config::load_with_paths(
            &info(0x045e, 0x0021),
            &[dir.path()],
            Path::new("/nonexistent"),
        )
        .unwrap();

        assert!(!config.block_on_palm);
    }

    #[test]
    fn override_file_wins_over_device_config() {
        let dir = tempfile::tempdir().unwrap();
        write_conf(
            dir.path(),
            "surface.conf",
            "[Device]\nVendor = 1\nProduct = 2\n\n[Config]\nInvertX = true\n",
        );

        let override_dir = tempfile::tempdir().unwrap();
        let override_file = override_dir.path().join("iptsd.conf");
        fs::write(&override_file, "[Config]\nInvertX = false\nBlockOnPalm = true\n").unwrap();

        let config =
            Config::load_with_paths(&info(1, 2), &[dir.path()], &override_file).unwrap();

        assert!(!config.invert_x);
        assert!(config.block_on_palm);
    }

    #[test]
    fn malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_conf(dir.path(), "broken.conf", "[Config\nInvertX = maybe\n");

        let result = Config::load_with_paths(
            &info(1, 2),
            &[dir.path()],
            Path::new("/nonexistent"),
        );

        assert!(matches!(result, Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn quirks_apply_without_any_file() {
        let config = Config::load_with_paths(
            &info(0x045e, 0x001f),
            &[] as &[&Path],
            Path::new("/nonexistent"),
        )
        .unwrap();

        assert!(config.invert_x);
        assert!(config.invert_y);
    }
}
