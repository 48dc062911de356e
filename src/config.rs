use std::{fs::File, io::Read, path::Path};

use anyhow::Context;
use serde::Deserialize;

use crate::{playback::PlaybackPolicy, watcher::WatchConfig};

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub playback: PlaybackPolicy,

    #[serde(flatten)]
    pub watch: WatchConfig,
}

impl Config {
    pub fn read(file: &mut impl Read) -> anyhow::Result<Self> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read config file")?;

        let config = toml::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn read_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut file = File::open(path).context("Failed to open config file")?;
        Self::read(&mut file)
    }
}
