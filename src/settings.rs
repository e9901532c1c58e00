use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;

use crate::outside::{FFMPEG, YT_DLP};

/// Prefix of the environment variables overriding the settings, e.g. `BCDL_OUT_DIR`
const ENV_PREFIX: &str = "BCDL";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Where the downloaded files are written
    pub out_dir: PathBuf,
    /// The extractor program
    pub yt_dlp: String,
    /// The transcoder program
    pub ffmpeg: String,
}

impl Settings {
    /// Layer the defaults, the optional file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_from(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(file: Option<&Path>, env: Environment) -> Result<Self> {
        let out_dir = default_out_dir()?;

        let mut builder = Config::builder()
            .set_default("out_dir", out_dir.to_string_lossy().into_owned())
            .into_diagnostic()?
            .set_default("yt_dlp", YT_DLP)
            .into_diagnostic()?
            .set_default("ffmpeg", FFMPEG)
            .into_diagnostic()?;

        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(true));
        }

        builder
            .add_source(env)
            .build()
            .into_diagnostic()
            .wrap_err("Could not load the settings")?
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Invalid settings")
    }
}

/// `downloads` next to the executable
fn default_out_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .into_diagnostic()
        .wrap_err("Could not locate the executable")?;

    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
        .join("downloads"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// The prefixed environment, made of `vars` instead of the process environment
    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(vars))
    }

    #[test]
    fn defaults() {
        let settings = Settings::load_from(None, env(&[])).unwrap();
        assert!(settings.out_dir.ends_with("downloads"));
        assert!(!settings.yt_dlp.is_empty());
        assert!(!settings.ffmpeg.is_empty());
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"out_dir = "/srv/media""#).unwrap();
        writeln!(file, r#"yt_dlp = "/opt/bin/yt-dlp""#).unwrap();
        file.flush().unwrap();

        let settings = Settings::load_from(Some(file.path()), env(&[])).unwrap();
        assert_eq!(settings.out_dir, PathBuf::from("/srv/media"));
        assert_eq!(settings.yt_dlp, "/opt/bin/yt-dlp");
        assert_eq!(settings.ffmpeg, FFMPEG);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load_from(Some(&dir.path().join("nope.toml")), env(&[])).is_err());
    }

    #[test]
    fn environment_overrides_the_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"out_dir = "/srv/media""#).unwrap();
        writeln!(file, r#"ffmpeg = "/opt/bin/ffmpeg""#).unwrap();
        file.flush().unwrap();

        let vars = [("BCDL_OUT_DIR", "/tmp/bcdl"), ("OTHER_FFMPEG", "ignored")];
        let settings = Settings::load_from(Some(file.path()), env(&vars)).unwrap();
        assert_eq!(settings.out_dir, PathBuf::from("/tmp/bcdl"));
        assert_eq!(settings.ffmpeg, "/opt/bin/ffmpeg");
        assert_eq!(settings.yt_dlp, YT_DLP);
    }
}
