use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

pub const CONFIG_ENV_VAR: &str =
  "PROMOCAL_CONFIG";
const CONFIG_DIR_NAME: &str = "promocal";
const CONFIG_FILE_NAME: &str =
  "config.toml";

fn default_data_location() -> String {
  "~/.promocal".to_string()
}

fn default_true() -> bool {
  true
}

fn default_max_inline_badges() -> usize
{
  3
}

fn default_cell_width() -> usize {
  14
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub timezone:     Option<String>,
  #[serde(default)]
  pub data:         DataSection,
  #[serde(default)]
  pub display:      DisplaySection,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
  #[serde(default = "default_data_location")]
  pub location: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplaySection {
  #[serde(default = "default_true")]
  pub color:             bool,
  #[serde(
    default = "default_max_inline_badges"
  )]
  pub max_inline_badges: usize,
  #[serde(default = "default_cell_width")]
  pub cell_width:        usize
}

impl Default for DataSection {
  fn default() -> Self {
    Self {
      location: default_data_location()
    }
  }
}

impl Default for DisplaySection {
  fn default() -> Self {
    Self {
      color:             default_true(),
      max_inline_badges:
        default_max_inline_badges(),
      cell_width:        default_cell_width()
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      timezone:     None,
      data:         DataSection::default(),
      display:      DisplaySection::default(
      ),
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) = resolve_config_path(
      config_override
    )?
    else {
      warn!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let mut cfg = Self::load_file(&path)?;
    cfg.sanitize();
    Ok(cfg)
  }

  #[tracing::instrument]
  fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    Self::from_toml_str(&text)
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })
      .map(|mut cfg| {
        cfg
          .loaded_files
          .push(path.to_path_buf());
        cfg
      })
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Self =
      toml::from_str(text)?;
    cfg.sanitize();
    Ok(cfg)
  }

  /// Repairs values that would leave the
  /// renderer nothing to draw.
  pub fn sanitize(&mut self) {
    if self
      .timezone
      .as_deref()
      .is_some_and(|tz| {
        tz.trim().is_empty()
      })
    {
      self.timezone = None;
    }

    if self.data.location.trim().is_empty()
    {
      self.data.location =
        default_data_location();
    }

    if self.display.max_inline_badges == 0
    {
      self.display.max_inline_badges =
        default_max_inline_badges();
    }

    if self.display.cell_width < 6 {
      debug!(
        cell_width =
          self.display.cell_width,
        "cell width too narrow; \
         raising to 6"
      );
      self.display.cell_width = 6;
    }
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k.trim();
      let value = v.trim();
      debug!(key = %key, value = %value, "applying override");
      match key {
        | "timezone" => {
          self.timezone =
            Some(value.to_string());
        }
        | "data.location" => {
          self.data.location =
            value.to_string();
        }
        | "display.color" => {
          self.display.color =
            parse_bool(value);
        }
        | "display.max_inline_badges" => {
          self.display.max_inline_badges =
            value.parse().with_context(
              || {
                format!(
                  "invalid badge limit: \
                   {value}"
                )
              }
            )?;
        }
        | "display.cell_width" => {
          self.display.cell_width = value
            .parse()
            .with_context(|| {
              format!(
                "invalid cell width: \
                 {value}"
              )
            })?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: {other}"
          ));
        }
      }
    }

    self.sanitize();
    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else {
    expand_tilde(Path::new(
      &cfg.data.location
    ))
  };

  if !dir.exists() {
    return Err(anyhow!(
      "data directory {} does not \
       exist",
      dir.display()
    ));
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(expand_tilde(path)));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if trimmed == "/dev/null" {
      return Ok(None);
    }
    if !trimmed.is_empty() {
      return Ok(Some(expand_tilde(
        Path::new(trimmed)
      )));
    }
  }

  let Some(config_dir) = dirs::config_dir()
  else {
    debug!(
      "cannot determine config \
       directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::Config;

  #[test]
  fn parses_full_config() {
    let cfg = Config::from_toml_str(
      r#"
timezone = "Europe/Madrid"

[data]
location = "/srv/promocal"

[display]
color = false
max_inline_badges = 5
cell_width = 18
"#
    )
    .expect("parse config");

    assert_eq!(
      cfg.timezone.as_deref(),
      Some("Europe/Madrid")
    );
    assert_eq!(
      cfg.data.location,
      "/srv/promocal"
    );
    assert!(!cfg.display.color);
    assert_eq!(
      cfg.display.max_inline_badges,
      5
    );
    assert_eq!(
      cfg.display.cell_width,
      18
    );
  }

  #[test]
  fn missing_sections_use_defaults() {
    let cfg = Config::from_toml_str("")
      .expect("parse empty config");
    assert!(cfg.timezone.is_none());
    assert!(cfg.display.color);
    assert_eq!(
      cfg.display.max_inline_badges,
      3
    );
  }

  #[test]
  fn sanitize_restores_zero_values() {
    let cfg = Config::from_toml_str(
      r#"
timezone = "  "

[data]
location = ""

[display]
max_inline_badges = 0
cell_width = 2
"#
    )
    .expect("parse config");

    assert!(cfg.timezone.is_none());
    assert_eq!(
      cfg.data.location,
      "~/.promocal"
    );
    assert_eq!(
      cfg.display.max_inline_badges,
      3
    );
    assert_eq!(cfg.display.cell_width, 6);
  }

  #[test]
  fn overrides_apply_known_keys() {
    let mut cfg = Config::default();
    cfg
      .apply_overrides(vec![
        (
          "display.color".to_string(),
          "off".to_string()
        ),
        (
          "display.max_inline_badges"
            .to_string(),
          "7".to_string()
        ),
        (
          "timezone".to_string(),
          "Asia/Tokyo".to_string()
        ),
      ])
      .expect("apply overrides");

    assert!(!cfg.display.color);
    assert_eq!(
      cfg.display.max_inline_badges,
      7
    );
    assert_eq!(
      cfg.timezone.as_deref(),
      Some("Asia/Tokyo")
    );
  }

  #[test]
  fn overrides_reject_unknown_keys() {
    let mut cfg = Config::default();
    let err = cfg
      .apply_overrides(vec![(
        "display.font".to_string(),
        "mono".to_string()
      )])
      .expect_err("unknown key");
    assert!(
      err
        .to_string()
        .contains("display.font")
    );
  }

  #[test]
  fn load_reads_explicit_path() {
    let temp =
      tempdir().expect("tempdir");
    let path =
      temp.path().join("config.toml");
    fs::write(
      &path,
      "[display]\ncell_width = 20\n"
    )
    .expect("write config");

    let cfg = Config::load(Some(&path))
      .expect("load config");
    assert_eq!(
      cfg.display.cell_width,
      20
    );
    assert_eq!(
      cfg.loaded_files,
      vec![path]
    );
  }
}
