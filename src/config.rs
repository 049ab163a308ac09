use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Flags that can be persisted as defaults in an rc file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub perf: bool,
    pub no_front_matter: bool,
    pub standalone: bool,
    pub image_base: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            perf: self.perf || other.perf,
            no_front_matter: self.no_front_matter || other.no_front_matter,
            standalone: self.standalone || other.standalone,
            image_base: other
                .image_base
                .clone()
                .or_else(|| self.image_base.clone()),
        }
    }
}

fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return Some(PathBuf::from(appdata).join("markview"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("markview"),
            );
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("markview"));
        }
        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home).join(".config").join("markview"));
        }
    }

    None
}

pub fn global_config_path() -> PathBuf {
    config_dir().map_or_else(local_override_path, |dir| dir.join("config"))
}

/// Where the recent-files list is kept.
pub fn recent_files_path() -> PathBuf {
    config_dir().map_or_else(
        || PathBuf::from(".markview-recent.json"),
        |dir| dir.join("recent.json"),
    )
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".markviewrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# markview defaults (saved with --save)".to_string()];
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if flags.no_front_matter {
        lines.push("--no-front-matter".to_string());
    }
    if flags.standalone {
        lines.push("--standalone".to_string());
    }
    if let Some(dir) = &flags.image_base {
        lines.push(format!("--image-base {}", dir.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick known flags out of a token list; everything else is ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--perf" {
            flags.perf = true;
        } else if token == "--no-front-matter" {
            flags.no_front_matter = true;
        } else if token == "--standalone" {
            flags.standalone = true;
        } else if token == "--image-base" {
            if let Some(next) = tokens.get(i + 1) {
                flags.image_base = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--image-base=") {
            flags.image_base = Some(PathBuf::from(value));
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "markview",
            "render",
            "--perf",
            "--no-front-matter",
            "--image-base",
            "assets",
            "--unknown",
            "README.md",
        ]));
        assert!(flags.perf);
        assert!(flags.no_front_matter);
        assert!(!flags.standalone);
        assert_eq!(flags.image_base, Some(PathBuf::from("assets")));
    }

    #[test]
    fn test_parse_flag_tokens_accepts_equals_form() {
        let flags = parse_flag_tokens(&tokens(&["--standalone", "--image-base=/srv/img"]));
        assert!(flags.standalone);
        assert_eq!(flags.image_base, Some(PathBuf::from("/srv/img")));
    }

    #[test]
    fn test_trailing_image_base_without_value_is_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--image-base"]));
        assert_eq!(flags.image_base, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            perf: true,
            image_base: Some(PathBuf::from("file-dir")),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            standalone: true,
            image_base: Some(PathBuf::from("cli-dir")),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.perf);
        assert!(merged.standalone);
        assert_eq!(merged.image_base, Some(PathBuf::from("cli-dir")));

        let kept = file.union(&ConfigFlags::default());
        assert_eq!(kept.image_base, Some(PathBuf::from("file-dir")));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".markviewrc");
        let flags = ConfigFlags {
            perf: true,
            no_front_matter: true,
            standalone: true,
            image_base: Some(PathBuf::from("images")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".markviewrc");
        fs::write(&path, "# --perf\n\n  --standalone  \n").unwrap();
        let flags = load_config_flags(&path).unwrap();
        assert!(!flags.perf);
        assert!(flags.standalone);
    }
}
