use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::models::Owner;

pub(crate) const DEFAULT_TREND_MONTHS: usize = 6;
/// Upper bound for `--months` / `FINTRACK_TREND_MONTHS` (ten years).
pub(crate) const MAX_TREND_MONTHS: usize = 120;

/// Runtime settings, resolved as flag > environment > default.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) db_path: PathBuf,
    pub(crate) owner: Owner,
    pub(crate) trend_months: usize,
}

impl Config {
    /// Resolve settings from the process environment and strip the global
    /// flags from `args`, returning what is left for command dispatch.
    pub(crate) fn load(args: &[String]) -> Result<(Self, Vec<String>)> {
        Self::resolve(args, |key| std::env::var(key).ok(), default_db_path)
    }

    pub(crate) fn resolve(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
        default_db: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<(Self, Vec<String>)> {
        let mut rest = Vec::with_capacity(args.len());
        let mut db_flag = None;
        let mut user_flag = None;
        let mut months_flag = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let slot = match arg.as_str() {
                "--db" => &mut db_flag,
                "--user" => &mut user_flag,
                "--months" => &mut months_flag,
                _ => {
                    rest.push(arg.clone());
                    continue;
                }
            };
            let value = iter
                .next()
                .with_context(|| format!("Missing value for {arg}"))?;
            *slot = Some(value.clone());
        }

        let db_path = match db_flag.or_else(|| env("FINTRACK_DB")) {
            Some(p) => PathBuf::from(crate::run::shellexpand(&p)),
            None => default_db()?,
        };

        let user = user_flag
            .or_else(|| env("FINTRACK_USER"))
            .or_else(|| env("USER"))
            .or_else(|| env("USERNAME"))
            .unwrap_or_else(|| "default".into());
        let owner =
            Owner::new(user).ok_or_else(|| anyhow::anyhow!("User name must not be blank"))?;

        let trend_months = match months_flag.or_else(|| env("FINTRACK_TREND_MONTHS")) {
            Some(raw) => {
                let n: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid month count: {raw}"))?;
                if n == 0 {
                    anyhow::bail!("Month count must be at least 1");
                }
                if n > MAX_TREND_MONTHS {
                    anyhow::bail!("Month count must be at most {MAX_TREND_MONTHS} (got {n})");
                }
                n
            }
            None => DEFAULT_TREND_MONTHS,
        };

        Ok((
            Self {
                db_path,
                owner,
                trend_months,
            },
            rest,
        ))
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "fintrack", "FinTrack")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("fintrack.db"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn resolve(list: &[&str], env: &[(&str, &str)]) -> Result<(Config, Vec<String>)> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(
            &args(list),
            |key| env.get(key).cloned(),
            || Ok(PathBuf::from("/data/fintrack.db")),
        )
    }

    #[test]
    fn test_defaults() {
        let (cfg, rest) = resolve(&["fintrack", "summary"], &[]).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/data/fintrack.db"));
        assert_eq!(cfg.owner.as_str(), "default");
        assert_eq!(cfg.trend_months, DEFAULT_TREND_MONTHS);
        assert_eq!(rest, args(&["fintrack", "summary"]));
    }

    #[test]
    fn test_env_overrides_default() {
        let (cfg, _) = resolve(
            &["fintrack"],
            &[
                ("FINTRACK_DB", "/tmp/x.db"),
                ("USER", "shell-user"),
                ("FINTRACK_TREND_MONTHS", "12"),
            ],
        )
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.owner.as_str(), "shell-user");
        assert_eq!(cfg.trend_months, 12);
    }

    #[test]
    fn test_flags_override_env_and_are_stripped() {
        let (cfg, rest) = resolve(
            &["fintrack", "--user", "alice", "summary", "--months", "3", "2024-01"],
            &[("FINTRACK_USER", "bob"), ("FINTRACK_TREND_MONTHS", "12")],
        )
        .unwrap();
        assert_eq!(cfg.owner.as_str(), "alice");
        assert_eq!(cfg.trend_months, 3);
        assert_eq!(rest, args(&["fintrack", "summary", "2024-01"]));
    }

    #[test]
    fn test_fintrack_user_beats_shell_user() {
        let (cfg, _) = resolve(&["fintrack"], &[("FINTRACK_USER", "carol"), ("USER", "root")]).unwrap();
        assert_eq!(cfg.owner.as_str(), "carol");
    }

    #[test]
    fn test_missing_flag_value_is_an_error() {
        assert!(resolve(&["fintrack", "--user"], &[]).is_err());
    }

    #[test]
    fn test_invalid_month_count() {
        assert!(resolve(&["fintrack", "--months", "zero"], &[]).is_err());
        assert!(resolve(&["fintrack", "--months", "0"], &[]).is_err());
    }

    #[test]
    fn test_month_count_upper_bound() {
        let (cfg, _) = resolve(&["fintrack", "--months", "120"], &[]).unwrap();
        assert_eq!(cfg.trend_months, MAX_TREND_MONTHS);
        assert!(resolve(&["fintrack", "--months", "121"], &[]).is_err());
        assert!(resolve(&["fintrack", "--months", "2305843009213693951"], &[]).is_err());
        assert!(resolve(&["fintrack"], &[("FINTRACK_TREND_MONTHS", "100000")]).is_err());
    }

    #[test]
    fn test_blank_user_is_an_error() {
        assert!(resolve(&["fintrack", "--user", "  "], &[]).is_err());
    }
}
