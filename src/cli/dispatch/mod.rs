use crate::cli::{
    actions::{config, setup, status, Action},
    commands::DEFAULT_LOCAL_URL,
    globals::GlobalArgs,
};
use crate::couch::{location::resolve_target, CouchClient};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use serde_json::Value;
use std::{path::PathBuf, time::Duration};
use tracing::info;

/// # Errors
/// Returns an error if required arguments are missing or the CouchDB URL is invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let mut globals = globals(matches)?;

    match matches.subcommand() {
        Some(("setup", sub_m)) => {
            globals.app_name = sub_m
                .get_one::<String>("app-name")
                .cloned()
                .context("missing required argument: --app-name")?;
            if let Some(system_user) = sub_m.get_one::<String>("system-user") {
                globals.system_user.clone_from(system_user);
            }
            if let Some(max_attempts) = sub_m.get_one::<u32>("max-attempts") {
                globals.max_attempts = *max_attempts;
            }
            if let Some(password) = sub_m.get_one::<String>("admin-password") {
                globals.set_admin_password(SecretString::from(password.clone()));
            }

            Ok(Action::Setup(setup::Args {
                globals,
                non_interactive: sub_m.get_flag("non-interactive"),
            }))
        }

        Some(("status", _)) => Ok(Action::Status(status::Args { globals })),

        Some(("config", sub_m)) => {
            let arg = |name: &str| {
                sub_m
                    .get_one::<String>(name)
                    .cloned()
                    .with_context(|| format!("missing required argument: {name}"))
            };
            let section = arg("section")?;
            let key = arg("key")?;
            // CouchDB stores every config value as a string.
            let value = Value::String(arg("value")?);

            Ok(Action::Config(config::Args {
                globals,
                section,
                key,
                value,
            }))
        }

        Some((name, _)) => Err(anyhow!("unknown subcommand: {name}")),
        None => Err(anyhow!("missing subcommand")),
    }
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let target = resolve_target(matches.get_one::<String>("couch-url").map(String::as_str));

    let couch_url = if let Some(url) = target.url {
        url
    } else {
        let local = matches
            .get_one::<String>("local-url")
            .map_or(DEFAULT_LOCAL_URL, String::as_str);
        info!("COUCH_URL not set, expecting a locally managed CouchDB at {local}");
        local.trim_end_matches('/').to_string()
    };

    let timeout = Duration::from_secs(matches.get_one::<u64>("timeout").copied().unwrap_or(10));
    let couch = CouchClient::new(crate::APP_USER_AGENT, &couch_url, timeout)
        .with_context(|| format!("invalid CouchDB URL: {couch_url}"))?;

    let data_path = matches
        .get_one::<String>("data-path")
        .map_or_else(|| PathBuf::from("data"), PathBuf::from);

    Ok(GlobalArgs::new(couch_url, couch, data_path))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;
    use serde_json::json;

    fn action(args: &[&str]) -> Action {
        temp_env::with_vars(
            [
                ("COUCH_URL", None::<&str>),
                ("COUCHBOOT_LOCAL_URL", None),
                ("COUCHBOOT_ADMIN_PASSWORD", None),
                ("COUCHBOOT_NON_INTERACTIVE", None),
                ("COUCHBOOT_DATA_PATH", None),
            ],
            || {
                let matches = commands::new().get_matches_from(args.iter().copied());
                handler(&matches).unwrap()
            },
        )
    }

    #[test]
    fn setup_with_external_url() {
        let Action::Setup(args) = action(&[
            "couchboot",
            "--couch-url",
            "http://example.com/",
            "setup",
            "--app-name",
            "demo",
            "--admin-password",
            "pw",
            "--max-attempts",
            "5",
        ]) else {
            panic!("expected setup action");
        };

        assert_eq!(args.globals.couch_url, "http://example.com");
        assert_eq!(args.globals.app_name, "demo");
        assert_eq!(args.globals.max_attempts, 5);
        assert_eq!(
            args.globals
                .admin_password
                .as_ref()
                .map(|p| p.expose_secret().to_string()),
            Some("pw".to_string())
        );
        assert!(!args.non_interactive);
    }

    #[test]
    fn status_falls_back_to_local_url() {
        let Action::Status(args) = action(&["couchboot", "status"]) else {
            panic!("expected status action");
        };

        assert_eq!(args.globals.couch_url, DEFAULT_LOCAL_URL);
        assert_eq!(args.globals.data_path, PathBuf::from("data"));
    }

    #[test]
    fn config_sends_values_as_strings() {
        let Action::Config(args) = action(&["couchboot", "config", "httpd", "port", "5985"]) else {
            panic!("expected config action");
        };
        assert_eq!(args.section, "httpd");
        assert_eq!(args.key, "port");
        assert_eq!(args.value, json!("5985"));
    }

    #[test]
    fn invalid_couch_url_is_rejected() {
        temp_env::with_vars([("COUCH_URL", Some("ftp://example.com"))], || {
            let matches = commands::new().get_matches_from(["couchboot", "status"]);
            assert!(handler(&matches).is_err());
        });
    }
}
