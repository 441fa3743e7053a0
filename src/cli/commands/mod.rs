use crate::cli::globals::DEFAULT_SYSTEM_USER;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub const DEFAULT_LOCAL_URL: &str = "http://127.0.0.1:5984";

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::git_commit_hash()).into_boxed_str(),
    );

    Command::new("couchboot")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("couch-url")
                .long("couch-url")
                .help("Use an external CouchDB at this URL instead of the local instance")
                .env("COUCH_URL")
                .global(true),
        )
        .arg(
            Arg::new("local-url")
                .long("local-url")
                .help("Address of the locally managed CouchDB, used when no external URL is set")
                .default_value(DEFAULT_LOCAL_URL)
                .env("COUCHBOOT_LOCAL_URL")
                .global(true),
        )
        .arg(
            Arg::new("data-path")
                .short('d')
                .long("data-path")
                .help("Data directory holding the stored CouchDB credentials")
                .default_value("data")
                .env("COUCHBOOT_DATA_PATH")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Per-request timeout in seconds")
                .default_value("10")
                .env("COUCHBOOT_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("COUCHBOOT_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("setup")
                .about("Provision credentials, databases and the admin account")
                .arg(
                    Arg::new("app-name")
                        .short('n')
                        .long("app-name")
                        .help("Application name written into the app config document")
                        .default_value("app")
                        .env("COUCHBOOT_APP_NAME"),
                )
                .arg(
                    Arg::new("admin-password")
                        .long("admin-password")
                        .help("Password for the application admin account, skips the prompt")
                        .env("COUCHBOOT_ADMIN_PASSWORD")
                        .hide_env_values(true),
                )
                .arg(
                    Arg::new("system-user")
                        .long("system-user")
                        .help("Server admin created while CouchDB is in admin party")
                        .default_value(DEFAULT_SYSTEM_USER)
                        .env("COUCHBOOT_SYSTEM_USER"),
                )
                .arg(
                    Arg::new("max-attempts")
                        .long("max-attempts")
                        .help("How often to ask for new CouchDB credentials before giving up")
                        .default_value("3")
                        .env("COUCHBOOT_MAX_ATTEMPTS")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help("Never prompt; use the fallback admin identity")
                        .env("COUCHBOOT_NON_INTERACTIVE")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Report admin party status and whether the stored credentials work"),
        )
        .subcommand(
            Command::new("config")
                .about("Set a CouchDB configuration value")
                .arg(Arg::new("section").help("Config section").required(true))
                .arg(Arg::new("key").help("Config key").required(true))
                .arg(
                    Arg::new("value")
                        .help("New value")
                        .required(true),
                ),
        )
}
