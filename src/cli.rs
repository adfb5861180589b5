//! Command-line surface.
//!
//! The flags follow the conventions of the Go `flag` package: `-Hi`, `-Ho`,
//! `-e`, `-h`, `-k`, `-v`, each also accepted with two dashes, switches
//! taking an optional `=bool`, and option parsing stopping at the first
//! positional argument. [`normalize_args`] rewrites those spellings into
//! what clap expects.

use std::ffi::OsString;

use clap::{ArgAction, CommandFactory, Parser};

use crate::askpass::DEFAULT_ASKPASS;
use crate::config::{parse_derivation_path, CipherConfig, DEFAULT_KEY};
use crate::device::DEFAULT_BRIDGE_URL;
use crate::error::Result;
use crate::types::PassphrasePolicy;

#[derive(Debug, Parser)]
#[command(
    name = "trezor-cipher",
    version,
    about = "Encrypt or decrypt a value with a key held on a Trezor device",
    disable_help_flag = true,
    args_override_self = true
)]
pub struct Cli {
    /// HEX encoded input
    #[arg(long = "Hi")]
    pub hex_input: bool,

    /// HEX encoded output
    #[arg(long = "Ho")]
    pub hex_output: bool,

    /// Encrypt value (default decrypt)
    #[arg(short = 'e')]
    pub encrypt: bool,

    /// Show help message
    #[arg(short = 'h')]
    pub help: bool,

    /// Sets TREZOR encryption/decryption key
    #[arg(short = 'k', default_value = DEFAULT_KEY, allow_hyphen_values = true)]
    pub key: String,

    /// Value to encrypt (default TREZOR_CIPHER_VALUE variable), "-" reads stdin
    #[arg(short = 'v', allow_hyphen_values = true)]
    pub value: Option<String>,

    /// BIP-32 path sent with the cipher request, e.g. m/10016'/0
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Talk to the device over the debug link
    #[arg(long)]
    pub debug_link: bool,

    /// PIN/passphrase helper program [env: TREZOR_ASKPASS] [default: trezor-askpass]
    #[arg(long, value_name = "PROGRAM")]
    pub askpass: Option<String>,

    /// What to do when the passphrase helper fails
    #[arg(long, value_enum, default_value_t = PassphrasePolicy::Fatal)]
    pub passphrase_failure: PassphrasePolicy,

    /// Trezor Bridge URL [env: TREZOR_BRIDGE_URL] [default: http://127.0.0.1:21325]
    #[arg(long, value_name = "URL")]
    pub bridge_url: Option<String>,

    /// Set logging filter (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Arguments after the last option; accepted and ignored
    #[arg(hide = true)]
    pub rest: Vec<OsString>,
}

impl Cli {
    /// Build the run configuration, applying environment fallbacks where
    /// the command line is silent.
    ///
    /// # Errors
    /// * [`crate::Error::InvalidPath`] - If `--path` does not parse
    pub fn into_config(self) -> Result<CipherConfig> {
        let address_n = match self.path.as_deref() {
            Some(path) => parse_derivation_path(path)?,
            None => Vec::new(),
        };

        let mut config = CipherConfig {
            key: self.key,
            value: self.value,
            encrypt: self.encrypt,
            hex_input: self.hex_input,
            hex_output: self.hex_output,
            address_n,
            debug_link: self.debug_link,
            passphrase_policy: self.passphrase_failure,
            ..CipherConfig::default()
        }
        .with_environment();

        if let Some(program) = self.askpass {
            config.askpass_program = program;
        }
        if let Some(url) = self.bridge_url {
            config.bridge_url = url;
        }
        Ok(config)
    }
}

/// Rendered usage text.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

/// Rewrite Go `flag` package conventions into what clap expects.
///
/// * Any option may be spelled with one or two dashes (`-Hi`, `--e`,
///   `-path`); the rewritten form is the one clap declares.
/// * Switches take an optional `=bool` (`-e=false`, `-Hi=1`); the last
///   occurrence wins and only switches that end up on are passed to clap.
///   A value Go would not parse as a bool is left in place for clap to
///   reject.
/// * Parsing stops at `--`, a lone `-`, or the first argument that is not
///   an option. Everything from there on is handed over after a `--` so
///   it lands in [`Cli::rest`].
/// * Unknown options pass through untouched.
pub fn normalize_args<I, A>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = A>,
    A: Into<OsString>,
{
    let command = Cli::command();
    let mut args = args.into_iter().map(Into::into);

    let mut out: Vec<OsString> = args.next().into_iter().collect();
    let mut switches: Vec<(String, bool)> = Vec::new();
    let mut rest: Vec<OsString> = Vec::new();
    let mut expects_value = false;

    while let Some(arg) = args.next() {
        if expects_value {
            expects_value = false;
            out.push(arg);
            continue;
        }
        let text = match arg.to_str().map(str::to_string) {
            Some(text) if text == "--" => {
                rest.extend(args.by_ref());
                break;
            }
            Some(text) if text.len() > 1 && text.starts_with('-') => text,
            _ => {
                rest.push(arg);
                rest.extend(args.by_ref());
                break;
            }
        };

        let bare = text.strip_prefix("--").unwrap_or(&text[1..]);
        let (name, inline) = match bare.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (bare, None),
        };
        let Some(option) = lookup_option(&command, name) else {
            out.push(arg);
            continue;
        };

        if option.switch {
            let on = match inline {
                None => true,
                Some(value) => match parse_go_bool(value) {
                    Some(on) => on,
                    None => {
                        out.push(arg);
                        continue;
                    }
                },
            };
            switches.retain(|(flag, _)| *flag != option.flag);
            switches.push((option.flag, on));
            continue;
        }

        match inline {
            Some(value) => out.push(OsString::from(format!("{}={}", option.flag, value))),
            None => {
                expects_value = option.takes_value;
                out.push(OsString::from(option.flag));
            }
        }
    }

    out.extend(
        switches
            .into_iter()
            .filter(|(_, on)| *on)
            .map(|(flag, _)| OsString::from(flag)),
    );
    if !rest.is_empty() {
        out.push(OsString::from("--"));
        out.extend(rest);
    }
    out
}

struct OptionSpelling {
    flag: String,
    switch: bool,
    takes_value: bool,
}

/// Find the declared option `name` refers to, by long name first.
fn lookup_option(command: &clap::Command, name: &str) -> Option<OptionSpelling> {
    let mut chars = name.chars();
    let short = match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    };
    command.get_arguments().find_map(|arg| {
        let flag = if arg.get_long() == Some(name) {
            format!("--{}", name)
        } else if short.is_some() && arg.get_short() == short {
            format!("-{}", name)
        } else {
            return None;
        };
        Some(OptionSpelling {
            flag,
            switch: matches!(arg.get_action(), ArgAction::SetTrue),
            takes_value: arg.get_action().takes_values(),
        })
    })
}

/// Booleans as Go's `strconv.ParseBool` accepts them.
fn parse_go_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
