//! Command-line configuration
//!
//! `a3s-lsp-filter [OPTIONS] <BINARY> <MODE> [PROVIDERS]... -- [ARGS]...`

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::filter::{FilterPolicy, Mode};
use crate::frame::MAX_FRAME_SIZE;

/// Separator between the proxy's own arguments and the server's
pub const ARGS_SEPARATOR: &str = "--";

const PROVIDERS_HELP: &str = "\
Providers are language server capabilities without the trailing \"Provider\":
    codeAction codeLens completion definition documentFormatting
    documentHighlight documentRangeFormatting documentLink documentSymbol
    hover implementation references rename signatureHelp typeDefinition
    workspaceSymbol

Examples:
  a3s-lsp-filter cquery disable completion codeAction --
  a3s-lsp-filter clangd enable completion codeAction -- --log=error";

/// A3S LSP Filter - hide language server capabilities from the editor
#[derive(Debug, Clone, Parser)]
#[command(name = "a3s-lsp-filter", version, about, after_help = PROVIDERS_HELP)]
pub struct Cli {
    /// Language server binary to launch
    pub binary: String,

    /// enable: allow only the listed providers; disable: allow all but the listed ones
    #[arg(value_enum)]
    pub mode: Mode,

    /// Provider base names (e.g. "completion", "hover")
    pub providers: Vec<String>,

    /// Arguments passed to the language server, after `--`
    #[arg(last = true)]
    pub args: Vec<OsString>,

    /// Largest message body decoded while intercepting, in bytes
    #[arg(long, default_value_t = MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

/// Validated proxy configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub binary: String,
    /// Server arguments, byte for byte as received
    pub args: Vec<OsString>,
    pub policy: FilterPolicy,
    /// Provider names as given, for diagnostics
    pub providers: Vec<String>,
    pub max_frame_size: usize,
}

impl Config {
    /// Parse the process arguments.
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::try_from_args(std::env::args_os())
    }

    /// Parse an argument vector whose first element is the program name.
    ///
    /// The `--` separator is required even when the server takes no
    /// arguments.
    pub fn try_from_args<I, S>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let cli = Cli::try_parse_from(&args)?;

        if !args.iter().skip(1).any(|a| a == ARGS_SEPARATOR) {
            return Err(Cli::command().error(
                ErrorKind::MissingRequiredArgument,
                format!(
                    "missing '{}' before the language server arguments",
                    ARGS_SEPARATOR
                ),
            ));
        }

        Ok(cli.into())
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            policy: FilterPolicy::new(cli.mode, cli.providers.iter().cloned()),
            binary: cli.binary,
            args: cli.args,
            providers: cli.providers,
            max_frame_size: cli.max_frame_size,
        }
    }
}
