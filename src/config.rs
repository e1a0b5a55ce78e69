//! Runtime configuration for the directory site.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

pub const DEFAULT_DB_PATH: &str = "data/asoa-roster.xlsx";
pub const DEFAULT_CONTACT_EMAIL: &str = "seabreezeowners@gmail.com";
pub const DEFAULT_UPDATE_FORM: &str = "https://forms.gle/usB89vY9sc5U6adG8";

/// Which audience the site is serving.
///
/// `Members` unlocks the login form, owner contact details and the member
/// export; everything else is the public directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    Public,
    Members,
}

impl AccessMode {
    /// Only the exact setting `members` turns on member access.
    pub fn from_setting(value: &str) -> Self {
        if value.trim() == "members" {
            AccessMode::Members
        } else {
            AccessMode::Public
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Public => "public",
            AccessMode::Members => "members",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// The roster workbook
    pub db_path: PathBuf,
    pub access_mode: AccessMode,
    pub bind: SocketAddr,
    /// Trust one hop of X-Forwarded-* headers.
    pub behind_proxy: bool,
    pub static_dir: PathBuf,
    pub contact_email: String,
    pub update_form_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            access_mode: AccessMode::Public,
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            behind_proxy: false,
            static_dir: PathBuf::from("static"),
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
            update_form_url: DEFAULT_UPDATE_FORM.to_string(),
        }
    }
}

/// Command line and environment settings for the web server.
#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Roster workbook to serve
    #[arg(long, env = "ASOA_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// "members" enables member-only content and features
    #[arg(long, env = "asoa_access_mode", default_value = "public")]
    pub access_mode: String,

    /// Address to listen on
    #[arg(long, env = "ASOA_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Honor X-Forwarded-Host/Proto/Prefix from a reverse proxy
    #[arg(long, env = "ASOA_BEHIND_PROXY")]
    pub behind_proxy: bool,

    /// Directory served under /static
    #[arg(long, env = "ASOA_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Association contact address shown on every page
    #[arg(long, env = "ASOA_CONTACT_EMAIL", default_value = DEFAULT_CONTACT_EMAIL)]
    pub contact_email: String,

    /// Where owners send roster corrections
    #[arg(long, env = "ASOA_UPDATE_FORM", default_value = DEFAULT_UPDATE_FORM)]
    pub update_form_url: String,
}

impl From<ServerArgs> for Config {
    fn from(args: ServerArgs) -> Self {
        Self {
            db_path: args.db_path,
            access_mode: AccessMode::from_setting(&args.access_mode),
            bind: args.bind,
            behind_proxy: args.behind_proxy,
            static_dir: args.static_dir,
            contact_email: args.contact_email,
            update_form_url: args.update_form_url,
        }
    }
}
