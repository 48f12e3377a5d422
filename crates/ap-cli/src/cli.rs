use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "accesspass")]
#[command(about = "Festival accommodation portal: sign in, upload your photo, get your entry pass", long_about = None)]
pub struct Cli {
    /// Config file (defaults to config.toml in the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logs for the application crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and start a session
    Login {
        #[command(subcommand)]
        method: LoginMethod,
    },
    /// Show the session and accommodation status
    Status,
    /// Submit the verification photo
    Upload(UploadArgs),
    /// Show the entry pass, generating it if needed
    Pass {
        /// Skip the settle delay before generating
        #[arg(long)]
        now: bool,
    },
    /// End the session
    Logout,
}

#[derive(Debug, Subcommand)]
pub enum LoginMethod {
    /// Federated sign-in with an ID token obtained from the identity provider
    Google {
        #[arg(long)]
        email: String,
        #[arg(long)]
        id_token: String,
    },
    /// Email one-time code (interactive)
    Otp {
        #[arg(long)]
        email: String,
        /// Solved bot-verification token; prompted for when omitted
        #[arg(long)]
        captcha_token: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Image file (JPEG, PNG or WebP)
    #[arg(long)]
    pub photo: Option<PathBuf>,

    /// Try the camera first, falling back to --photo
    #[arg(long)]
    pub camera: bool,

    /// Government ID type
    #[arg(long, default_value = "")]
    pub id_type: String,

    /// Government ID number
    #[arg(long, default_value = "")]
    pub id_number: String,
}
