//! gmirror - mirror a Gmail account into a local directory
//!
//! This is the main entry point for the gmirror command.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use mirror::{
    AccountSettings, CancelToken, ImapServer, MirrorLayout, SyncContext, is_cancelled,
    labels_overwrite_check, password_from_env, sync_all,
};
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;

mod cli;
mod prompt;

use cli::Cli;

/// Exit status after an interrupt (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_cancelled(&e) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut settings = AccountSettings::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable settings: {:#}", e);
        AccountSettings::default()
    });

    let username = match &cli.user {
        Some(user) => user.clone(),
        None => prompt::ask("Gmail user", settings.username.as_deref())?,
    };
    let password = match password_from_env() {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };
    let directory = match &cli.directory {
        Some(directory) => directory.clone(),
        None => {
            let default = match &settings.directory {
                Some(saved) => saved.clone(),
                None => prompt::default_directory(
                    &std::env::current_dir().context("Failed to get current directory")?,
                ),
            };
            PathBuf::from(prompt::ask("Directory", Some(&default.to_string_lossy()))?)
        }
    };

    let options = cli.options(&settings);
    let layout = MirrorLayout::new(&directory);

    if options.overwrite_labels && !confirm_overwrite(&layout, cli.yes)? {
        println!("Abort.");
        return Ok(());
    }

    settings.username = Some(username.clone());
    settings.directory = Some(directory);
    if cli.host.is_some() {
        settings.host = cli.host.clone();
    }
    if cli.port.is_some() {
        settings.port = cli.port;
    }
    if let Err(e) = settings.save() {
        warn!("Failed to save settings: {:#}", e);
    }

    let cancel = CancelToken::new();
    install_signal_handlers(&cancel)?;

    let account = cli.account(&username, &settings);
    info!(
        "Connecting to {}:{} as {}",
        account.host, account.port, account.username
    );
    let mut server = ImapServer::connect(&account, &password)?;

    let mut ctx = SyncContext::new(options, io::stdout(), cancel);
    let stats = sync_all(&mut server, &layout, &mut ctx)?;

    info!(
        "Mirrored {} mailboxes into {}: {} stored, {} linked",
        stats.passes().count(),
        layout.root().display(),
        stats.total_stored(),
        stats.total_linked()
    );
    Ok(())
}

/// Ask before wiping a labels/ directory that holds stored messages
///
/// Returns true when it is fine to go ahead.
fn confirm_overwrite(layout: &MirrorLayout, yes: bool) -> Result<bool> {
    let labels_dir = layout.labels_dir();
    let files = labels_overwrite_check(&labels_dir)?;
    if files.is_empty() {
        return Ok(true);
    }

    println!();
    println!(
        "WARNING: There are {} non-symlink files outside of labels/Trash.",
        files.len()
    );
    println!(
        "(Use 'find {} -type f' to see them)",
        labels_dir.display()
    );
    if yes {
        return Ok(true);
    }
    prompt::confirm("Still overwrite labels/ directory? (yes/no)")
}

/// The first SIGINT/SIGTERM cancels the run gracefully; a second one
/// terminates the process
fn install_signal_handlers(cancel: &CancelToken) -> Result<()> {
    for &signal in TERM_SIGNALS {
        flag::register_conditional_shutdown(signal, 1, cancel.flag())
            .context("Failed to register signal handler")?;
        flag::register(signal, cancel.flag()).context("Failed to register signal handler")?;
    }
    Ok(())
}
