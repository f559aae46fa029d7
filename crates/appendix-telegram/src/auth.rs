//! Session bootstrap and interactive login.
//!
//! Sessions are file-backed so a code/2FA login is only needed once.

use std::{
    io::{self, BufRead, Write},
    path::Path,
};

use grammers_client::{Client, Config as ClientConfig, InitParams, SignInError};
use grammers_session::Session;

use appendix_core::{config::Config, Error, Result};

/// Connect to Telegram with the configured credentials and stored session.
pub async fn connect(cfg: &Config) -> Result<Client> {
    let session = Session::load_file_or_create(&cfg.session_file)?;

    let client = Client::connect(ClientConfig {
        session,
        api_id: cfg.api_id,
        api_hash: cfg.api_hash.clone(),
        params: InitParams::default(),
    })
    .await
    .map_err(|e| Error::External(format!("telegram connect failed: {e}")))?;

    Ok(client)
}

/// Run the interactive phone/code/2FA login if the session is not authorized
/// yet, then persist the session for future runs.
pub async fn ensure_authorized(client: &Client, session_file: &Path) -> Result<()> {
    let authorized = client
        .is_authorized()
        .await
        .map_err(|e| Error::External(format!("telegram error: {e}")))?;
    if authorized {
        return Ok(());
    }

    let phone = prompt("Phone number: ")?;
    let token = client
        .request_login_code(&phone)
        .await
        .map_err(|e| Error::Auth(format!("failed to request login code: {e}")))?;

    let code = prompt("Code: ")?;
    match client.sign_in(&token, &code).await {
        Ok(_) => {}
        Err(SignInError::PasswordRequired(password_token)) => {
            let password = prompt("2FA password: ")?;
            client
                .check_password(password_token, password)
                .await
                .map_err(|e| Error::Auth(format!("2FA password check failed: {e}")))?;
        }
        Err(e) => return Err(Error::Auth(format!("sign in failed: {e}"))),
    }

    client.session().save_to_file(session_file)?;
    Ok(())
}

/// Print a label and read one trimmed line from stdin.
pub fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(label.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
