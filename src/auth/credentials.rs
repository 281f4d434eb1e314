//! Credential management for the OOI API
//!
//! This module handles secure storage, retrieval, and validation of the OOI
//! API username and token. Credentials are stored in .env files with
//! appropriate security permissions and are only ever passed to HTTP basic
//! authentication.

use std::env;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// Default location of the credentials file
pub const DOTENV_FILE: &str = ".env";

/// OOI API username and token
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    token: String,
}

impl Credentials {
    /// Validate and build credentials
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::EmptyToken`.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> AuthResult<Self> {
        let username = username.into().trim().to_string();
        let token = token.into().trim().to_string();

        validate_username(&username)?;
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        Ok(Self { username, token })
    }

    /// Read credentials from `OOI_USERNAME` and `OOI_TOKEN`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if either variable is unset.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read credentials through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (lookup(env_constants::USERNAME), lookup(env_constants::TOKEN)) {
            (Some(username), Some(token)) => Self::new(username, token),
            _ => Err(AuthError::MissingCredentials),
        }
    }

    /// API token
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether username environment variable is set
    pub username_set: bool,
    /// Whether token environment variable is set
    pub token_set: bool,
    /// Whether .env file exists in current directory
    pub dotenv_file_exists: bool,
}

impl AuthStatus {
    /// Check if both credentials are available in environment
    pub fn has_credentials(&self) -> bool {
        self.username_set && self.token_set
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.username_set, self.token_set) {
            (true, true) => "Credentials configured".to_string(),
            (false, false) => "Missing credentials - run 'auth setup' to configure".to_string(),
            (true, false) => "Missing API token - run 'auth setup' to configure".to_string(),
            (false, true) => "Missing API username - run 'auth setup' to configure".to_string(),
        }
    }
}

/// Check current authentication status
pub fn get_auth_status() -> AuthStatus {
    AuthStatus {
        username_set: env::var(env_constants::USERNAME).is_ok(),
        token_set: env::var(env_constants::TOKEN).is_ok(),
        dotenv_file_exists: Path::new(DOTENV_FILE).exists(),
    }
}

/// Check if credentials exist in environment variables
pub fn check_credentials() -> bool {
    get_auth_status().has_credentials()
}

/// Load credentials for sending data requests
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` with setup instructions if the
/// environment does not hold both values.
pub fn load_credentials() -> AuthResult<Credentials> {
    let credentials = Credentials::from_env()?;
    tracing::debug!("Loaded OOI credentials for {}", credentials.username);
    Ok(credentials)
}

/// Prompt user for credentials interactively
pub fn prompt_credentials() -> AuthResult<Credentials> {
    print!("OOI API Username: ");
    io::stdout().flush().map_err(AuthError::CredentialStorage)?;

    let mut username = String::new();
    io::stdin()
        .read_line(&mut username)
        .map_err(AuthError::CredentialStorage)?;

    let token = rpassword::prompt_password("OOI API Token: ")
        .map_err(|e| AuthError::CredentialStorage(io::Error::new(io::ErrorKind::Other, e)))?;

    Credentials::new(username, token)
}

/// Validate username format
fn validate_username(username: &str) -> AuthResult<()> {
    if username.is_empty() {
        return Err(AuthError::InvalidUsername {
            reason: "Username cannot be empty".to_string(),
        });
    }

    if username.len() < auth::MIN_USERNAME_LENGTH || username.len() > auth::MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername {
            reason: format!(
                "Username must be {} to {} characters",
                auth::MIN_USERNAME_LENGTH,
                auth::MAX_USERNAME_LENGTH
            ),
        });
    }

    // API usernames look like OOIAPI-XXXXXXXXXXXXXX
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_' || c == '@')
    {
        return Err(AuthError::InvalidUsername {
            reason: "Username should be alphanumeric with optional dots, hyphens, underscores or @"
                .to_string(),
        });
    }

    Ok(())
}

/// Read the lines of an existing .env file, dropping credential entries
fn read_other_lines(env_path: &Path) -> AuthResult<Vec<String>> {
    let mut lines = Vec::new();
    if !env_path.exists() {
        return Ok(lines);
    }

    let reader = BufReader::new(File::open(env_path)?);
    let username_key = format!("{}=", env_constants::USERNAME);
    let token_key = format!("{}=", env_constants::TOKEN);

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.starts_with(&username_key) && !trimmed.starts_with(&token_key) {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Write lines to a .env file with owner-only permissions
fn write_env_file(env_path: &Path, lines: &[String]) -> AuthResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(env_path)?;

    for line in lines {
        writeln!(file, "{}", line)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(auth::ENV_FILE_PERMISSIONS);
        file.set_permissions(perms)?;
    }

    Ok(())
}

/// Save credentials to a .env file, keeping its other entries
pub fn save_credentials_to(env_path: &Path, credentials: &Credentials) -> AuthResult<()> {
    let mut lines = read_other_lines(env_path)?;
    lines.push(format!("{}={}", env_constants::USERNAME, credentials.username));
    lines.push(format!("{}={}", env_constants::TOKEN, credentials.token()));
    write_env_file(env_path, &lines)
}

/// Save credentials to the .env file in the current directory
pub fn save_credentials(credentials: &Credentials) -> AuthResult<()> {
    save_credentials_to(Path::new(DOTENV_FILE), credentials)?;

    env::set_var(env_constants::USERNAME, &credentials.username);
    env::set_var(env_constants::TOKEN, credentials.token());

    println!("Credentials saved to {} file", DOTENV_FILE);

    #[cfg(unix)]
    println!("File permissions set to owner-only (600)");

    #[cfg(not(unix))]
    println!(
        "Warning: File permissions not set (non-Unix system). Please ensure .env file is protected."
    );

    Ok(())
}

/// Remove credential entries from a .env file
///
/// Returns whether the file existed.
pub fn clear_credentials_from(env_path: &Path) -> AuthResult<bool> {
    if !env_path.exists() {
        return Ok(false);
    }
    let lines = read_other_lines(env_path)?;
    write_env_file(env_path, &lines)?;
    Ok(true)
}

/// Remove credentials from the current directory's .env file and environment
pub fn clear_credentials() -> AuthResult<()> {
    if clear_credentials_from(Path::new(DOTENV_FILE))? {
        println!("Removed OOI credentials from {}", DOTENV_FILE);
    } else {
        println!("No {} file found", DOTENV_FILE);
    }

    env::remove_var(env_constants::USERNAME);
    env::remove_var(env_constants::TOKEN);
    Ok(())
}

/// Ask a yes/no question on stdin
fn confirm(question: &str) -> AuthResult<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush().map_err(AuthError::CredentialStorage)?;

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .map_err(AuthError::CredentialStorage)?;
    Ok(response.trim().to_lowercase().starts_with('y'))
}

/// Interactive credential setup workflow
pub fn setup_credentials() -> AuthResult<()> {
    println!("OOI API Authentication Setup");
    println!("============================");
    println!();
    println!("Your API username and token are listed under your user profile on ooinet.");
    println!("They will be stored in a .env file in the current directory.");
    println!();

    if check_credentials() {
        println!("Warning: Credentials are already configured.");
        if !confirm("Do you want to update them?")? {
            println!("Setup cancelled.");
            return Ok(());
        }
        println!();
    }

    let credentials = prompt_credentials()?;

    println!();
    save_credentials(&credentials)?;

    println!();
    println!("Setup complete! You can now send data requests.");
    Ok(())
}

/// Show current authentication status
pub fn show_auth_status() {
    let status = get_auth_status();

    println!("OOI API Authentication Status");
    println!("=============================");
    println!();

    match env::var(env_constants::USERNAME) {
        Ok(username) => println!("Username: {} (set)", username),
        Err(_) => println!("Username: Not set"),
    }
    println!(
        "Token: {}",
        if status.token_set { "Set" } else { "Not set" }
    );
    println!(
        ".env file: {}",
        if status.dotenv_file_exists {
            "Exists"
        } else {
            "Not found"
        }
    );

    println!();
    println!("Status: {}", status.status_message());

    if !status.has_credentials() {
        println!();
        println!("To configure credentials, run: ooi_requests auth setup");
    }
}
