//! Authentication management for OOI API credentials
//!
//! This module provides functions for managing the OOI API username and
//! token, including interactive setup and secure storage in .env files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ooi_requests::auth::{check_credentials, load_credentials, setup_credentials};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! if !check_credentials() {
//!     println!("Setting up credentials...");
//!     setup_credentials()?;
//! }
//! let credentials = load_credentials()?;
//! println!("Sending requests as {}", credentials.username);
//! # Ok(())
//! # }
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{
    check_credentials, clear_credentials, clear_credentials_from, get_auth_status,
    load_credentials, prompt_credentials, save_credentials, save_credentials_to,
    setup_credentials, show_auth_status, AuthStatus, Credentials, DOTENV_FILE,
};
