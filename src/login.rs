use crate::error::{Result, TrackerError};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{2,31}$").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// File holding every registered account, relative to the data directory
pub const USERS_FILE: &str = "users.json";

/// User data structure representing a registered application user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    /// Username (unique identifier for the user)
    pub username: String,

    /// Email address
    pub email: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,
}

/// Credential data for login and registration
///
/// Used to receive login and registration bodies from the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Username for login/registration
    #[serde(default)]
    pub username: String,

    /// Email address (ignored for login, required for registration)
    #[serde(default)]
    pub email: String,

    /// Password in plaintext (only transmitted, never stored)
    #[serde(default)]
    pub password: String,
}

/// Registered accounts, persisted as a JSON map in `<root>/users.json`
///
/// Registration takes a lock for its read-modify-write of the users file.
pub struct UserDirectory {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl UserDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        UserDirectory {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn users_path(&self) -> PathBuf {
        self.root.join(USERS_FILE)
    }

    /// Create the data directory and an empty users file if they don't exist
    ///
    /// This should be called before any other account operation.
    ///
    /// # Examples
    /// ```
    /// use gym_tracker::login::UserDirectory;
    ///
    /// let dir = std::env::temp_dir().join("gym_tracker_doc_users");
    /// let users = UserDirectory::new(&dir);
    /// users.init().unwrap();
    /// assert!(dir.join("users.json").exists());
    /// ```
    pub fn init(&self) -> Result<()> {
        if !self.root.exists() {
            create_dir_all(&self.root)?;
        }

        let users_path = self.users_path();
        if !users_path.exists() {
            let mut file = File::create(users_path)?;
            file.write_all(b"{}")?;
        }

        Ok(())
    }

    /// Get all registered users, keyed by username
    ///
    /// # Errors
    /// * Returns an error if the users file cannot be read or parsed
    pub fn get_users(&self) -> Result<HashMap<String, User>> {
        let contents = fs::read_to_string(self.users_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the users map to disk
    pub fn save_users(&self, users: &HashMap<String, User>) -> Result<()> {
        let json = serde_json::to_string_pretty(users)?;
        fs::write(self.users_path(), json)?;
        Ok(())
    }

    /// Register a new user
    ///
    /// The password is hashed with Argon2 before storage.
    ///
    /// # Errors
    /// * `Validation` if any field is empty, or the username or email is malformed
    /// * `Conflict` if the username or email is already registered
    pub fn register_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(TrackerError::Validation(
                "Username, email and password cannot be empty".to_string(),
            ));
        }
        if !USERNAME_REGEX.is_match(username) {
            return Err(TrackerError::Validation(
                "Username must be 3-32 letters, digits, '_', '.' or '-'".to_string(),
            ));
        }
        if !EMAIL_REGEX.is_match(email) {
            return Err(TrackerError::Validation(
                "Email address is not valid".to_string(),
            ));
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| TrackerError::Internal("user directory lock poisoned".to_string()))?;

        let mut users = self.get_users()?;
        // Usernames name directories, which may be case-insensitive on disk
        if users.keys().any(|name| name.eq_ignore_ascii_case(username)) {
            return Err(TrackerError::Conflict("Username already exists".to_string()));
        }
        if users.values().any(|user| user.email.eq_ignore_ascii_case(email)) {
            return Err(TrackerError::Conflict(
                "Email address is already registered".to_string(),
            ));
        }

        let user = User {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
        };

        users.insert(username.to_string(), user.clone());
        self.save_users(&users)?;

        log::info!("registered user {}", username);
        Ok(user)
    }

    /// Check whether the username and password match a registered user
    ///
    /// Unknown usernames are reported as `Ok(false)`, same as a wrong password.
    pub fn verify_user(&self, username: &str, password: &str) -> Result<bool> {
        let users = self.get_users()?;

        match users.get(username) {
            Some(user) => verify_password(password, &user.password_hash),
            None => Ok(false),
        }
    }

    /// Data directory this account store lives in
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Hash a password using Argon2id with a random salt
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err(TrackerError::Internal("Password hashing failed".to_string())),
    }
}

/// Verify a plaintext password against a stored Argon2 hash
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => {
            return Err(TrackerError::Internal(
                "Invalid password hash format".to_string(),
            ));
        }
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> (tempfile::TempDir, UserDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let users = UserDirectory::new(dir.path().join("db"));
        users.init().unwrap();
        (dir, users)
    }

    #[test]
    fn init_creates_empty_users_file() {
        let (_dir, users) = directory();
        assert!(users.root().join(USERS_FILE).exists());
        assert!(users.get_users().unwrap().is_empty());
    }

    #[test]
    fn register_then_verify() {
        let (_dir, users) = directory();
        let user = users
            .register_user("alice", "alice@example.com", "hunter22")
            .unwrap();
        assert_ne!(user.password_hash, "hunter22");
        assert!(user.password_hash.starts_with("$argon2"));

        assert!(users.verify_user("alice", "hunter22").unwrap());
        assert!(!users.verify_user("alice", "wrong").unwrap());
        assert!(!users.verify_user("mallory", "hunter22").unwrap());
    }

    #[test]
    fn duplicates_conflict() {
        let (_dir, users) = directory();
        users.register_user("alice", "alice@example.com", "pw").unwrap();

        assert!(matches!(
            users.register_user("alice", "other@example.com", "pw"),
            Err(TrackerError::Conflict(_))
        ));
        assert!(matches!(
            users.register_user("alice2", "ALICE@example.com", "pw"),
            Err(TrackerError::Conflict(_))
        ));
    }

    #[test]
    fn usernames_differing_in_case_conflict() {
        let (_dir, users) = directory();
        users.register_user("alice", "alice@example.com", "pw").unwrap();

        assert!(matches!(
            users.register_user("Alice", "second@example.com", "pw"),
            Err(TrackerError::Conflict(_))
        ));
        assert_eq!(users.get_users().unwrap().len(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        let (_dir, users) = directory();
        for (name, email, password) in [
            ("", "a@b.c", "pw"),
            ("bob", "", "pw"),
            ("bob", "b@b.c", ""),
            ("../etc", "b@b.c", "pw"),
            (".hidden", "b@b.c", "pw"),
            ("bo", "b@b.c", "pw"),
            ("bob", "not-an-email", "pw"),
        ] {
            assert!(
                matches!(
                    users.register_user(name, email, password),
                    Err(TrackerError::Validation(_))
                ),
                "accepted {:?}",
                (name, email, password)
            );
        }
        assert!(users.get_users().unwrap().is_empty());
    }

    #[test]
    fn users_file_is_persisted() {
        let (_dir, users) = directory();
        users.register_user("carol", "carol@example.com", "pw").unwrap();

        let reopened = UserDirectory::new(users.root());
        assert!(reopened.get_users().unwrap().contains_key("carol"));
        assert!(reopened.verify_user("carol", "pw").unwrap());
    }
}
