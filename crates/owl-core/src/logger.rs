//! Day-file writer with idle-aware capture and AES key rotation.
//!
//! Each call to [`Logger::capture_and_append`] opens the current day's file
//! in append mode, writes one entry, and closes it again. In encrypted mode a
//! fresh AES key is RSA-wrapped and announced in a SymKey record whenever the
//! rotation rule says so:
//!
//! - no key has been announced yet by this logger,
//! - the active key was announced in a different file (day rollover), or
//! - the active key already covers `keyGenRate` entries.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, info};

use crate::config::OwlConfig;
use crate::crypto::{AsymKey, KeyType, SymKey};
use crate::entry::{snapshot, Capturer};
use crate::error::{OwlError, Result};
use crate::framing::{encode_record, write_version, RecordType};

/// Extension of plain day logs.
pub const PLAIN_LOG_SUFFIX: &str = ".json.log";

/// Extension of encrypted day logs.
pub const ENCRYPTED_LOG_SUFFIX: &str = ".json.log.enc";

/// File name for the log of `date`, e.g. `20240131.json.log.enc`.
pub fn day_file_name(date: NaiveDate, encrypted: bool) -> String {
    let suffix = if encrypted {
        ENCRYPTED_LOG_SUFFIX
    } else {
        PLAIN_LOG_SUFFIX
    };
    format!("{}{}", date.format("%Y%m%d"), suffix)
}

/// What a single capture wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub path: PathBuf,
    pub idle: bool,
    /// A SymKey record was written before the entry.
    pub rotated: bool,
}

struct ActiveKey {
    key: SymKey,
    file: PathBuf,
    entries: u32,
}

struct EncryptionState {
    public_key: AsymKey,
    key_gen_rate: u32,
    active: Option<ActiveKey>,
}

impl EncryptionState {
    fn rotation_due(&self, path: &Path) -> bool {
        match &self.active {
            None => true,
            Some(active) => active.file != path || active.entries >= self.key_gen_rate,
        }
    }
}

/// Writes captured entries into per-day log files.
pub struct Logger<C> {
    out_dir: PathBuf,
    idle_threshold: u64,
    encryption: Option<EncryptionState>,
    capturer: C,
}

impl<C: Capturer> Logger<C> {
    /// Create a logger for `config`, creating the output directory.
    ///
    /// With encryption enabled only the RSA public key is loaded.
    ///
    /// # Errors
    ///
    /// Fails if the output directory cannot be created, or if the public key
    /// cannot be loaded or does not validate.
    pub fn new(config: &OwlConfig, capturer: C) -> Result<Self> {
        std::fs::create_dir_all(&config.out_dir)?;

        let encryption = if config.encryption.enabled {
            let path = &config.encryption.rsa_public_key_path;
            let mut public_key = AsymKey::new();
            public_key.load_from_file(KeyType::Public, path, None)?;
            if !public_key.validate(KeyType::Public)? {
                return Err(OwlError::Crypto(format!(
                    "Public key {} failed validation",
                    path.display()
                )));
            }
            Some(EncryptionState {
                public_key,
                key_gen_rate: config.encryption.effective_key_gen_rate(),
                active: None,
            })
        } else {
            None
        };

        info!(
            out_dir = %config.out_dir.display(),
            encrypted = encryption.is_some(),
            "logger ready"
        );

        Ok(Self {
            out_dir: config.out_dir.clone(),
            idle_threshold: config.idle_threshold,
            encryption,
            capturer,
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Path of the log file that entries captured at `now` go to.
    pub fn day_file_path(&self, now: DateTime<Local>) -> PathBuf {
        self.out_dir
            .join(day_file_name(now.date_naive(), self.is_encrypted()))
    }

    /// Capture one snapshot now and append it to today's file.
    pub fn capture_and_append(&mut self) -> Result<CaptureOutcome> {
        self.capture_and_append_at(Local::now())
    }

    /// Capture one snapshot as if taken at `now`.
    pub fn capture_and_append_at(&mut self, now: DateTime<Local>) -> Result<CaptureOutcome> {
        let path = self.day_file_path(now);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if self.encryption.is_some() && file.metadata()?.len() == 0 {
            debug!(path = %path.display(), "starting new encrypted log");
            write_version(&mut file)?;
        }

        let entry = snapshot(&mut self.capturer, self.idle_threshold, now.timestamp())?;
        let json = entry.to_json()?;

        let Some(state) = self.encryption.as_mut() else {
            file.write_all(format!("\n{}", json).as_bytes())?;
            return Ok(CaptureOutcome {
                path,
                idle: entry.is_idle(),
                rotated: false,
            });
        };

        let mut buffer = Vec::new();
        let fresh = if state.rotation_due(&path) {
            let key = SymKey::generate_random()?;
            let wrapped = state.public_key.encrypt(key.as_bytes())?;
            buffer.extend(encode_record(RecordType::SymKey, &wrapped)?);
            Some(key)
        } else {
            None
        };

        let cipher = match (&fresh, &state.active) {
            (Some(key), _) => key.encrypt(json.as_bytes())?,
            (None, Some(active)) => active.key.encrypt(json.as_bytes())?,
            (None, None) => {
                return Err(OwlError::Crypto(
                    "No active AES key for encrypted entry".to_string(),
                ))
            }
        };
        buffer.extend(encode_record(RecordType::Json, &cipher)?);
        file.write_all(&buffer)?;

        // Commit key state only after the bytes are on disk.
        let rotated = fresh.is_some();
        if let Some(key) = fresh {
            debug!(path = %path.display(), "announced new AES key");
            state.active = Some(ActiveKey {
                key,
                file: path.clone(),
                entries: 0,
            });
        }
        if let Some(active) = state.active.as_mut() {
            active.entries += 1;
        }

        Ok(CaptureOutcome {
            path,
            idle: entry.is_idle(),
            rotated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AppRecord;
    use chrono::TimeZone;
    use std::sync::OnceLock;
    use tempfile::tempdir;

    struct OneWindow;

    impl Capturer for OneWindow {
        fn open_windows(&mut self) -> Result<Vec<AppRecord>> {
            Ok(vec![AppRecord {
                title: "Inbox".to_string(),
                path: "/usr/bin/mail".to_string(),
                is_active: true,
            }])
        }

        fn seconds_since_last_input(&mut self) -> Result<u64> {
            Ok(0)
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, day, hour, 0, 0)
            .single()
            .unwrap()
    }

    fn shared_public_key(dir: &Path) -> PathBuf {
        static PAIR: OnceLock<AsymKey> = OnceLock::new();
        let pair = PAIR.get_or_init(|| {
            let mut key = AsymKey::new();
            key.generate(1024).unwrap();
            key
        });
        let path = dir.join("public.key");
        pair.save_to_file(KeyType::Public, &path, None).unwrap();
        path
    }

    fn encrypted_config(dir: &Path, rate: u32) -> OwlConfig {
        let mut config = OwlConfig {
            out_dir: dir.join("logs"),
            ..OwlConfig::default()
        };
        config.encryption.enabled = true;
        config.encryption.key_gen_rate = rate;
        config.encryption.rsa_public_key_path = shared_public_key(dir);
        config
    }

    #[test]
    fn test_day_file_names() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(day_file_name(date, false), "20240131.json.log");
        assert_eq!(day_file_name(date, true), "20240131.json.log.enc");
    }

    #[test]
    fn test_plain_mode_appends_newline_json() {
        let dir = tempdir().unwrap();
        let config = OwlConfig {
            out_dir: dir.path().join("logs"),
            ..OwlConfig::default()
        };
        let mut logger = Logger::new(&config, OneWindow).unwrap();
        assert!(config.out_dir.is_dir());

        let first = logger.capture_and_append_at(at(4, 9)).unwrap();
        logger.capture_and_append_at(at(4, 10)).unwrap();
        assert!(!first.rotated);

        let contents = std::fs::read_to_string(&first.path).unwrap();
        let lines: Vec<&str> = contents.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].is_empty());
        assert!(lines[1].starts_with("{\"time\":"));
        assert!(lines[2].contains("\"isActive\":true"));
    }

    #[test]
    fn test_missing_public_key_fails_construction() {
        let dir = tempdir().unwrap();
        let mut config = OwlConfig {
            out_dir: dir.path().join("logs"),
            ..OwlConfig::default()
        };
        config.encryption.enabled = true;
        config.encryption.rsa_public_key_path = dir.path().join("absent.key");

        assert!(Logger::new(&config, OneWindow).is_err());
    }

    #[test]
    fn test_rotation_every_n_entries() {
        let dir = tempdir().unwrap();
        let mut logger = Logger::new(&encrypted_config(dir.path(), 2), OneWindow).unwrap();

        let rotated: Vec<bool> = (0..5)
            .map(|i| logger.capture_and_append_at(at(5, 8 + i)).unwrap().rotated)
            .collect();
        assert_eq!(rotated, vec![true, false, true, false, true]);
    }

    #[test]
    fn test_rotation_on_day_rollover() {
        let dir = tempdir().unwrap();
        let mut logger = Logger::new(&encrypted_config(dir.path(), 10), OneWindow).unwrap();

        let monday = logger.capture_and_append_at(at(4, 23)).unwrap();
        let tuesday = logger.capture_and_append_at(at(5, 0)).unwrap();

        assert!(monday.rotated);
        assert!(tuesday.rotated);
        assert_ne!(monday.path, tuesday.path);
        assert_eq!(std::fs::read(&tuesday.path).unwrap()[0], b'A');
    }

    #[test]
    fn test_zero_rate_rotates_every_entry() {
        let dir = tempdir().unwrap();
        let mut logger = Logger::new(&encrypted_config(dir.path(), 0), OneWindow).unwrap();

        assert!(logger.capture_and_append_at(at(6, 1)).unwrap().rotated);
        assert!(logger.capture_and_append_at(at(6, 2)).unwrap().rotated);
    }
}
