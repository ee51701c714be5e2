//! Streaming decryption of encrypted day logs.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::{AsymKey, KeyType, SymKey};
use crate::entry::LogEntry;
use crate::error::{OwlError, Result};
use crate::framing::{RecordReader, RecordType};
use crate::fs::write_atomic;
use crate::logger::{ENCRYPTED_LOG_SUFFIX, PLAIN_LOG_SUFFIX};

/// Plaintext recovered from one encrypted log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptedLog {
    /// Entries joined exactly as a plain log would hold them (`"\n" + json` each).
    pub plaintext: Vec<u8>,
    pub entries: usize,
    pub key_epochs: usize,
    /// The stream ended inside a record; everything before it was recovered.
    pub truncated: bool,
}

impl DecryptedLog {
    /// Parse the recovered entries.
    pub fn parse_entries(&self) -> Result<Vec<LogEntry>> {
        self.plaintext
            .split(|byte| *byte == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| Ok(serde_json::from_slice(line)?))
            .collect()
    }
}

/// Decrypts log streams with an unlocked RSA private key.
pub struct LogDecryptor<'a> {
    key: &'a AsymKey,
}

impl<'a> LogDecryptor<'a> {
    /// # Errors
    ///
    /// Returns `OwlError::Crypto` if `key` holds no private key.
    pub fn new(key: &'a AsymKey) -> Result<Self> {
        if !key.has(KeyType::Private) {
            return Err(OwlError::Crypto(
                "Log decryption requires a loaded private key".to_string(),
            ));
        }
        Ok(Self { key })
    }

    /// Decrypt a whole log stream.
    ///
    /// # Errors
    ///
    /// - `OwlError::Format` for a bad version byte or a Json record before any SymKey record
    /// - `OwlError::UnknownRecordType` for an unrecognised record
    /// - `OwlError::Decryption` if a key or entry does not decrypt
    pub fn decrypt<R: Read>(&self, reader: R) -> Result<DecryptedLog> {
        let mut records = RecordReader::new(reader);
        records.read_version()?;

        let mut log = DecryptedLog::default();
        let mut current: Option<SymKey> = None;

        loop {
            let offset = records.position();
            let record = match records.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(OwlError::TruncatedRecord { offset, needed }) => {
                    warn!(offset, needed, "log ends inside a record; ignoring the partial tail");
                    log.truncated = true;
                    break;
                }
                Err(err) => return Err(err),
            };

            match record.kind {
                RecordType::SymKey => {
                    let secret = Zeroizing::new(self.key.decrypt(&record.payload)?);
                    let key = SymKey::from_bytes(&secret).map_err(|_| {
                        OwlError::Decryption(format!(
                            "unwrapped key at byte {} has {} bytes",
                            offset,
                            secret.len()
                        ))
                    })?;
                    current = Some(key);
                    log.key_epochs += 1;
                }
                RecordType::Json => {
                    let key = current.as_ref().ok_or_else(|| {
                        OwlError::Format(format!(
                            "encrypted entry at byte {} precedes any key record",
                            offset
                        ))
                    })?;
                    let plain = key.decrypt(&record.payload)?;
                    log.plaintext.push(b'\n');
                    log.plaintext.extend_from_slice(&plain);
                    log.entries += 1;
                }
            }
        }

        debug!(
            entries = log.entries,
            key_epochs = log.key_epochs,
            truncated = log.truncated,
            "log decrypted"
        );
        Ok(log)
    }

    pub fn decrypt_file(&self, path: &Path) -> Result<DecryptedLog> {
        let file = File::open(path)?;
        self.decrypt(BufReader::new(file))
    }

    /// Decrypt `source` and write the plain log into `dest_dir`.
    ///
    /// An existing plain log of the same name is replaced atomically.
    pub fn decrypt_file_into(&self, source: &Path, dest_dir: &Path) -> Result<FileReport> {
        let destination = dest_dir.join(plain_name_for(source)?);
        let log = self.decrypt_file(source)?;
        write_atomic(&destination, &log.plaintext, false)?;
        Ok(FileReport {
            destination,
            entries: log.entries,
            key_epochs: log.key_epochs,
            truncated: log.truncated,
        })
    }
}

/// Result of decrypting one file in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub destination: PathBuf,
    pub entries: usize,
    pub key_epochs: usize,
    pub truncated: bool,
}

/// Per-file outcomes of [`decrypt_log_files`], in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<(PathBuf, Result<FileReport>)>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|(_, result)| result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }
}

/// Whether `name` looks like `<8 digits>.json.log.enc`, ignoring case.
pub fn is_encrypted_log_name(name: &str) -> bool {
    let (Some(date), Some(suffix)) = (name.get(..8), name.get(8..)) else {
        return false;
    };
    date.bytes().all(|b| b.is_ascii_digit()) && suffix.eq_ignore_ascii_case(ENCRYPTED_LOG_SUFFIX)
}

fn plain_name_for(source: &Path) -> Result<String> {
    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| is_encrypted_log_name(name))
        .ok_or_else(|| {
            OwlError::InvalidInput(format!(
                "{} is not an encrypted day log",
                source.display()
            ))
        })?;
    Ok(format!("{}{}", &name[..8], PLAIN_LOG_SUFFIX))
}

/// List the encrypted day logs directly inside `dir`, sorted by name.
pub fn find_encrypted_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(OwlError::InvalidInput(format!(
            "Source {} is not a directory",
            dir.display()
        )));
    }

    let mut logs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let is_match = entry
            .file_name()
            .to_str()
            .is_some_and(is_encrypted_log_name);
        if is_match && entry.file_type()?.is_file() {
            logs.push(entry.path());
        }
    }
    logs.sort();
    Ok(logs)
}

/// Decrypt every encrypted day log in `source_dir` into `dest_dir`.
///
/// Files are handled independently: a corrupt file is recorded in the report
/// and the batch moves on.
///
/// # Errors
///
/// Fails only if `source_dir` is not a readable directory or `dest_dir` cannot
/// be created.
pub fn decrypt_log_files(source_dir: &Path, dest_dir: &Path, key: &AsymKey) -> Result<BatchReport> {
    decrypt_log_files_with(source_dir, dest_dir, key, |_, _| {})
}

/// [`decrypt_log_files`] calling `on_file` after each file is processed.
pub fn decrypt_log_files_with<F>(
    source_dir: &Path,
    dest_dir: &Path,
    key: &AsymKey,
    mut on_file: F,
) -> Result<BatchReport>
where
    F: FnMut(&Path, &Result<FileReport>),
{
    let decryptor = LogDecryptor::new(key)?;
    let sources = find_encrypted_logs(source_dir)?;
    std::fs::create_dir_all(dest_dir)?;

    info!(
        count = sources.len(),
        source = %source_dir.display(),
        dest = %dest_dir.display(),
        "decrypting logs"
    );

    let mut report = BatchReport::default();
    for source in sources {
        let result = decryptor.decrypt_file_into(&source, dest_dir);
        if let Err(err) = &result {
            warn!(file = %source.display(), error = %err, "failed to decrypt log");
        }
        on_file(&source, &result);
        report.files.push((source, result));
    }
    Ok(report)
}
