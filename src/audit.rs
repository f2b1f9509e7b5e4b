use anyhow::{Context, Result};
use chrono::Local;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Everything recorded about one handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub peer_ip: IpAddr,
    pub hardware_addr: String,
    pub user_agent: String,
    pub path: String,
    pub authorization: String,
}

impl AuditEntry {
    fn to_line(&self, timestamp: &str) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}",
            timestamp, self.hardware_addr, self.peer_ip, self.user_agent, self.path, self.authorization
        )
    }
}

/// Append-only forensic sink. Opened once at startup; appends are serialized
/// behind a mutex so concurrent handlers cannot interleave lines. Entries are
/// never mutated or deleted.
pub struct AuditLog {
    file: Mutex<File>,
    path: PathBuf,
}

impl AuditLog {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("failed to open audit log {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, flushed immediately so the log survives a crash.
    pub async fn record(&self, entry: &AuditEntry) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut line = entry.to_line(&timestamp);
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> AuditEntry {
        AuditEntry {
            peer_ip: "192.168.88.17".parse().unwrap(),
            hardware_addr: "AA:BB:CC:DD:EE:FF".to_string(),
            user_agent: "curl/8.0.1".to_string(),
            path: path.to_string(),
            authorization: "No Authorization Header".to_string(),
        }
    }

    #[test]
    fn test_line_field_order() {
        let line = entry("/sys.b").to_line("2026-08-05 10:00:00");
        assert_eq!(
            line,
            "2026-08-05 10:00:00, AA:BB:CC:DD:EE:FF, 192.168.88.17, curl/8.0.1, /sys.b, No Authorization Header"
        );
    }

    #[tokio::test]
    async fn test_record_appends_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let logfile = dir.path().join("auth_log.txt");
        let log = AuditLog::open(&logfile).await.unwrap();

        log.record(&entry("/index.html")).await.unwrap();
        log.record(&entry("/sys.b")).await.unwrap();

        let contents = std::fs::read_to_string(&logfile).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("/index.html, No Authorization Header"));
        assert!(lines[1].contains(", /sys.b, "));
    }

    #[tokio::test]
    async fn test_reopen_preserves_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let logfile = dir.path().join("auth_log.txt");

        {
            let log = AuditLog::open(&logfile).await.unwrap();
            log.record(&entry("/first")).await.unwrap();
        }
        {
            let log = AuditLog::open(&logfile).await.unwrap();
            log.record(&entry("/second")).await.unwrap();
        }

        let contents = std::fs::read_to_string(&logfile).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("/first"));
        assert!(contents.contains("/second"));
    }

    #[tokio::test]
    async fn test_concurrent_records_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let logfile = dir.path().join("auth_log.txt");
        let log = std::sync::Arc::new(AuditLog::open(&logfile).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..32 {
            let log = std::sync::Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                log.record(&entry(&format!("/path-{i}"))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let contents = std::fs::read_to_string(&logfile).unwrap();
        assert_eq!(contents.lines().count(), 32);
        for line in contents.lines() {
            assert_eq!(line.split(", ").count(), 6);
        }
    }
}
