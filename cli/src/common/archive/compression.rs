//! # stackctl Compression Utilities (`common::archive::compression`)
//!
//! File: cli/src/common/archive/compression.rs
//!
//! ## Overview
//!
//! Database dumps are never buffered in memory or piped through a shell
//! `| gzip`. The dump command's stdout is copied chunk by chunk into a
//! `flate2::write::GzEncoder` wrapped around the destination file.
//!
//! ```rust
//! let bytes = compression::dump_to_gzip("docker", &args, &backup_dir.join("postgres_20240101T000000Z.sql.gz")).await?;
//! ```
//!
use crate::common::fs::io;
use crate::common::process;
use crate::core::error::Result;
use anyhow::Context;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{debug, warn};

/// Creates `path` (mode 0640) and wraps it in a gzip encoder.
pub fn gzip_file_writer(path: &Path) -> Result<GzEncoder<File>> {
    if let Some(parent) = path.parent() {
        io::ensure_dir_exists(parent)?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    fs::set_permissions(path, fs::Permissions::from_mode(io::FILE_MODE))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    Ok(GzEncoder::new(file, Compression::default()))
}

/// Runs `program` and writes its gzip-compressed stdout to `out_path`.
///
/// Returns the number of uncompressed bytes. A failed command removes the
/// partial archive before the error is returned.
pub async fn dump_to_gzip(program: &str, args: &[String], out_path: &Path) -> Result<u64> {
    let mut encoder = gzip_file_writer(out_path)?;
    let copied = match process::pipe_stdout_into(program, args, &mut encoder).await {
        Ok(n) => n,
        Err(e) => {
            drop(encoder);
            if let Err(cleanup) = io::remove_file_if_exists(out_path) {
                warn!("Could not remove partial dump {}: {:#}", out_path.display(), cleanup);
            }
            return Err(e);
        }
    };
    encoder
        .finish()
        .with_context(|| format!("Failed to finalize gzip stream {}", out_path.display()))?;
    debug!("Compressed {} bytes into {}", copied, out_path.display());
    Ok(copied)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_dump_to_gzip_round_trip() -> Result<()> {
        let temp = tempdir()?;
        let out = temp.path().join("backups/dev/postgres_x.sql.gz");
        let args = vec!["-c".to_string(), "printf 'CREATE TABLE t;'".to_string()];

        let n = dump_to_gzip("sh", &args, &out).await?;
        assert_eq!(n, 15);

        let mut text = String::new();
        GzDecoder::new(File::open(&out)?).read_to_string(&mut text)?;
        assert_eq!(text, "CREATE TABLE t;");
        assert_eq!(fs::metadata(&out)?.permissions().mode() & 0o777, 0o640);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_dump_leaves_no_file() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("mariadb_x.sql.gz");
        let args = vec!["-c".to_string(), "echo 'access denied' >&2; exit 2".to_string()];

        assert!(dump_to_gzip("sh", &args, &out).await.is_err());
        assert!(!out.exists());
    }
}
