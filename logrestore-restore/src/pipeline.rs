use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Component, Path, PathBuf},
};

use chrono::Utc;
use flate2::read::MultiGzDecoder;
use log::{info, warn};
use logrestore_models::logging::{LogEntry, PutLogsDetails};
use logrestore_oci::{LogIngestion, ObjectStore};

use crate::{
    error::{RestoreError, Result},
    transform::{build_batch, reshape_line},
};

/// Where restored entries come from and go to.
#[derive(Debug, Clone)]
pub struct RestoreTarget<'a> {
    pub namespace: &'a str,
    pub bucket: &'a str,
    pub log_id: &'a str,
    pub work_dir: &'a Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredObject {
    pub name: String,
    pub entries: usize,
}

/// Restore every object in order. The first failure aborts the run; objects
/// submitted before it stay submitted.
pub fn restore_logs<S, I>(
    store: &S,
    ingestion: &I,
    target: &RestoreTarget<'_>,
    object_names: &[String],
) -> Result<Vec<RestoredObject>>
where
    S: ObjectStore + ?Sized,
    I: LogIngestion + ?Sized,
{
    object_names
        .iter()
        .map(|name| restore_object(store, ingestion, target, name))
        .collect()
}

/// Download, parse and submit one archive object as a single batch.
pub fn restore_object<S, I>(
    store: &S,
    ingestion: &I,
    target: &RestoreTarget<'_>,
    object_name: &str,
) -> Result<RestoredObject>
where
    S: ObjectStore + ?Sized,
    I: LogIngestion + ?Sized,
{
    info!("{}", object_name);

    let archive = TempArchive::download(store, target, object_name)?;
    let entries = archive.read_entries()?;
    drop(archive);

    let count = entries.len();
    if entries.is_empty() {
        warn!("{} holds no log entries; nothing submitted", object_name);
    } else {
        let details = PutLogsDetails::single(build_batch(entries, Utc::now()));
        ingestion
            .put_logs(target.log_id, &details)
            .map_err(|source| RestoreError::Submit {
                object: object_name.to_string(),
                source,
            })?;
        info!("Submitted {} log entries from {}", count, object_name);
    }

    Ok(RestoredObject {
        name: object_name.to_string(),
        entries: count,
    })
}

/// Local path an object is downloaded to: its name below `work_dir`, with
/// root, prefix and `..` components dropped.
pub fn local_path(work_dir: &Path, object_name: &str) -> Option<PathBuf> {
    let relative: PathBuf = Path::new(object_name)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(work_dir.join(relative))
    }
}

/// Downloaded copy of an archive object, removed when dropped.
struct TempArchive<'a> {
    object_name: &'a str,
    path: PathBuf,
}

impl<'a> TempArchive<'a> {
    fn download<S>(store: &S, target: &RestoreTarget<'_>, object_name: &'a str) -> Result<Self>
    where
        S: ObjectStore + ?Sized,
    {
        let path = local_path(target.work_dir, object_name)
            .ok_or_else(|| RestoreError::ObjectPath(object_name.to_string()))?;
        let local_err = |path: &Path, source: io::Error| RestoreError::LocalFile {
            object: object_name.to_string(),
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| local_err(parent, source))?;
        }
        if path.exists() {
            fs::remove_file(&path).map_err(|source| local_err(&path, source))?;
        }

        let archive = TempArchive { object_name, path };
        let mut body = store
            .get_object(target.namespace, target.bucket, object_name)
            .map_err(|source| RestoreError::Download {
                object: object_name.to_string(),
                source,
            })?;
        let file = File::create(&archive.path).map_err(|source| local_err(&archive.path, source))?;
        let mut writer = BufWriter::new(file);
        io::copy(&mut body, &mut writer)
            .and_then(|_| writer.flush())
            .map_err(|source| local_err(&archive.path, source))?;

        Ok(archive)
    }

    fn read_entries(&self) -> Result<Vec<LogEntry>> {
        let file = File::open(&self.path).map_err(|source| RestoreError::LocalFile {
            object: self.object_name.to_string(),
            path: self.path.clone(),
            source,
        })?;
        let reader = BufReader::new(MultiGzDecoder::new(BufReader::new(file)));

        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| RestoreError::Decompress {
                object: self.object_name.to_string(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = reshape_line(&line).map_err(|source| RestoreError::Parse {
                object: self.object_name.to_string(),
                line: index + 1,
                source,
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl Drop for TempArchive<'_> {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove {}: {}", self.path.display(), err),
        }
    }
}
