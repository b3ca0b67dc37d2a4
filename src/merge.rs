//src/merge.rs

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tempfile::{Builder, NamedTempFile};

use crate::error::MergeError;

/// VCF header and meta lines start with this byte.
pub const COMMENT_MARKER: u8 = b'#';

/// Concatenate `files` into `destination`, keeping only the first file's
/// header block. Data lines are copied byte for byte in file order.
///
/// Output goes to a temporary file next to `destination` and only replaces it
/// once every source was read, so a failed merge leaves no partial file.
/// Returns the number of data lines written.
pub fn merge_outputs<P: AsRef<Path>>(files: &[P], destination: &Path) -> Result<u64, MergeError> {
    let write_err = |source| MergeError::Write {
        path: destination.to_path_buf(),
        source,
    };

    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = temp_output(parent).map_err(write_err)?;
    let mut out = BufWriter::new(tmp);

    let mut data_lines = 0u64;
    let mut line = Vec::new();
    for (i, file) in files.iter().enumerate() {
        let path = file.as_ref();
        let mut reader = open_source(path)?;
        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line).map_err(|source| MergeError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if n == 0 {
                break;
            }
            let is_header = line.first() == Some(&COMMENT_MARKER);
            if i == 0 || !is_header {
                out.write_all(&line).map_err(write_err)?;
            }
            if !is_header {
                data_lines += 1;
            }
        }
    }

    let tmp = out.into_inner().map_err(|e| write_err(e.into_error()))?;
    tmp.persist(destination).map_err(|e| write_err(e.error))?;
    log::info!(
        "Merged {} file(s) into {} ({} data lines)",
        files.len(),
        destination.display(),
        data_lines
    );
    Ok(data_lines)
}

/// The merged file is created with mode 0666 filtered by the umask, like any
/// plain `File::create`, rather than the owner-only mode of a bare temp file.
fn temp_output(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".multi_varscan").suffix(".vcf.tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Sources ending in `.gz` are decompressed on the fly.
fn open_source(path: &Path) -> Result<Box<dyn BufRead>, MergeError> {
    let f = File::open(path).map_err(|source| MergeError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    Ok(if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    })
}

/// Sort merge sources by path so the merged output does not depend on task
/// completion order.
pub fn sorted_sources(mut files: Vec<PathBuf>) -> Vec<PathBuf> {
    files.sort();
    files.dedup();
    files
}
