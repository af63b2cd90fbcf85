use std::fs::File;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::WorldError;

/// Write a gzipped tarball holding `entries` as `(name in archive, file on disk)`.
pub fn write_tgz<P: AsRef<Path>>(dest: &Path, entries: &[(&str, P)]) -> Result<(), WorldError> {
    let file = File::create(dest)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for (name, path) in entries {
        builder.append_path_with_name(path.as_ref(), name)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}
