use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// Zip the generated site tree for distribution.
pub fn zip_dir(src_dir: &Path, dest: &Path) -> Result<usize> {
    anyhow::ensure!(src_dir.is_dir(), "archive source {} not found", src_dir.display());

    let file = fs_err::File::create(dest)
        .with_context(|| format!("failed to create archive {}", dest.display()))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0usize;
    for entry in WalkDir::new(src_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(src_dir)
            .context("walked entry escaped the archive root")?;
        let name = rel.to_string_lossy().replace('\\', "/");
        writer.start_file(name, options)?;
        let data = fs_err::read(entry.path())?;
        writer.write_all(&data)?;
        count += 1;
    }

    writer.finish()?;
    Ok(count)
}
