// CLI commands for authoring test-case bundles
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};
use zipjudge_common::naming::{
    archive_name, fixture_dir_name, fixture_name, is_valid_task_id, FixtureKind,
};

/// Use the given task id, or ask for one on stdin
pub fn task_id_or_prompt(task_id: Option<String>) -> Result<String> {
    let task_id = match task_id {
        Some(id) => id,
        None => {
            print!("Enter task ID (e.g., 1942G): ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            input
        }
    };

    let task_id = task_id.trim().to_string();
    if !is_valid_task_id(&task_id) {
        bail!("Task ID must be alphanumeric, got '{}'", task_id);
    }
    Ok(task_id)
}

/// Create `count` empty input/output pairs in `<root>/<ID>_TestCases/`
///
/// Existing files with the same names are truncated.
pub fn scaffold(root: &Path, task_id: &str, count: u32) -> Result<PathBuf> {
    if !is_valid_task_id(task_id) {
        bail!("Task ID must be alphanumeric, got '{}'", task_id);
    }
    if count == 0 {
        bail!("Case count must be at least 1");
    }

    let folder = root.join(fixture_dir_name(task_id));
    fs::create_dir_all(&folder)
        .with_context(|| format!("Failed to create directory: {}", folder.display()))?;

    for case in 1..=count {
        for kind in [FixtureKind::Input, FixtureKind::Output] {
            let file = folder.join(fixture_name(task_id, kind, case));
            fs::write(&file, "")
                .with_context(|| format!("Failed to write {}", file.display()))?;
        }
    }

    println!(
        "✅ Created {} input and {} output files in '{}'",
        count,
        count,
        folder.display()
    );
    Ok(folder)
}

/// Zip every file of `<root>/<ID>_TestCases/` into `<root>/<ID>_TestCases.zip`
///
/// Entries are stored flat (base name only), deflate-compressed, in sorted
/// order.
pub fn pack(root: &Path, task_id: &str) -> Result<PathBuf> {
    let folder = root.join(fixture_dir_name(task_id));
    if !folder.is_dir() {
        bail!("Folder '{}' does not exist", folder.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&folder).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", folder.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let zip_path = root.join(archive_name(task_id));
    let zip_file = File::create(&zip_path)
        .with_context(|| format!("Failed to create {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in &files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        zip.start_file(name.clone(), options)
            .with_context(|| format!("Failed to add '{}' (duplicate name?)", name))?;
        let mut source =
            File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
        io::copy(&mut source, &mut zip)
            .with_context(|| format!("Failed to compress {}", file.display()))?;
    }
    zip.finish().context("Failed to finalize archive")?;

    println!("✅ Created ZIP: {} ({} files)", zip_path.display(), files.len());
    Ok(zip_path)
}
