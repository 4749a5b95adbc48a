use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of files picked up by `!includedir`
const OPTION_FILE_EXTENSION: &str = "cnf";

/// List the `*.cnf` files directly inside `dir`, in lexical order.
///
/// Hidden files are skipped and symlinks are followed. Subdirectories are
/// not searched. A missing `dir` is an error; an empty one is not.
pub fn option_files_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        ));
    }

    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .hidden(true) // Skip hidden files, like a shell glob
        .follow_links(true)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = vec![];
    for entry in walker {
        let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
        if entry.depth() == 0 {
            continue;
        }

        let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
        let is_option_file = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == OPTION_FILE_EXTENSION);

        if is_file && is_option_file {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
