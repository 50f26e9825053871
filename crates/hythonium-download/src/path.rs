//! Download file naming and placement

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Last path segment of `url`, percent-decoded and sanitised.
///
/// `None` when the URL names no file (`https://example.com/`).
pub fn file_name_from_url(url: &str) -> Option<String> {
    let segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => {
            let cut = url.find(['?', '#']).unwrap_or(url.len());
            url[..cut].rsplit('/').next().map(str::to_string)
        }
    }?;

    let decoded = percent_decode_str(&segment).decode_utf8_lossy();
    sanitize_file_name(&decoded)
}

/// Reduce `name` to a bare file name safe on every platform.
///
/// Directory components are dropped and reserved characters become `_`.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let name = name.trim().replace('\\', "/");
    let name = Path::new(&name).file_name()?.to_str()?;

    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Split `name` into base and extension at the last dot.
///
/// Leading dots belong to the base, so `.bashrc` has no extension, and the
/// extension keeps its dot: `report.tar.gz` → (`report.tar`, `.gz`).
pub fn split_extension(name: &str) -> (&str, &str) {
    let Some(dot) = name.rfind('.') else {
        return (name, "");
    };

    if name[..dot].chars().any(|c| c != '.') {
        name.split_at(dot)
    } else {
        (name, "")
    }
}

/// First path in `dir` for `name` that does not collide.
///
/// Probes `name`, then `base(1)ext`, `base(2)ext`, … For the same
/// filesystem state and the same `is_taken` answers the result is always the
/// same.
pub fn unique_destination<F>(dir: &Path, name: &str, is_taken: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let taken = |path: &Path| path.exists() || is_taken(path);

    let candidate = dir.join(name);
    if !taken(&candidate) {
        return candidate;
    }

    let (base, ext) = split_extension(name);
    let mut counter: u32 = 1;
    loop {
        let candidate = dir.join(format!("{}({}){}", base, counter, ext));
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
