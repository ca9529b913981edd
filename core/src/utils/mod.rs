pub mod payload_loader;

use std::fs::File;
use std::io;
use std::io::BufRead;
use std::path::Path;

/// Reads a line-delimited list, skipping blank lines and `#` comments.
pub fn read_list(path: &str) -> io::Result<Vec<String>> {
    let file = File::open(Path::new(path))?;
    let reader = io::BufReader::new(file);
    let lines = reader
        .lines()
        .collect::<io::Result<Vec<String>>>()?
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .collect();
    Ok(lines)
}
