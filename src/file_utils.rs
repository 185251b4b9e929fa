const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human-readable size, e.g. "1.5 MB". Bytes are shown without decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut size = bytes as f64;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Normalize a user-supplied output name: blank falls back to `default_stem`,
/// and ".pdf" is appended unless already present.
pub fn output_file_name(name: &str, default_stem: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { default_stem } else { name };
    if name.ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{}.pdf", name)
    }
}
