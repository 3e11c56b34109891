use std::path::PathBuf;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

pub(crate) fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

pub(crate) fn default_entry_filename() -> String {
    "app/[name].js".to_string()
}

pub(crate) fn default_public_path() -> String {
    "/".to_string()
}

pub(crate) fn default_stylesheet() -> String {
    "style/index.css".to_string()
}

pub(crate) fn default_html_template() -> Option<PathBuf> {
    Some(PathBuf::from("src/index.html"))
}

pub(crate) fn default_html_filename() -> String {
    "index.html".to_string()
}

pub(crate) fn default_html_base() -> Option<String> {
    Some("/".to_string())
}

pub(crate) fn default_favicon() -> Option<PathBuf> {
    Some(PathBuf::from("fav/fav.png"))
}

pub(crate) fn default_head_suffix() -> String {
    "_head".to_string()
}

pub(crate) fn default_clean_keep() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".gitignore".to_string(),
        "README.md".to_string(),
    ]
}

pub(crate) fn default_size_limit() -> u64 {
    512_000
}

pub(crate) fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub(crate) fn default_port() -> u16 {
    80
}

pub(crate) fn default_debounce_ms() -> u64 {
    100
}

pub(crate) fn default_watch_ignore() -> Vec<String> {
    vec!["node_modules".to_string(), "*.log".to_string()]
}
