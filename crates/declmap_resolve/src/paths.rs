//! Module path normalization for import-type resolution.
//!
//! Import types reference sibling files with relative specifiers
//! (`import('../api/@ohos.graphics.drawing')`) that omit the declaration
//! extension; ingested files carry it. Both sides are reduced to one
//! canonical key before lookup.

/// Reduce an ingested file path to its lookup key: forward slashes, no
/// leading `./`, declaration/source extension stripped.
pub fn module_key(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.strip_prefix("./").unwrap_or(&path);
    strip_declaration_extension(path).to_string()
}

/// Resolve an import specifier against the importing file's path and reduce
/// it to a lookup key. Non-relative specifiers are taken as corpus-root
/// relative.
pub fn resolve_specifier(importer_path: &str, specifier: &str) -> String {
    let specifier = specifier.replace('\\', "/");
    if !specifier.starts_with("./") && !specifier.starts_with("../") {
        return module_key(&specifier);
    }

    let importer = importer_path.replace('\\', "/");
    let dir = match importer.rfind('/') {
        Some(index) => &importer[..index],
        None => "",
    };

    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    module_key(&segments.join("/"))
}

fn strip_declaration_extension(path: &str) -> &str {
    for extension in [".d.ts", ".d.ets", ".ts", ".ets"] {
        if let Some(stripped) = path.strip_suffix(extension) {
            return stripped;
        }
    }
    path
}
