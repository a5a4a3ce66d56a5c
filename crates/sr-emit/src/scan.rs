//! Locating declaration files and RPC interfaces in the project tree.

use sr_core::Result;
use sr_parser::extract::go_files;
use sr_parser::{InterfaceType, SourceFile, parse_file};
use std::path::Path;

/// Parse the `.go` files directly in `dir` whose file name passes `keep`.
/// Declarations fetched by `sr get` carry the generated header, so it is not
/// a filter here.
pub fn declaration_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for path in go_files(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !keep(&name) {
            continue;
        }
        files.push(parse_file(&path)?);
    }
    Ok(files)
}

/// `IUser` declares object `User`.
pub fn object_of_interface(name: &str) -> Option<&str> {
    let rest = name.strip_prefix('I')?;
    rest.starts_with(|c: char| c.is_ascii_uppercase())
        .then_some(rest)
}

/// Interfaces declaring RPC objects, in file order.
pub fn rpc_interfaces(files: &[SourceFile]) -> Vec<(&SourceFile, &InterfaceType)> {
    let mut out = Vec::new();
    for file in files {
        for it in &file.interfaces {
            if object_of_interface(&it.name).is_some() {
                out.push((file, it));
            } else {
                tracing::debug!(interface = %it.name, path = %file.path.display(), "not an RPC interface");
            }
        }
    }
    out
}

/// Directory name as a Go identifier, if it is one.
pub fn dir_name(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_str()?;
    let valid = name.starts_with(|c: char| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_of_interface() {
        assert_eq!(object_of_interface("IUser"), Some("User"));
        assert_eq!(object_of_interface("Item"), None);
        assert_eq!(object_of_interface("I"), None);
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(dir_name(Path::new("/x/service/user")).as_deref(), Some("user"));
        assert_eq!(dir_name(Path::new("/x/service/my-svc")), None);
    }
}
