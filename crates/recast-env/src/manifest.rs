//! Dependency manifest parsing
//!
//! Extracts declared dependency name → version pairs from the project
//! manifests present in a working tree. Supported formats: `Cargo.toml`
//! and `package.json`.

use crate::error::EnvError;
use std::collections::BTreeMap;
use std::path::Path;

/// Parse all recognized manifests directly under `root`
///
/// Missing manifests are skipped; a present-but-unparseable manifest is an
/// error (the tree is in a state the tracker cannot describe).
pub fn parse_declared_dependencies(root: &Path) -> Result<BTreeMap<String, String>, EnvError> {
    let mut deps = BTreeMap::new();

    let cargo = root.join("Cargo.toml");
    if cargo.is_file() {
        parse_cargo_manifest(&cargo, &mut deps)?;
    }

    let package = root.join("package.json");
    if package.is_file() {
        parse_package_json(&package, &mut deps)?;
    }

    Ok(deps)
}

fn parse_cargo_manifest(
    path: &Path,
    deps: &mut BTreeMap<String, String>,
) -> Result<(), EnvError> {
    let text = std::fs::read_to_string(path).map_err(|source| EnvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: toml::Value = text.parse().map_err(|e: toml::de::Error| {
        EnvError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    for table_name in ["dependencies", "dev-dependencies", "build-dependencies"] {
        if let Some(table) = value.get(table_name).and_then(|v| v.as_table()) {
            for (name, spec) in table {
                deps.insert(name.clone(), cargo_version_of(spec));
            }
        }
    }

    // Workspace manifests declare shared versions one level up.
    if let Some(table) = value
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(|v| v.as_table())
    {
        for (name, spec) in table {
            deps.insert(name.clone(), cargo_version_of(spec));
        }
    }

    Ok(())
}

/// A cargo dependency is either `"1.0"` or a table with a `version` key;
/// path-only entries report as `*`.
fn cargo_version_of(spec: &toml::Value) -> String {
    match spec {
        toml::Value::String(version) => version.clone(),
        toml::Value::Table(table) => table
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("*")
            .to_string(),
        _ => "*".to_string(),
    }
}

fn parse_package_json(path: &Path, deps: &mut BTreeMap<String, String>) -> Result<(), EnvError> {
    let text = std::fs::read_to_string(path).map_err(|source| EnvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| EnvError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    for key in ["dependencies", "devDependencies"] {
        if let Some(map) = value.get(key).and_then(|v| v.as_object()) {
            for (name, version) in map {
                deps.insert(
                    name.clone(),
                    version.as_str().unwrap_or("*").to_string(),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cargo_dependency_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            r#"
[package]
name = "demo"
version = "0.1.0"

[dependencies]
serde = { version = "1.0", features = ["derive"] }
tokio = "1.43"

[dev-dependencies]
tempfile = "3"
"#,
        )
        .unwrap();

        let deps = parse_declared_dependencies(dir.path()).unwrap();
        assert_eq!(deps.get("serde").map(String::as_str), Some("1.0"));
        assert_eq!(deps.get("tokio").map(String::as_str), Some("1.43"));
        assert_eq!(deps.get("tempfile").map(String::as_str), Some("3"));
    }

    #[test]
    fn parses_package_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"react": "^18.0.0"}, "devDependencies": {"vitest": "1.2.0"}}"#,
        )
        .unwrap();

        let deps = parse_declared_dependencies(dir.path()).unwrap();
        assert_eq!(deps.get("react").map(String::as_str), Some("^18.0.0"));
        assert_eq!(deps.get("vitest").map(String::as_str), Some("1.2.0"));
    }

    #[test]
    fn missing_manifests_yield_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let deps = parse_declared_dependencies(dir.path()).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn path_only_cargo_dependency_reports_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            r#"
[dependencies]
local-crate = { path = "../local-crate" }
"#,
        )
        .unwrap();

        let deps = parse_declared_dependencies(dir.path()).unwrap();
        assert_eq!(deps.get("local-crate").map(String::as_str), Some("*"));
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "not [valid toml").unwrap();

        let result = parse_declared_dependencies(dir.path());
        assert!(matches!(result, Err(EnvError::ManifestParse { .. })));
    }
}
