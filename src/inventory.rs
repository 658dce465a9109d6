use crate::gotool::GoTool;
use crate::version::{Package, Version};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// List the binaries under the install target. Subdirectories and
/// hidden files (.DS_Store and friends) are skipped.
pub fn binary_path_list(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut list = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.path().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        list.push(entry.path());
    }
    list.sort();
    Ok(list)
}

/// Resolve each binary to a `Package` via its embedded build metadata.
/// A binary whose metadata cannot be read is warned about and dropped;
/// one bad binary never aborts the whole inventory. The toolchain
/// version is queried once and degrades to "unknown".
pub fn package_information(tool: &dyn GoTool, bin_list: &[PathBuf]) -> Vec<Package> {
    let go_ver = tool
        .toolchain_version()
        .unwrap_or_else(|_| "unknown".to_string());

    let mut pkgs = Vec::new();
    for path in bin_list {
        let meta = match tool.read_build_metadata(path) {
            Ok(meta) => meta,
            Err(err) => {
                tracing::warn!("{err}");
                continue;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        pkgs.push(Package {
            name,
            import_path: meta.import_path,
            module_path: meta.module_path,
            version: Version::new(meta.version),
            go_version: Version {
                current: meta.go_version,
                latest: go_ver.clone(),
            },
        });
    }
    pkgs
}

/// Narrow the inventory to the user-specified names, preserving order.
/// Every name that matches nothing gets one warning. On Windows the
/// comparison ignores the `.exe` suffix on both sides.
pub fn select_by_name(pkgs: Vec<Package>, names: &[String]) -> Vec<Package> {
    if names.is_empty() {
        return pkgs;
    }

    let targets: Vec<String> = names.iter().map(|n| normalize_name(n)).collect();
    let mut found = Vec::new();
    let mut result = Vec::new();
    for pkg in pkgs {
        let key = normalize_name(&pkg.name);
        if targets.contains(&key) {
            found.push(key);
            result.push(pkg);
        }
    }

    for target in &targets {
        if !found.contains(target) {
            tracing::warn!("not found '{}' package in $GOPATH/bin or $GOBIN", target);
        }
    }
    result
}

/// Drop the named packages from the work set, logging each exclusion.
pub fn exclude_by_name(pkgs: Vec<Package>, names: &[String]) -> Vec<Package> {
    pkgs.into_iter()
        .filter(|pkg| {
            if names.iter().any(|n| n == &pkg.name) {
                tracing::info!("Exclude '{}' from the update target", pkg.name);
                false
            } else {
                true
            }
        })
        .collect()
}

fn normalize_name(name: &str) -> String {
    if cfg!(windows) {
        let lower = name.to_lowercase();
        lower
            .strip_suffix(".exe")
            .map(|s| s.to_string())
            .unwrap_or(lower)
    } else {
        name.to_string()
    }
}
