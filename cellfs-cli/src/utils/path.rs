use anyhow::{Context, bail};
use cellfs::prelude::*;

/// Components of a `/`-separated image path; empty segments are dropped.
pub fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|c| !c.is_empty()).collect()
}

/// Splits into (parent components, final name).
pub fn split_last(path: &str) -> anyhow::Result<(Vec<&str>, &str)> {
    let mut parts = components(path);
    let Some(name) = parts.pop() else {
        bail!("path '{path}' names the root");
    };
    Ok((parts, name))
}

/// Walks `parts` from the root and returns the final identifier.
pub fn resolve<IO: CellIO>(fs: &CellFs<IO>, parts: &[&str]) -> anyhow::Result<u64> {
    let mut current = CELLFS_ROOT_ID;
    for (depth, part) in parts.iter().enumerate() {
        current = fs
            .lookup(current, part)
            .with_context(|| format!("cannot search in '/{}'", parts[..depth].join("/")))?
            .with_context(|| format!("'/{}' not found", parts[..=depth].join("/")))?;
    }
    Ok(current)
}
