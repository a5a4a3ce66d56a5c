//! Library side of the `sr` binary: helper sources and argument parsing
//! shared with the integration tests.

pub mod client;

use anyhow::{Result, bail};

/// Split `target[@object]`.
pub fn split_reference(reference: &str) -> Result<(&str, Option<&str>)> {
    let (target, object) = match reference.split_once('@') {
        Some((target, object)) => (target, Some(object)),
        None => (reference, None),
    };
    if target.is_empty() {
        bail!("missing target in '{reference}', expected target[@object]");
    }
    if object.is_some_and(|o| o.is_empty() || o.contains('@')) {
        bail!("invalid object in '{reference}', expected target[@object]");
    }
    Ok((target, object))
}

/// Split `target@object`, where the object is required.
pub fn split_object_reference(reference: &str) -> Result<(&str, &str)> {
    match split_reference(reference)? {
        (target, Some(object)) => Ok((target, object)),
        (_, None) => bail!("missing object in '{reference}', expected target@object"),
    }
}
