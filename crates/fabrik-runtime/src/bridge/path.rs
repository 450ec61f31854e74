//! Browse-path resolution with on-demand folder creation.

use std::sync::{Arc, Mutex};

use smol_str::SmolStr;
use tracing::{debug, error, warn};

use crate::error::RuntimeError;
use crate::ua::{
    ns0, BrowsePath, BrowsePathResult, ObjectNodeRequest, RelativePathElement, UaNodeId,
    UaQualifiedName, UaServices,
};

/// Resolves `/Objects/...` browse paths to node ids, optionally creating
/// missing folder nodes along the way.
///
/// The whole resolve-or-create sequence runs under one mutex so concurrent
/// callers cannot race to create siblings with the same browse name.
pub struct PathResolver {
    services: Arc<dyn UaServices>,
    namespace: u16,
    resolve_lock: Mutex<()>,
}

struct PathSegment {
    namespace: u16,
    name: SmolStr,
}

impl PathResolver {
    /// Resolver over the given services, creating folders in `namespace`.
    pub fn new(services: Arc<dyn UaServices>, namespace: u16) -> Self {
        Self {
            services,
            namespace,
            resolve_lock: Mutex::new(()),
        }
    }

    /// Resolve a slash-delimited browse path rooted at `/Objects`.
    ///
    /// Each segment may carry a namespace index as `NS:name` (default 0).
    /// With `create_if_not_found`, missing folders below the deepest
    /// resolved ancestor are created and the deepest created id returned.
    pub fn resolve(
        &self,
        path: &str,
        create_if_not_found: bool,
    ) -> Result<UaNodeId, RuntimeError> {
        let segments = parse_path(path)?;
        if segments.is_empty() {
            return Ok(ns0::OBJECTS_FOLDER);
        }

        // One sub-path per depth, so the deepest resolved ancestor falls
        // out of a single batched request.
        let paths: Vec<BrowsePath> = (1..=segments.len())
            .map(|depth| BrowsePath {
                starting_node: ns0::OBJECTS_FOLDER,
                elements: segments[..depth]
                    .iter()
                    .map(|segment| RelativePathElement {
                        reference_type: ns0::HAS_COMPONENT,
                        target_name: UaQualifiedName::new(segment.namespace, segment.name.clone()),
                    })
                    .collect(),
            })
            .collect();

        let _guard = self.resolve_lock.lock().expect("path resolver poisoned");
        let results = self
            .services
            .translate_browse_paths(&paths)
            .map_err(|status| {
                error!(%status, path, "could not translate browse paths to node ids");
                RuntimeError::Service(status)
            })?;
        if results.len() != paths.len() {
            error!(
                path,
                expected = paths.len(),
                got = results.len(),
                "translate result count mismatch"
            );
            return Err(RuntimeError::NodeNotFound(path.into()));
        }

        let deepest = &results[segments.len() - 1];
        if deepest.status.is_good() {
            return first_target(deepest, path)
                .cloned()
                .ok_or_else(|| RuntimeError::NodeNotFound(path.into()));
        }
        if !create_if_not_found {
            debug!(path, "browse path not found");
            return Err(RuntimeError::NodeNotFound(path.into()));
        }

        // Walk up to the deepest resolved ancestor, then create everything
        // below it.
        let mut parent = ns0::OBJECTS_FOLDER;
        let mut first_missing = 0;
        for depth in (0..segments.len()).rev() {
            let result = &results[depth];
            if !result.status.is_good() {
                continue;
            }
            let Some(target) = first_target(result, path) else {
                error!(path, "translate result has no targets");
                return Err(RuntimeError::NodeNotFound(path.into()));
            };
            parent = target.clone();
            first_missing = depth + 1;
            break;
        }

        let mut node = parent;
        for segment in &segments[first_missing..] {
            node = self.create_folder(&node, segment, path)?;
        }
        Ok(node)
    }

    fn create_folder(
        &self,
        parent: &UaNodeId,
        segment: &PathSegment,
        path: &str,
    ) -> Result<UaNodeId, RuntimeError> {
        let request = ObjectNodeRequest {
            requested_id: UaNodeId::numeric(self.namespace, 0),
            parent: parent.clone(),
            reference_type: ns0::HAS_COMPONENT,
            browse_name: UaQualifiedName::new(segment.namespace, segment.name.clone()),
            type_definition: ns0::FOLDER_TYPE,
            display_name: segment.name.clone(),
            description: segment.name.clone(),
        };
        let id = self.services.add_object_node(&request).map_err(|status| {
            error!(%status, path, folder = %segment.name, "could not add folder node");
            RuntimeError::Service(status)
        })?;
        debug!(path, folder = %segment.name, node = %id, "folder node added");
        Ok(id)
    }
}

fn first_target<'a>(result: &'a BrowsePathResult, path: &str) -> Option<&'a UaNodeId> {
    if result.targets.len() > 1 {
        warn!(path, "browse path has multiple results, taking the first");
    }
    result.targets.first()
}

fn parse_path(path: &str) -> Result<Vec<PathSegment>, RuntimeError> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        error!(path, "empty browse path");
        return Err(RuntimeError::PathMalformed(path.into()));
    }
    let mut parts = trimmed.split('/');
    if trimmed.starts_with('/') {
        // swallow the empty leading segment
        parts.next();
    }
    let root = parts.next().unwrap_or("");
    if root != "Objects" && root != "0:Objects" {
        error!(path, "browse path has to start with '/Objects'");
        return Err(RuntimeError::PathNotRooted(path.into()));
    }
    let mut segments = Vec::new();
    for part in parts {
        if part.is_empty() {
            error!(path, "empty browse path segment");
            return Err(RuntimeError::PathMalformed(path.into()));
        }
        segments.push(parse_segment(part));
    }
    Ok(segments)
}

fn parse_segment(part: &str) -> PathSegment {
    match part.split_once(':') {
        Some((ns, name))
            if !ns.is_empty() && !name.is_empty() && ns.bytes().all(|b| b.is_ascii_digit()) =>
        {
            PathSegment {
                namespace: ns.parse().unwrap_or(0),
                name: SmolStr::new(name),
            }
        }
        _ => PathSegment {
            namespace: 0,
            name: SmolStr::new(part),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_accept_namespace_prefixes() {
        let segments = parse_path("/Objects/2:plant/line").expect("valid path");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].namespace, 2);
        assert_eq!(segments[0].name.as_str(), "plant");
        assert_eq!(segments[1].namespace, 0);
        assert_eq!(segments[1].name.as_str(), "line");
    }

    #[test]
    fn root_synonym_and_trailing_slashes() {
        assert_eq!(parse_path("0:Objects/a/").expect("valid path").len(), 1);
        assert_eq!(parse_path("/Objects///").expect("bare root").len(), 0);
        assert!(parse_path("/Objects/a//b").is_err());
    }

    #[test]
    fn malformed_and_unrooted_paths() {
        assert!(matches!(
            parse_path(""),
            Err(RuntimeError::PathMalformed(_))
        ));
        assert!(matches!(
            parse_path("///"),
            Err(RuntimeError::PathMalformed(_))
        ));
        assert!(matches!(
            parse_path("/Widgets/a"),
            Err(RuntimeError::PathNotRooted(_))
        ));
    }
}
