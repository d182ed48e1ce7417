//! Where a playlist run starts.

use pmocontrol::{ContentDirectory, ContentNode, Device, GlobPattern, PlaybackItem};
use tracing::{debug, info};

use crate::errors::RunError;

/// Root object id of every ContentDirectory
pub const ROOT_ID: &str = "0";

/// How the starting point is designated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartSpec {
    /// Object id of a container
    Id(String),
    /// First container or item, in walk order, whose title matches the glob
    Name(String),
    /// `/`-separated globs, one per level from the root
    Path(String),
}

impl Default for StartSpec {
    fn default() -> Self {
        StartSpec::Id(ROOT_ID.to_string())
    }
}

/// Resolved starting point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Container { id: String, title: String },
    /// Plays as a one-item playlist
    Item(PlaybackItem),
}

impl Target {
    fn from_node(node: ContentNode) -> Result<Self, RunError> {
        if node.is_container() {
            return Ok(Target::Container {
                id: node.id,
                title: node.title,
            });
        }
        node.to_playback_item()
            .map(Target::Item)
            .ok_or_else(|| RunError::NameNotFound(node.title))
    }
}

pub fn resolve_target(
    directory: &dyn ContentDirectory,
    server: &Device,
    spec: &StartSpec,
) -> Result<Target, RunError> {
    let target = match spec {
        StartSpec::Id(id) => Target::Container {
            id: id.clone(),
            title: id.clone(),
        },
        StartSpec::Name(pattern) => find_by_name(directory, server, pattern)?,
        StartSpec::Path(path) => find_by_path(directory, server, path)?,
    };
    debug!(?target, "Start target resolved");
    Ok(target)
}

/// Depth-first search in walk order; the first title match wins.
fn find_by_name(
    directory: &dyn ContentDirectory,
    server: &Device,
    pattern: &str,
) -> Result<Target, RunError> {
    let glob = GlobPattern::new(pattern)?;
    let mut stack = vec![directory.browse(server, ROOT_ID)?.into_iter()];

    while let Some(children) = stack.last_mut() {
        let Some(node) = children.next() else {
            stack.pop();
            continue;
        };

        if glob.is_match(&node.title) {
            info!(id = node.id.as_str(), title = node.title.as_str(), "Found start target");
            return Target::from_node(node);
        }
        if node.is_container() {
            stack.push(directory.browse(server, &node.id)?.into_iter());
        }
    }

    Err(RunError::NameNotFound(pattern.to_string()))
}

/// Descends one level per path component, first match at each level.
fn find_by_path(
    directory: &dyn ContentDirectory,
    server: &Device,
    path: &str,
) -> Result<Target, RunError> {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    let mut current = ContentNode::container(ROOT_ID, "");

    for component in components {
        let not_found = || RunError::PathNotFound {
            path: path.to_string(),
            component: component.to_string(),
            parent: current.id.clone(),
        };
        if !current.is_container() {
            return Err(not_found());
        }

        let glob = GlobPattern::new(component)?;
        let next = directory
            .browse(server, &current.id)?
            .into_iter()
            .find(|child| glob.is_match(&child.title))
            .ok_or_else(not_found)?;
        debug!(component, id = next.id.as_str(), title = next.title.as_str(), "Path step");
        current = next;
    }

    Target::from_node(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmocontrol::ControlPointError;
    use std::collections::HashMap;

    struct Library(HashMap<&'static str, Vec<ContentNode>>);

    impl ContentDirectory for Library {
        fn browse(&self, _: &Device, id: &str) -> Result<Vec<ContentNode>, ControlPointError> {
            Ok(self.0.get(id).cloned().unwrap_or_default())
        }
    }

    fn server() -> Device {
        Device {
            friendly_name: "NAS".into(),
            device_type: String::new(),
            location: String::new(),
            udn: String::new(),
            services: Vec::new(),
        }
    }

    fn library() -> Library {
        Library(HashMap::from([
            (
                "0",
                vec![
                    ContentNode::container("music", "Music"),
                    ContentNode::container("books", "Audiobooks"),
                ],
            ),
            (
                "music",
                vec![
                    ContentNode::container("m1", "Blue Train"),
                    ContentNode::container("m2", "Blue Monk"),
                ],
            ),
            (
                "m1",
                vec![ContentNode::item("t1", "Moment's Notice", "http://x/t1")],
            ),
            (
                "books",
                vec![ContentNode::container("b1", "Blue Planet")],
            ),
        ]))
    }

    #[test]
    fn id_is_taken_as_is() {
        let target =
            resolve_target(&library(), &server(), &StartSpec::Id("42".into())).unwrap();
        assert_eq!(
            target,
            Target::Container {
                id: "42".into(),
                title: "42".into()
            }
        );
        assert_eq!(StartSpec::default(), StartSpec::Id("0".into()));
    }

    #[test]
    fn name_search_follows_walk_order() {
        // "Blue Train" (under Music) comes before "Blue Planet" (under Audiobooks)
        let target =
            resolve_target(&library(), &server(), &StartSpec::Name("Blue*".into())).unwrap();
        assert_eq!(
            target,
            Target::Container {
                id: "m1".into(),
                title: "Blue Train".into()
            }
        );
    }

    #[test]
    fn name_search_can_find_an_item() {
        let target =
            resolve_target(&library(), &server(), &StartSpec::Name("Moment*".into())).unwrap();
        assert!(matches!(target, Target::Item(ref item) if item.id == "t1"));
    }

    #[test]
    fn name_search_without_match() {
        let err = resolve_target(&library(), &server(), &StartSpec::Name("Jazz".into()))
            .unwrap_err();
        assert!(matches!(err, RunError::NameNotFound(_)));
    }

    #[test]
    fn path_descends_level_by_level() {
        let target = resolve_target(
            &library(),
            &server(),
            &StartSpec::Path("Mus*/Blue M*".into()),
        )
        .unwrap();
        assert_eq!(
            target,
            Target::Container {
                id: "m2".into(),
                title: "Blue Monk".into()
            }
        );
    }

    #[test]
    fn path_only_matches_immediate_children() {
        let err = resolve_target(&library(), &server(), &StartSpec::Path("Blue*".into()))
            .unwrap_err();
        match err {
            RunError::PathNotFound {
                component, parent, ..
            } => {
                assert_eq!(component, "Blue*");
                assert_eq!(parent, "0");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn path_cannot_descend_below_an_item() {
        let err = resolve_target(
            &library(),
            &server(),
            &StartSpec::Path("Music/Blue Train/Moment*/more".into()),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::PathNotFound { .. }));
    }
}
