//! Depth-first traversal of a ContentDirectory tree.

use pmocontrol::{ContentDirectory, ContentNode, ControlPointError, Device, PlaybackItem};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    Item(PlaybackItem),
    /// Emitted once every descendant of the container has been visited
    ContainerDone { id: String, title: String },
}

struct Frame {
    id: String,
    title: String,
    children: std::vec::IntoIter<ContentNode>,
}

/// Lazy pre-order walk over the items below `root_id`.
///
/// Children keep the order returned by the server. A container is browsed
/// only when the walk reaches it. After a browse error the walker yields
/// that error and then ends.
pub struct Walker<'a> {
    directory: &'a dyn ContentDirectory,
    server: &'a Device,
    root_id: Option<String>,
    stack: Vec<Frame>,
    done: bool,
}

impl<'a> Walker<'a> {
    pub fn new(directory: &'a dyn ContentDirectory, server: &'a Device, root_id: &str) -> Self {
        Self {
            directory,
            server,
            root_id: Some(root_id.to_string()),
            stack: Vec::new(),
            done: false,
        }
    }

    fn enter(&mut self, id: String, title: String) -> Result<(), ControlPointError> {
        let children = self.directory.browse(self.server, &id)?;
        debug!(container_id = id.as_str(), children = children.len(), "Entering container");
        self.stack.push(Frame {
            id,
            title,
            children: children.into_iter(),
        });
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<WalkEvent>, ControlPointError> {
        if let Some(root_id) = self.root_id.take() {
            self.enter(root_id, String::new())?;
        }

        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            match frame.children.next() {
                Some(node) if node.is_container() => self.enter(node.id, node.title)?,
                Some(node) => match node.to_playback_item() {
                    Some(item) => return Ok(Some(WalkEvent::Item(item))),
                    None => {
                        warn!(
                            id = node.id.as_str(),
                            title = node.title.as_str(),
                            "Skipping item without a playable URL"
                        );
                    }
                },
                None => {
                    let Some(finished) = self.stack.pop() else {
                        return Ok(None);
                    };
                    if self.stack.is_empty() {
                        // the root container is not reported
                        return Ok(None);
                    }
                    return Ok(Some(WalkEvent::ContainerDone {
                        id: finished.id,
                        title: finished.title,
                    }));
                }
            }
        }
    }
}

impl Iterator for Walker<'_> {
    type Item = Result<WalkEvent, ControlPointError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                self.stack.clear();
                Some(Err(err))
            }
        }
    }
}
