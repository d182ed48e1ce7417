//! Skipping what was already played before a restart.

use pmocontrol::PlaybackItem;

use crate::walker::WalkEvent;

/// Whether items are still being skipped up to a checkpointed id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResumeState {
    #[default]
    Inactive,
    Armed { target: String },
}

impl ResumeState {
    /// Armed on a non-empty checkpoint value, inactive otherwise.
    pub fn from_checkpoint(checkpoint: Option<String>) -> Self {
        match checkpoint {
            Some(target) if !target.is_empty() => ResumeState::Armed { target },
            _ => ResumeState::Inactive,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, ResumeState::Armed { .. })
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            ResumeState::Armed { target } => Some(target),
            ResumeState::Inactive => None,
        }
    }

    /// Returns true when `id` must be played. Reaching the target disarms.
    pub fn admit(&mut self, id: &str) -> bool {
        match self {
            ResumeState::Inactive => true,
            ResumeState::Armed { target } if target.as_str() == id => {
                *self = ResumeState::Inactive;
                true
            }
            ResumeState::Armed { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Play(PlaybackItem),
    Skip(PlaybackItem),
    ContainerDone { id: String, title: String },
}

/// Applies a [`ResumeState`] to a stream of walk events.
pub struct ResumeFilter<I> {
    inner: I,
    state: ResumeState,
}

impl<I> ResumeFilter<I> {
    pub fn new(inner: I, state: ResumeState) -> Self {
        Self { inner, state }
    }

    pub fn state(&self) -> &ResumeState {
        &self.state
    }

    /// Still armed once the stream is exhausted means the checkpointed
    /// item was never seen.
    pub fn is_armed(&self) -> bool {
        self.state.is_armed()
    }
}

impl<I, E> Iterator for ResumeFilter<I>
where
    I: Iterator<Item = Result<WalkEvent, E>>,
{
    type Item = Result<Step, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = match self.inner.next()? {
            Ok(event) => event,
            Err(err) => return Some(Err(err)),
        };

        let step = match event {
            WalkEvent::Item(item) => {
                if self.state.admit(&item.id) {
                    Step::Play(item)
                } else {
                    Step::Skip(item)
                }
            }
            WalkEvent::ContainerDone { id, title } => Step::ContainerDone { id, title },
        };
        Some(Ok(step))
    }
}
