//! Per-screen view-model.
//!
//! State moves only through `Command`s, each producing a new model. Every
//! fetch gets a generation number; a response is applied only if it belongs
//! to the most recently issued fetch, so a slow stale response can never
//! overwrite newer data.

#[derive(Debug, Clone, PartialEq)]
pub enum Phase<T> {
    Idle,
    Loading,
    Loaded(Vec<T>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command<T> {
    /// A fetch was issued.
    Begin,
    /// A fetch finished.
    Resolve {
        generation: u64,
        outcome: Result<Vec<T>, String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel<T> {
    phase: Phase<T>,
    generation: u64,
}

impl<T> Default for ViewModel<T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            generation: 0,
        }
    }
}

impl<T> ViewModel<T> {
    pub fn apply(self, command: Command<T>) -> Self {
        match command {
            Command::Begin => Self {
                phase: Phase::Loading,
                generation: self.generation + 1,
            },
            Command::Resolve {
                generation,
                outcome,
            } => {
                if generation != self.generation {
                    tracing::debug!(
                        stale = generation,
                        latest = self.generation,
                        "discarding superseded fetch response"
                    );
                    return self;
                }
                let phase = match outcome {
                    Ok(items) => Phase::Loaded(items),
                    Err(reason) => Phase::Error(reason),
                };
                Self {
                    phase,
                    generation: self.generation,
                }
            }
        }
    }

    pub fn phase(&self) -> &Phase<T> {
        &self.phase
    }

    /// Generation of the most recently issued fetch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    /// Current collection; empty unless loaded.
    pub fn items(&self) -> &[T] {
        match &self.phase {
            Phase::Loaded(items) => items,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error(reason) => Some(reason),
            _ => None,
        }
    }
}
