use thiserror::Error;

use crate::topic::Topic;

/// Failure signalled by a single observer call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    #[error("observer failed: {message}")]
    Failed { message: String },
}

impl ObserverError {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Failure surfaced by [`ObserverPool::notify`](crate::ObserverPool::notify).
///
/// Observers invoked before the failing one are not undone: partial
/// delivery is an accepted outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("observer {position} on topic `{topic}` failed: {source}")]
    ObserverFailed {
        topic: Topic,
        position: usize,
        #[source]
        source: ObserverError,
    },
}

impl PoolError {
    /// Topic whose dispatch was interrupted.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        match self {
            Self::ObserverFailed { topic, .. } => topic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_topic_and_position() {
        let err = PoolError::ObserverFailed {
            topic: Topic::from("value"),
            position: 2,
            source: ObserverError::failed("boom"),
        };
        assert_eq!(
            err.to_string(),
            "observer 2 on topic `value` failed: observer failed: boom"
        );
        assert_eq!(err.topic().as_str(), "value");
    }
}
