//! Configuration for the task lifecycle service.

/// Tunables for [`super::TaskLifecycleService`].
///
/// # Examples
///
/// ```
/// use trellis::task::services::LifecycleConfig;
///
/// let config = LifecycleConfig::default();
/// assert!(config.allow_custom_recurrence);
/// assert!(!config.enforce_blocking_dependencies);
///
/// let strict = LifecycleConfig::strict();
/// assert!(strict.enforce_blocking_dependencies);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Maximum number of tasks a single batch update may touch.
    pub max_batch_size: usize,
    /// Whether `custom` recurrences are accepted.
    pub allow_custom_recurrence: bool,
    /// Whether completing a task requires its `blocks` dependencies to be
    /// done.
    pub enforce_blocking_dependencies: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            allow_custom_recurrence: true,
            enforce_blocking_dependencies: false,
        }
    }
}

impl LifecycleConfig {
    /// Creates a lenient configuration with a large batch limit.
    ///
    /// Useful for imports and migrations.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            max_batch_size: 10_000,
            ..Default::default()
        }
    }

    /// Creates a strict configuration: small batches, no custom patterns and
    /// completion gated on blocking dependencies.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            max_batch_size: 25,
            allow_custom_recurrence: false,
            enforce_blocking_dependencies: true,
        }
    }
}
