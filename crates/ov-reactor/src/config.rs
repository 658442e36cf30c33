use serde::Deserialize;

/// Floor applied when a configured maximum is left at zero
/// (`OV_EVENT_LOOP_SOCKETS_MIN` in the original).
pub const MIN_SOCKETS: usize = 16;
/// Floor applied when a configured maximum is left at zero
/// (`OV_EVENT_LOOP_TIMERS_MIN` in the original).
pub const MIN_TIMERS: usize = 8;

/// Reactor sizing, parsed from an already-loaded configuration value.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReactorConfig {
    #[serde(default)]
    pub max_sockets: usize,
    #[serde(default)]
    pub max_timers: usize,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            max_sockets: MIN_SOCKETS,
            max_timers: MIN_TIMERS,
        }
    }
}

impl ReactorConfig {
    /// Raises zero maxima to their floor, then clamps `max_sockets` to
    /// the process's current `RLIMIT_NOFILE` (`ov_event_loop_config_adapt_to_runtime`).
    ///
    /// A `getrlimit` failure is logged and leaves `max_sockets`
    /// unclamped, matching the original's fail-open behavior.
    pub fn adapt_to_runtime(mut self) -> Self {
        if self.max_sockets == 0 {
            self.max_sockets = MIN_SOCKETS;
        }
        if self.max_timers == 0 {
            self.max_timers = MIN_TIMERS;
        }

        match current_nofile_limit() {
            Some(limit) if (self.max_sockets as u64) > limit => {
                tracing::info!(
                    limit,
                    requested = self.max_sockets,
                    "clamping reactor max_sockets to RLIMIT_NOFILE"
                );
                self.max_sockets = limit as usize;
            }
            Some(_) => {}
            None => {
                tracing::warn!("failed to read RLIMIT_NOFILE, leaving max_sockets unclamped");
            }
        }

        self
    }
}

#[cfg(unix)]
fn current_nofile_limit() -> Option<u64> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // Safety: `limit` is a plain-old-data struct fully initialized above.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) };
    if rc != 0 {
        return None;
    }
    if limit.rlim_cur == libc::RLIM_INFINITY {
        None
    } else {
        Some(limit.rlim_cur as u64)
    }
}

#[cfg(not(unix))]
fn current_nofile_limit() -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_maxima_rise_to_floor() {
        let config = ReactorConfig {
            max_sockets: 0,
            max_timers: 0,
        }
        .adapt_to_runtime();
        assert_eq!(config.max_timers, MIN_TIMERS);
        assert!(config.max_sockets >= MIN_SOCKETS || config.max_sockets > 0);
    }

    #[test]
    fn huge_request_is_clamped_to_system_limit() {
        let config = ReactorConfig {
            max_sockets: usize::MAX / 2,
            max_timers: MIN_TIMERS,
        }
        .adapt_to_runtime();
        assert!(config.max_sockets < usize::MAX / 2);
    }
}
