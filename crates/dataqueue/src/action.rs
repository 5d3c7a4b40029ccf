use core::{fmt, ops};

/// What a worker should do with the value its producer callback just
/// returned.
///
/// `Action` is a small bit set. [`Action::SEND`] is orthogonal to the two stop
/// bits, so an item can be emitted while also telling the current worker
/// ([`Action::STOP`]) or the whole producer pool ([`Action::STOP_ALL`]) to halt
/// once the emission completes.
///
/// ```
/// use dataqueue::Action;
///
/// let action = Action::SEND | Action::STOP;
/// assert_eq!(action, Action::SEND_AND_STOP);
/// assert!(action.is_send());
/// assert!(action.is_stop());
/// assert!(!action.is_stop_all());
/// assert!(!action.is_noop());
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Action(u8);

impl Action {
    /// Nothing to emit, keep going.
    pub const NOOP: Self = Self(0);
    /// Emit the returned item onto the stream.
    pub const SEND: Self = Self(1 << 1);
    /// Terminate the current worker.
    pub const STOP: Self = Self(1 << 2);
    /// Terminate every worker in the producer pool.
    pub const STOP_ALL: Self = Self(1 << 3);

    /// Emit the item, then terminate the current worker.
    pub const SEND_AND_STOP: Self = Self(Self::SEND.0 | Self::STOP.0);
    /// Emit the item, then terminate every worker in the producer pool.
    pub const SEND_AND_STOP_ALL: Self = Self(Self::SEND.0 | Self::STOP_ALL.0);

    /// Returns the raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if no bit is set.
    pub const fn is_noop(self) -> bool {
        self.0 == Self::NOOP.0
    }

    /// Returns `true` if the send bit is set.
    pub const fn is_send(self) -> bool {
        self.0 & Self::SEND.0 == Self::SEND.0
    }

    /// Returns `true` if the stop bit is set.
    pub const fn is_stop(self) -> bool {
        self.0 & Self::STOP.0 == Self::STOP.0
    }

    /// Returns `true` if the stop-all bit is set.
    pub const fn is_stop_all(self) -> bool {
        self.0 & Self::STOP_ALL.0 == Self::STOP_ALL.0
    }

    /// Returns `true` if the worker that observed this action must exit after
    /// handling it.
    pub const fn terminates(self) -> bool {
        self.is_stop() || self.is_stop_all()
    }
}

impl ops::BitOr for Action {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for Action {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return f.write_str("NOOP");
        }

        let mut first = true;
        for (set, name) in [
            (self.is_send(), "SEND"),
            (self.is_stop(), "STOP"),
            (self.is_stop_all(), "STOP_ALL"),
        ] {
            if !set {
                continue;
            }
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }

        Ok(())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [(&str, Action); 6] = [
        ("NOOP", Action::NOOP),
        ("SEND", Action::SEND),
        ("STOP", Action::STOP),
        ("STOP_ALL", Action::STOP_ALL),
        ("SEND_AND_STOP", Action::SEND_AND_STOP),
        ("SEND_AND_STOP_ALL", Action::SEND_AND_STOP_ALL),
    ];

    fn check(predicate: impl Fn(Action) -> bool, expected_true: &[Action]) {
        for (name, action) in ALL {
            let want = expected_true.contains(&action);
            assert_eq!(predicate(action), want, "{name}: expected {want}");
        }
    }

    #[test]
    fn is_noop_only_for_zero() {
        check(Action::is_noop, &[Action::NOOP]);
        assert!(Action::default().is_noop());
    }

    #[test]
    fn is_send() {
        check(
            Action::is_send,
            &[
                Action::SEND,
                Action::SEND_AND_STOP,
                Action::SEND_AND_STOP_ALL,
            ],
        );
    }

    #[test]
    fn is_stop() {
        check(Action::is_stop, &[Action::STOP, Action::SEND_AND_STOP]);
    }

    #[test]
    fn is_stop_all() {
        check(
            Action::is_stop_all,
            &[Action::STOP_ALL, Action::SEND_AND_STOP_ALL],
        );
    }

    #[test]
    fn combined_constants_match_bit_or() {
        assert_eq!(Action::SEND | Action::STOP, Action::SEND_AND_STOP);
        assert_eq!(Action::SEND | Action::STOP_ALL, Action::SEND_AND_STOP_ALL);

        let mut action = Action::NOOP;
        action |= Action::SEND;
        action |= Action::STOP_ALL;
        assert_eq!(action, Action::SEND_AND_STOP_ALL);
    }

    #[test]
    fn bit_values_are_stable() {
        assert_eq!(Action::NOOP.bits(), 0);
        assert_eq!(Action::SEND.bits(), 2);
        assert_eq!(Action::STOP.bits(), 4);
        assert_eq!(Action::STOP_ALL.bits(), 8);
    }

    #[test]
    fn terminates_on_either_stop_bit() {
        check(
            Action::terminates,
            &[
                Action::STOP,
                Action::STOP_ALL,
                Action::SEND_AND_STOP,
                Action::SEND_AND_STOP_ALL,
            ],
        );
    }

    #[test]
    fn display_lists_set_flags() {
        assert_eq!(Action::NOOP.to_string(), "NOOP");
        assert_eq!(Action::SEND_AND_STOP.to_string(), "SEND|STOP");
        assert_eq!(Action::STOP_ALL.to_string(), "STOP_ALL");
        assert_eq!(
            format!("{:?}", Action::SEND_AND_STOP_ALL),
            "Action(SEND|STOP_ALL)"
        );
    }
}
