//! Text rendering of recovery notices.

use std::fmt::Write as _;
use std::time::Duration;

use crate::entity::EntityId;
use crate::notify::RecoveryEvent;

const PROFILE_BASE: &str = "https://instagram.com/";

/// Public profile URL of an entity.
pub fn profile_url(entity: &EntityId) -> String {
    format!("{PROFILE_BASE}{entity}")
}

/// Formats an elapsed duration as `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Formats a count with thousands separators (`12,345`).
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Text form of a recovery notice.
pub struct RecoveryMessage<'a> {
    event: &'a RecoveryEvent,
}

impl<'a> RecoveryMessage<'a> {
    /// Wraps an event.
    pub fn new(event: &'a RecoveryEvent) -> Self {
        Self { event }
    }

    /// Markdown text sent as message body or attachment caption.
    pub fn text(&self) -> String {
        let ev = self.event;
        let mut out = String::new();
        let _ = writeln!(out, "✅ **Username unbanned!**");
        let _ = writeln!(out);
        let _ = writeln!(out, "**@{}** is now active again", ev.entity);
        let _ = writeln!(
            out,
            "👥 Followers: **{}**",
            format_count(ev.attributes.follower_count)
        );
        let _ = writeln!(out, "⏱ Time elapsed: **{}**", format_elapsed(ev.elapsed));
        let _ = write!(out, "{}", profile_url(&ev.entity));
        out
    }

    /// File name for a rendered attachment.
    pub fn attachment_name(&self) -> String {
        format!("{}_profile.png", self.event.entity)
    }
}
