// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payload name templating.
//!
//! Exactly three case-exact placeholders are recognized: `{name}`, `{Name}`,
//! `{NAME}`. Substitution happens once, at enqueue or immediate-send time;
//! this is deliberately not a template language.

/// Replace every name placeholder in `message` with the recipient's name,
/// falling back to the recipient address when the name is empty.
pub fn personalize(message: &str, name: &str, recipient: &str) -> String {
    let value = if name.is_empty() { recipient } else { name };
    message
        .replace("{name}", value)
        .replace("{Name}", value)
        .replace("{NAME}", value)
}
