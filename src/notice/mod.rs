//! Human-readable restriction notices
//!
//! Formatting only. Rendering the lines, sending mail or linking to a
//! request form is left to the presentation layer.

mod messages;
mod summary;

pub use messages::{
    compose_messages, compose_notice_messages, count_line, describe_embargo, exemption_line,
};
pub use summary::{EmbargoNotice, NoticeSummary};
