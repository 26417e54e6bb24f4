pub mod forms;
pub mod models;

/// Avatar shown for users who never uploaded one.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";

/// Banner shown on profiles without a custom header.
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

/// Hard cap on warble length, enforced both in the handler and by a
/// CHECK constraint on the messages table.
pub const MAX_MESSAGE_LEN: usize = 140;
