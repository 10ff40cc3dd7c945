//! Cross-module scenarios
//!
//! Unit tests live next to the code they cover; these exercise several
//! modules together.
