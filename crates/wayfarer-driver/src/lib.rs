//! Conversation driver for Wayfarer.
//!
//! Simulates a user navigating a chatbot graph: at each node the chat model
//! picks `move_to_node`, `exit` or `summon` through function calling, and
//! the driver records the resulting path.
//!
//! # Bounds
//!
//! - At most `max_attempts` model calls per node; violations past that
//!   close the path with `error`.
//! - The path never exceeds `max_path_length` entries.
//!
//! # Example
//!
//! ```rust,ignore
//! let driver = ConversationDriver::new(&model, &graph);
//! let outcome = driver.run_conversation("결제 수단을 바꾸고 싶어요").await?;
//! println!("{}", outcome.path);
//! ```

pub mod config;
pub mod conversation;
pub mod error;
pub mod intent;
pub mod path;
pub mod prompts;
pub mod tools;
pub mod transcript;

pub use config::{DriverConfig, PathLimitPolicy};
pub use conversation::{
    ConversationDriver, ConversationEnd, ConversationOutcome, MIN_LABEL_CHOICES, SinglePromptOutcome,
};
pub use error::{DriverError, Result};
pub use intent::IntentGenerator;
pub use path::{ConversationPath, PathEntry, Terminal};
pub use tools::{Decision, ProtocolViolation, ToolPolicy};
pub use transcript::Transcript;
