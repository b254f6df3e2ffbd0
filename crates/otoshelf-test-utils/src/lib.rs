//! Scripted generative providers for tests.

mod provider;

pub use provider::{FixedGenAi, ScriptedGenAi, ScriptedReply};
