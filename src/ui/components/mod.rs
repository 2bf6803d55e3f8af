//! UI components module
//!
//! This module provides reusable UI components for the Murmur application.

pub mod input_bar;
pub mod message_list;

pub use input_bar::{InputAction, InputBar};
pub use message_list::MessageList;
