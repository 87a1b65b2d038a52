//! Validated mutations on the bucket.
//!
//! Requests are parsed into a closed [`ManageCommand`] before anything
//! touches storage; [`ObjectManager`] then runs the command.

pub mod command;
pub mod facade;
pub mod validation;

pub use command::{Action, ManageCommand};
pub use facade::{ManageOutcome, ObjectManager};
pub use validation::{FolderName, ObjectKey};
