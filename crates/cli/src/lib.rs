#![allow(clippy::needless_return)]

mod args;

pub use args::{DefaultCommandLineArgs, ServerArgs, StoreArgs, SubCommands};
