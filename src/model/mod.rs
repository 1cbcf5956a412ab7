mod block;
pub mod blocks;
pub mod common;
mod note;

pub use block::{Block, BlockVisitor};
pub use blocks::*;
pub use common::*;
pub use note::{find_resource, Note, Resource};
