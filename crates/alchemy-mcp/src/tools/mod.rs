//! Tool table
//!
//! Descriptors for every exposed operation, grouped the way the backend groups
//! its methods, plus the per-group forwarding from validated arguments to
//! backend calls.

pub mod chain;
pub mod ens;
pub mod gas;
pub mod nft;
pub mod schema;
pub mod subscriptions;

pub use schema::{FieldShape, FieldSpec, OperationDescriptor, OperationGroup, ValidArgs};

use crate::protocol::Tool;

/// Every operation, in listing order
pub fn all_operations() -> impl Iterator<Item = &'static OperationDescriptor> {
    nft::OPERATIONS
        .iter()
        .chain(chain::OPERATIONS)
        .chain(ens::OPERATIONS)
        .chain(gas::OPERATIONS)
        .chain(subscriptions::OPERATIONS)
}

pub fn find_operation(name: &str) -> Option<&'static OperationDescriptor> {
    all_operations().find(|op| op.name == name)
}

/// Tool definitions for `tools/list`
pub fn get_all_tools() -> Vec<Tool> {
    all_operations().map(OperationDescriptor::to_tool).collect()
}
