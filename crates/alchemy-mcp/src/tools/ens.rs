//! ENS tools

use alchemy_client::EnsApi;
use serde_json::Value;

use super::schema::{FieldShape, FieldSpec, OperationDescriptor, OperationGroup, ValidArgs};
use crate::error::{DispatchError, Result};

pub static OPERATIONS: &[OperationDescriptor] = &[
    OperationDescriptor {
        name: "resolveName",
        title: "Resolve ENS Name",
        description: "Address an ENS name points to, or null",
        group: OperationGroup::Ens,
        fields: &[FieldSpec::required(
            "name",
            FieldShape::String,
            "ENS name such as vitalik.eth",
        )],
        read_only: true,
    },
    OperationDescriptor {
        name: "lookupAddress",
        title: "Reverse ENS Lookup",
        description: "Primary ENS name of an address, or null",
        group: OperationGroup::Ens,
        fields: &[FieldSpec::required(
            "address",
            FieldShape::String,
            "Account address",
        )],
        read_only: true,
    },
];

pub async fn forward<B: EnsApi + ?Sized>(backend: &B, args: &ValidArgs) -> Result<Value> {
    match args.operation() {
        "resolveName" => Ok(backend.resolve_name(args.require_string("name")?).await?),
        "lookupAddress" => Ok(backend
            .lookup_address(args.require_string("address")?)
            .await?),
        other => Err(DispatchError::InvalidOperation(other.to_string())),
    }
}
