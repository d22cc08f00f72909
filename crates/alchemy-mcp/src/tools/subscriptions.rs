//! Subscription tools. Handled by the dispatcher itself, which owns the registry.

use super::schema::{FieldShape, FieldSpec, OperationDescriptor, OperationGroup};
use crate::subscriptions::SubscriptionKind;

pub static OPERATIONS: &[OperationDescriptor] = &[
    OperationDescriptor {
        name: "subscribe",
        title: "Subscribe",
        description: "Start a live event subscription. Events are delivered to the server's \
                      event log, not to this call; returns the subscription id.",
        group: OperationGroup::Subscription,
        fields: &[
            FieldSpec::required(
                "type",
                FieldShape::OneOf(SubscriptionKind::NAMES),
                "Event kind",
            ),
            FieldSpec::optional("address", FieldShape::String, "Log emitter filter (logs only)"),
            FieldSpec::optional("topics", FieldShape::Array, "Topic filter (logs only)"),
        ],
        read_only: false,
    },
    OperationDescriptor {
        name: "unsubscribe",
        title: "Unsubscribe",
        description: "Cancel a subscription created by subscribe",
        group: OperationGroup::Subscription,
        fields: &[FieldSpec::required(
            "subscriptionId",
            FieldShape::String,
            "Id returned by subscribe",
        )],
        read_only: false,
    },
    OperationDescriptor {
        name: "listSubscriptions",
        title: "List Subscriptions",
        description: "Live subscriptions, oldest first",
        group: OperationGroup::Subscription,
        fields: &[],
        read_only: true,
    },
];
