use async_trait::async_trait;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use tracing::debug;

use crate::{Error, Result, aws::AwsContext};

const SERVICE: &str = "CloudFormation";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackDescription {
    pub name: String,
    pub outputs: Vec<StackOutput>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackResource {
    pub logical_id: String,
    pub physical_id: String,
}

/// Live view of a deployed stack.
#[async_trait]
pub trait StackInventory: Send + Sync {
    /// Stacks matching `stack_name`. A stack that does not exist yields an
    /// empty list rather than an error.
    async fn describe_stacks(&self, stack_name: &str) -> Result<Vec<StackDescription>>;

    /// Snapshot of every resource in the stack.
    async fn list_stack_resources(&self, stack_name: &str) -> Result<Vec<StackResource>>;
}

pub struct CloudFormationInventory {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationInventory {
    pub fn new(context: &AwsContext) -> Self {
        CloudFormationInventory {
            client: aws_sdk_cloudformation::Client::new(context.sdk_config()),
        }
    }
}

#[async_trait]
impl StackInventory for CloudFormationInventory {
    async fn describe_stacks(&self, stack_name: &str) -> Result<Vec<StackDescription>> {
        debug!(stack_name, "Describing stack");

        let output = match self.client.describe_stacks().stack_name(stack_name).send().await {
            Ok(output) => output,
            Err(err) => {
                // CloudFormation reports an unknown stack as a ValidationError.
                let missing = err.as_service_error().is_some_and(|e| {
                    e.code() == Some("ValidationError")
                        && e.message().is_some_and(|m| m.contains("does not exist"))
                });
                if missing {
                    return Ok(Vec::new());
                }
                return Err(Error::provider(SERVICE, DisplayErrorContext(&err).to_string()));
            }
        };

        let stacks = output
            .stacks()
            .iter()
            .map(|stack| StackDescription {
                name: stack.stack_name().unwrap_or_default().to_string(),
                outputs: stack
                    .outputs()
                    .iter()
                    .filter_map(|o| {
                        Some(StackOutput {
                            key: o.output_key()?.to_string(),
                            value: o.output_value()?.to_string(),
                        })
                    })
                    .collect(),
            })
            .collect();

        Ok(stacks)
    }

    async fn list_stack_resources(&self, stack_name: &str) -> Result<Vec<StackResource>> {
        debug!(stack_name, "Listing stack resources");

        let mut pages = self
            .client
            .list_stack_resources()
            .stack_name(stack_name)
            .into_paginator()
            .items()
            .send();

        let mut resources = Vec::new();
        while let Some(summary) = pages.next().await {
            let summary = summary
                .map_err(|err| Error::provider(SERVICE, DisplayErrorContext(&err).to_string()))?;
            if let (Some(logical_id), Some(physical_id)) =
                (summary.logical_resource_id(), summary.physical_resource_id())
            {
                resources.push(StackResource {
                    logical_id: logical_id.to_string(),
                    physical_id: physical_id.to_string(),
                });
            }
        }

        debug!(stack_name, count = resources.len(), "Listed stack resources");
        Ok(resources)
    }
}
