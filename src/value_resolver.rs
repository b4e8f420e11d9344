use tracing::debug;

use crate::{ConfigValue, Error, Result, stack_inventory::StackInventory};

/// Turns configuration values into the concrete strings the cloud APIs want.
pub struct ValueResolver<'a> {
    inventory: &'a dyn StackInventory,
    stack_name: &'a str,
}

impl<'a> ValueResolver<'a> {
    pub fn new(inventory: &'a dyn StackInventory, stack_name: &'a str) -> Self {
        ValueResolver {
            inventory,
            stack_name,
        }
    }

    pub fn stack_name(&self) -> &str {
        self.stack_name
    }

    /// Literals come back untouched. A `Ref` costs one resource listing per
    /// call; nothing is cached.
    pub async fn resolve(&self, field: &str, value: &ConfigValue) -> Result<String> {
        match value {
            ConfigValue::Literal(literal) => Ok(literal.clone()),
            ConfigValue::StackResourceRef { logical_id } => {
                let resources = self.inventory.list_stack_resources(self.stack_name).await?;
                let resource = resources
                    .into_iter()
                    .find(|r| r.logical_id == *logical_id)
                    .ok_or_else(|| Error::Resolution {
                        field: field.to_string(),
                        reference: logical_id.clone(),
                        stack_name: self.stack_name.to_string(),
                    })?;

                debug!(
                    field,
                    logical_id = logical_id.as_str(),
                    physical_id = resource.physical_id.as_str(),
                    "Resolved stack reference"
                );
                Ok(resource.physical_id)
            }
            ConfigValue::Unsupported(raw) => Err(Error::UnsupportedReference {
                field: field.to_string(),
                value: serde_yaml::to_string(raw)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|_| format!("{:?}", raw)),
            }),
        }
    }
}
