use serde::Deserialize;
use std::{fs, path::Path};
use tracing::{debug, info};

use crate::{Error, GRAPHQL_API_URL, Result, stack_inventory::StackInventory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(OutputFormat::Json),
            "yml" | "yaml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }
}

/// Stack outputs as written by the deployment's output plugin.
#[derive(Debug, Deserialize)]
struct OutputFile {
    #[serde(rename = "GraphQlApiUrl")]
    graphql_api_url: Option<String>,
}

/// Finds the GraphQL endpoint the console should talk to.
pub struct EndpointResolver;

impl EndpointResolver {
    /// Read `GraphQlApiUrl` from a JSON or YAML deployment-output file.
    pub fn from_output_file(path: &Path) -> Result<String> {
        let format = OutputFormat::from_path(path).ok_or_else(|| Error::UnsupportedOutputFormat {
            path: path.to_path_buf(),
        })?;

        debug!(path = %path.display(), ?format, "Reading deployment output file");
        let contents = fs::read_to_string(path).map_err(|source| Error::OutputRead {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed: OutputFile = match format {
            OutputFormat::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            OutputFormat::Yaml => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
        }
        .map_err(|message| Error::OutputParse {
            path: path.to_path_buf(),
            message,
        })?;

        let endpoint = parsed
            .graphql_api_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::MissingField {
                path: path.to_path_buf(),
                field: GRAPHQL_API_URL,
            })?;

        info!(endpoint = endpoint.as_str(), "Resolved endpoint from output file");
        Ok(endpoint)
    }

    /// Look up a stack output on the live deployment. Exactly one stack named
    /// `stack_name` must exist.
    pub async fn from_stack_output(
        inventory: &dyn StackInventory,
        stack_name: &str,
        output_name: &str,
    ) -> Result<String> {
        let mut stacks: Vec<_> = inventory
            .describe_stacks(stack_name)
            .await?
            .into_iter()
            .filter(|stack| stack.name == stack_name)
            .collect();

        let stack = match stacks.len() {
            0 => {
                return Err(Error::StackNotFound {
                    stack_name: stack_name.to_string(),
                });
            }
            1 => stacks.remove(0),
            count => {
                return Err(Error::AmbiguousStack {
                    stack_name: stack_name.to_string(),
                    count,
                });
            }
        };

        let output = stack
            .outputs
            .into_iter()
            .find(|o| o.key == output_name)
            .ok_or_else(|| Error::OutputNotFound {
                name: output_name.to_string(),
                stack_name: stack_name.to_string(),
            })?;

        info!(stack_name, endpoint = output.value.as_str(), "Resolved endpoint from stack output");
        Ok(output.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        stack_inventory::{StackDescription, StackOutput},
        value_resolver::tests::FakeInventory,
    };
    use pretty_assertions::assert_eq;
    use std::{io::Write, sync::atomic::Ordering};
    use tempfile::Builder;

    fn output_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn stack(name: &str, outputs: &[(&str, &str)]) -> StackDescription {
        StackDescription {
            name: name.to_string(),
            outputs: outputs
                .iter()
                .map(|(key, value)| StackOutput {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn reads_json_output_file() {
        let file = output_file(".json", r#"{"GraphQlApiUrl":"https://x"}"#);
        assert_eq!(EndpointResolver::from_output_file(file.path()).unwrap(), "https://x");
    }

    #[test]
    fn reads_yml_and_yaml_output_files() {
        let file = output_file(".yml", "GraphQlApiUrl: https://y\nGraphQlApiId: abc\n");
        assert_eq!(EndpointResolver::from_output_file(file.path()).unwrap(), "https://y");

        let file = output_file(".yaml", "GraphQlApiUrl: https://z\n");
        assert_eq!(EndpointResolver::from_output_file(file.path()).unwrap(), "https://z");
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = output_file(".txt", "GraphQlApiUrl: https://y\n");
        assert!(matches!(
            EndpointResolver::from_output_file(file.path()),
            Err(Error::UnsupportedOutputFormat { .. })
        ));
    }

    #[test]
    fn missing_or_empty_url_is_missing_field() {
        let file = output_file(".json", r#"{"ServiceEndpoint":"https://x"}"#);
        assert!(matches!(
            EndpointResolver::from_output_file(file.path()),
            Err(Error::MissingField { field: "GraphQlApiUrl", .. })
        ));

        let file = output_file(".json", r#"{"GraphQlApiUrl":""}"#);
        assert!(matches!(
            EndpointResolver::from_output_file(file.path()),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn unreadable_and_malformed_files() {
        assert!(matches!(
            EndpointResolver::from_output_file(Path::new("/nonexistent/stack.json")),
            Err(Error::OutputRead { .. })
        ));

        let file = output_file(".json", "{not json");
        assert!(matches!(
            EndpointResolver::from_output_file(file.path()),
            Err(Error::OutputParse { .. })
        ));
    }

    #[tokio::test]
    async fn finds_stack_output() {
        let inventory = FakeInventory::with_stacks(vec![stack(
            "notes-api-dev",
            &[("ServiceEndpoint", "https://other"), (GRAPHQL_API_URL, "https://v")],
        )]);

        let endpoint =
            EndpointResolver::from_stack_output(&inventory, "notes-api-dev", GRAPHQL_API_URL)
                .await
                .unwrap();

        assert_eq!(endpoint, "https://v");
        assert_eq!(inventory.describe_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_output_is_output_not_found() {
        let inventory =
            FakeInventory::with_stacks(vec![stack("notes-api-dev", &[("Other", "x")])]);

        match EndpointResolver::from_stack_output(&inventory, "notes-api-dev", GRAPHQL_API_URL)
            .await
        {
            Err(Error::OutputNotFound { name, stack_name }) => {
                assert_eq!(name, GRAPHQL_API_URL);
                assert_eq!(stack_name, "notes-api-dev");
            }
            other => panic!("expected OutputNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn stack_selection_requires_exactly_one_match() {
        let none = FakeInventory::default();
        assert!(matches!(
            EndpointResolver::from_stack_output(&none, "notes-api-dev", GRAPHQL_API_URL).await,
            Err(Error::StackNotFound { .. })
        ));

        let wrong = FakeInventory::with_stacks(vec![stack("notes-api-prod", &[])]);
        assert!(matches!(
            EndpointResolver::from_stack_output(&wrong, "notes-api-dev", GRAPHQL_API_URL).await,
            Err(Error::StackNotFound { .. })
        ));

        let twice = FakeInventory::with_stacks(vec![
            stack("notes-api-dev", &[(GRAPHQL_API_URL, "https://a")]),
            stack("notes-api-dev", &[(GRAPHQL_API_URL, "https://b")]),
        ]);
        assert!(matches!(
            EndpointResolver::from_stack_output(&twice, "notes-api-dev", GRAPHQL_API_URL).await,
            Err(Error::AmbiguousStack { count: 2, .. })
        ));
    }
}
