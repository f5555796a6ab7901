//! Request filters.
//!
//! A filter is an opaque `Command -> Command` step applied exactly once,
//! immediately before dispatch. Authentication header injection is the
//! canonical use.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

use crate::command::Command;
use crate::error::ClientError;

/// Transforms a command immediately before it is dispatched.
///
/// Filters must be pure with respect to the command: same command in, same
/// command out. They run in registration order.
pub trait RequestFilter: Send + Sync {
    fn filter(&self, command: Command) -> Result<Command, ClientError>;
}

/// HTTP basic authentication (RFC 7617).
pub struct BasicAuthentication {
    identity: String,
    credential: SecretString,
}

impl BasicAuthentication {
    pub fn new(identity: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            credential: SecretString::from(credential.into()),
        }
    }
}

impl RequestFilter for BasicAuthentication {
    fn filter(&self, command: Command) -> Result<Command, ClientError> {
        let token = STANDARD.encode(format!(
            "{}:{}",
            self.identity,
            self.credential.expose_secret()
        ));
        Ok(command.with_header("Authorization", format!("Basic {token}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OperationDescriptor;
    use crate::command::{Args, CommandBuilder};
    use reqwest::Method;
    use std::collections::BTreeMap;

    #[test]
    fn injects_basic_auth_header() {
        let props = BTreeMap::new();
        let builder = CommandBuilder::new("https://api.example.com", &props);
        let descriptor = OperationDescriptor::new("ListMachines", Method::GET, "/my/machines");
        let command = builder.build(&descriptor, &Args::new()).unwrap();

        let filter = BasicAuthentication::new("user", "pass");
        let filtered = filter.filter(command).unwrap();
        assert_eq!(
            filtered.headers.get("Authorization").map(String::as_str),
            Some("Basic dXNlcjpwYXNz")
        );
    }
}
