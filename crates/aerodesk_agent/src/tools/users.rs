use super::args;
use crate::tool_registry::TypedTool;
use aerodesk_core::{ActionResult, AirlineStore, NewUser, ToolInputSchema};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOrCreateUserArgs {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

pub struct FindOrCreateUser {
    store: Arc<dyn AirlineStore>,
}

impl FindOrCreateUser {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for FindOrCreateUser {
    type Args = FindOrCreateUserArgs;
    const NAME: &'static str = "findOrCreateUser";
    const DESCRIPTION: &'static str =
        "Look a customer up by email. If none exists and a name is given, register them.";
    const SIDE_EFFECTING: bool = true;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(
            json!({
                "email": {"type": "string"},
                "name": {"type": "string", "description": "Required only to create a new customer"}
            }),
            &["email"],
        )
    }

    fn validate(args: &FindOrCreateUserArgs) -> Result<(), String> {
        let email = args.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(format!("email '{email}' is not a valid address")),
        }
    }

    async fn call(&self, args: FindOrCreateUserArgs) -> ActionResult {
        let email = args::normalize(&args.email);
        match self.store.find_user_by_email(&email).await {
            Ok(Some(user)) => return ActionResult::success("User found", &user),
            Ok(None) => {}
            Err(e) => return e.into(),
        }

        let name = match args.name.as_deref().map(args::normalize) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return ActionResult::error(format!(
                    "no user with email {email}; provide a name to register one"
                ))
            }
        };
        match self.store.create_user(&NewUser { name, email }).await {
            Ok(user) => ActionResult::success("User created successfully", &user),
            Err(e) => e.into(),
        }
    }
}
