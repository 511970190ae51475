use jobs::Signature;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitParams {
    /// Registered task name, e.g. "add"
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub args: Vec<Value>,
}

impl From<SubmitParams> for Signature {
    fn from(params: SubmitParams) -> Self {
        Signature::new(params.name, params.args)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobAccepted {
    pub id: String,
    pub name: String,
}
