use hub::{BroadcastRequest, ConnectionId};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BroadcastParams {
    /// Restrict delivery to one group; every connection when omitted
    pub group: Option<String>,
    /// Connection id to skip
    pub exclude: Option<String>,
    pub payload: String,
}

impl From<BroadcastParams> for BroadcastRequest {
    fn from(params: BroadcastParams) -> Self {
        let exclude = params.exclude.map(ConnectionId::from);
        match params.group {
            Some(group) if !group.is_empty() => {
                BroadcastRequest::group(group, params.payload, exclude)
            }
            _ => BroadcastRequest::all(params.payload, exclude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_group_targets_everyone() {
        let request: BroadcastRequest = BroadcastParams {
            group: None,
            exclude: Some("abc".to_string()),
            payload: "hello".to_string(),
        }
        .into();

        assert!(request.group.is_empty());
        assert_eq!(request.exclude, Some(ConnectionId::from("abc")));
        assert_eq!(&request.payload[..], b"hello");
    }

    #[test]
    fn group_is_carried_through() {
        let request: BroadcastRequest = BroadcastParams {
            group: Some("room1".to_string()),
            exclude: None,
            payload: "hi".to_string(),
        }
        .into();

        assert_eq!(request.group, "room1");
        assert_eq!(request.exclude, None);
    }
}
