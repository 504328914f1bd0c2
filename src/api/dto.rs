//! Data Transfer Objects
//!
//! The glob response returned by the find endpoint, in both encodings. The
//! protobuf field numbers are fixed by the external carbonzipper schema;
//! JSON mirrors its field names.

use prost::Message;
use serde::Serialize;

/// One matched metric path.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct GlobMatch {
    #[prost(string, tag = "1")]
    #[serde(rename = "path")]
    pub path: String,

    /// Virtual metrics are always leaves; there is no tree to expand.
    #[prost(bool, tag = "2")]
    #[serde(rename = "isLeaf")]
    pub is_leaf: bool,
}

/// Response to a find query: the query echoed back plus its matches.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct GlobResponse {
    #[prost(string, tag = "1")]
    #[serde(rename = "name")]
    pub name: String,

    #[prost(message, repeated, tag = "2")]
    #[serde(rename = "matches")]
    pub matches: Vec<GlobMatch>,
}
