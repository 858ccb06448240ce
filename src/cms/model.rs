use serde::Deserialize;

use crate::model::SubscriberEdge;

#[derive(Deserialize, Debug)]
pub struct SubscribersEnvelope {
    pub subscribers: Vec<SubscriberWire>,
}

#[derive(Deserialize, Debug)]
pub struct SubscriberWire {
    pub path: PathWire,
    #[serde(rename = "type")]
    pub typ: String,
}

#[derive(Deserialize, Debug)]
pub struct PathWire {
    pub path: String,
}

impl From<SubscriberWire> for SubscriberEdge {
    fn from(wire: SubscriberWire) -> Self {
        SubscriberEdge {
            path: wire.path.path,
            asset_type: wire.typ,
        }
    }
}
