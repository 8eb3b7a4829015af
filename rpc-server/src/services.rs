// Service descriptions
//
// One service per compiled command, named "<CommandSet>.<Command>"

use jdwp_rpc::Protocol;
use jdwp_rpc::spec::{Argument, ConstantSet};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub command_set_id: u8,
    pub command_id: u8,
    pub request_format: String,
    pub response_format: String,
    /// False when results arrive as `event` notifications instead.
    pub has_reply: bool,
    pub params: Vec<Argument>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceList<'a> {
    pub services: Vec<Service>,
    pub constant_sets: &'a [ConstantSet],
}

pub fn list_services(protocol: &Protocol) -> ServiceList<'_> {
    let services = protocol
        .command_sets()
        .iter()
        .flat_map(|set| set.commands())
        .map(|cmd| Service {
            name: cmd.qualified_name(),
            command_set_id: cmd.set_id,
            command_id: cmd.id,
            request_format: cmd.format().request.to_string(),
            response_format: cmd.format().response.to_string(),
            has_reply: cmd.has_reply(),
            params: cmd.request_args().to_vec(),
        })
        .collect();

    ServiceList {
        services,
        constant_sets: protocol.constant_sets(),
    }
}
