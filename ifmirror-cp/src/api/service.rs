//! Protocol dispatcher.
//!
//! Decodes one inbound frame, drives the manager, and returns the full
//! ordered reply sequence for that request: a single reply for most
//! messages, or N detail messages plus one completion for enumeration.
//! Failures never escape as errors; they become reply result codes.

use super::table::MsgTable;
use crate::manager::PairManager;
use ifmirror_api::msg::{
    DefaultNsGetReply, DefaultNsSet, Header, MsgKind, MsgLookup, MsgLookupReply, PairAddDel,
    PairDetails, PairGetReply, RetvalReply,
};
use ifmirror_api::{ApiError, MSG_LOOKUP_ID};
use tracing::{debug, warn};

pub struct ApiService {
    table: MsgTable,
    manager: PairManager,
}

impl ApiService {
    pub fn new(table: MsgTable, manager: PairManager) -> Self {
        ApiService { table, manager }
    }

    pub fn table(&self) -> &MsgTable {
        &self.table
    }

    pub fn manager(&self) -> &PairManager {
        &self.manager
    }

    /// Handle one framed message. Requests with an unknown or non-request
    /// message id are dropped (there is no reply type to correlate); every
    /// other failure is reported through the reply result code.
    pub fn handle(&mut self, frame: &[u8]) -> Vec<Vec<u8>> {
        let (header, body) = match Header::decode(frame) {
            Ok(split) => split,
            Err(_) => {
                warn!(len = frame.len(), "dropping runt frame");
                return Vec::new();
            }
        };

        if header.msg_id == MSG_LOOKUP_ID {
            return self.msg_lookup(header.context, body);
        }

        match self.table.kind_of(header.msg_id) {
            Some(MsgKind::PairAddDel) => self.pair_add_del(header.context, body),
            Some(MsgKind::PairGet) => self.pair_get(header.context),
            Some(MsgKind::DefaultNsSet) => self.default_ns_set(header.context, body),
            Some(MsgKind::DefaultNsGet) => self.default_ns_get(header.context),
            Some(MsgKind::ReplaceBegin) => self.replace_begin(header.context),
            Some(MsgKind::ReplaceEnd) => self.replace_end(header.context),
            Some(kind) => {
                warn!(msg = kind.name(), "message is not a request");
                Vec::new()
            }
            None => {
                warn!(msg_id = header.msg_id, "unknown message id");
                Vec::new()
            }
        }
    }

    fn retval(&self, reply: MsgKind, context: u32, result: Result<(), ApiError>) -> Vec<Vec<u8>> {
        let retval = match result {
            Ok(()) => 0,
            Err(e) => e.code(),
        };
        vec![RetvalReply { retval }.encode(self.table.id(reply), context)]
    }

    fn msg_lookup(&self, context: u32, body: &[u8]) -> Vec<Vec<u8>> {
        let reply = match MsgLookup::decode(body) {
            Ok(req) => match self.table.lookup(&req.name) {
                Some(msg_id) => {
                    debug!(name = %req.name, msg_id, "message id resolved");
                    MsgLookupReply { retval: 0, msg_id }
                }
                None => MsgLookupReply {
                    retval: ApiError::NotFound.code(),
                    msg_id: 0,
                },
            },
            Err(e) => MsgLookupReply {
                retval: e.code(),
                msg_id: 0,
            },
        };
        vec![reply.encode(context)]
    }

    fn pair_add_del(&mut self, context: u32, body: &[u8]) -> Vec<Vec<u8>> {
        let result = PairAddDel::decode(body).and_then(|req| {
            if req.is_add {
                self.manager
                    .create_pair(req.phy_id, req.host_type, &req.host_name, &req.netns)
            } else {
                self.manager.delete_pair(req.phy_id)
            }
        });
        self.retval(MsgKind::PairAddDelReply, context, result)
    }

    fn pair_get(&mut self, context: u32) -> Vec<Vec<u8>> {
        let details_id = self.table.id(MsgKind::PairDetails);
        let mut out = Vec::with_capacity(self.manager.len() + 1);

        for pair in self.manager.iter() {
            let details = PairDetails {
                phy_id: pair.phy_id,
                host_id: pair.host_id,
                vif_id: pair.vif_id,
                host_type: pair.host_type,
                host_name: pair.host_name.clone(),
                netns: pair.netns.clone(),
            };
            out.push(details.encode(details_id, context));
        }

        let count = out.len() as u32;
        out.push(
            PairGetReply { retval: 0, count }.encode(self.table.id(MsgKind::PairGetReply), context),
        );
        debug!(count, "pair enumeration served");
        out
    }

    fn default_ns_set(&mut self, context: u32, body: &[u8]) -> Vec<Vec<u8>> {
        let result = DefaultNsSet::decode(body).map(|req| self.manager.set_default_ns(&req.netns));
        self.retval(MsgKind::DefaultNsSetReply, context, result)
    }

    fn default_ns_get(&self, context: u32) -> Vec<Vec<u8>> {
        let reply = DefaultNsGetReply {
            netns: self.manager.default_ns().to_string(),
        };
        vec![reply.encode(self.table.id(MsgKind::DefaultNsGetReply), context)]
    }

    fn replace_begin(&mut self, context: u32) -> Vec<Vec<u8>> {
        let result = self.manager.replace_begin();
        self.retval(MsgKind::ReplaceBeginReply, context, result)
    }

    fn replace_end(&mut self, context: u32) -> Vec<Vec<u8>> {
        let result = self.manager.replace_end();
        self.retval(MsgKind::ReplaceEndReply, context, result)
    }
}
