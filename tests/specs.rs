//! Workspace-level specs
//!
//! End-to-end behavior through the public crate APIs: capability
//! negotiation over fake collaborators, and the metadata endpoint over a
//! real loopback socket.

mod specs {
    mod capabilities;
    mod metadata_endpoint;
}
