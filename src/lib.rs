// Crate entry point. Re-export modules so tests and binaries can import them easily.
//
// Responsibilities
// - Only declare and expose modules. No business logic here.
//
// Layout
// - core: tally data model, wire format, summary arithmetic and the ports to the outside world.
// - application: the sync cache and the dispatch surface that mutates it.
// - adapters: remote file services, authenticator, alert sink and the inbound http/graphql surface.
// - shell: configuration and composition root.

pub mod core {
    pub mod ports;
    pub mod tally;
}

pub mod application {
    pub mod dispatch;
    pub mod errors;
    pub mod sync_cache;
}

pub mod adapters {
    pub mod detached_remote_files;
    pub mod permission_guard;
    pub mod auth {
        pub mod static_token_authenticator;
    }
    pub mod directory {
        pub mod directory_remote_files;
    }
    pub mod in_memory {
        pub mod in_memory_remote_files;
        pub mod recorded_alerts;
    }
    pub mod inbound {
        pub mod action_dto;
        pub mod graphql;
        pub mod http;
    }
}

pub mod shell;
