//! Wire types shared between client components: login payloads, discovery
//! documents and the server error vocabulary.

pub mod domain;
pub mod error;
pub mod protocol;
